// system-tests/tests/helpers/fixture.rs
// ============================================================================
// Module: Fixture Service
// Description: Local HTTP service with scriptable per-request behavior.
// Purpose: Emulate services under test, including state side effects.
// Dependencies: tiny_http, url
// ============================================================================

//! ## Overview
//! A fixture service is a `tiny_http` server on an ephemeral port whose
//! behavior is one closure over (method, path, body). Handlers typically
//! capture a shared [`api_probe_core::InMemoryStateSource`] clone to emulate
//! persistent side effects such as audit logging. The server drains requests
//! until the fixture is dropped.

use std::sync::Arc;
use std::thread;

use tiny_http::Header;
use tiny_http::Response as ServerResponse;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Scripted Messages
// ============================================================================

/// Request view handed to fixture handlers.
pub struct FixtureRequest {
    /// Upper-case method token.
    pub method: String,
    /// Request path and query as received.
    pub url: String,
    /// Request body bytes.
    pub body: Vec<u8>,
}

/// Response description returned by fixture handlers.
pub struct FixtureResponse {
    /// Status code.
    pub status: u16,
    /// Header pairs.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl FixtureResponse {
    /// A bare status-only response.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A response with a body.
    pub fn with_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

// ============================================================================
// SECTION: Fixture Service
// ============================================================================

/// Local fixture service driven by one handler closure.
pub struct FixtureService {
    /// Base URL of the running server.
    pub base_url: Url,
    /// Server handle used to unblock the worker on drop.
    server: Arc<Server>,
    /// Worker thread draining requests.
    worker: Option<thread::JoinHandle<()>>,
}

impl FixtureService {
    /// Starts a fixture answering every request through `handler`.
    pub fn start(
        handler: impl Fn(&FixtureRequest) -> FixtureResponse + Send + Sync + 'static,
    ) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind fixture server"));
        let addr = server.server_addr().to_ip().expect("fixture server address");
        let base_url = Url::parse(&format!("http://{addr}")).expect("fixture base url");

        let worker_server = Arc::clone(&server);
        let worker = thread::spawn(move || {
            while let Ok(mut request) = worker_server.recv() {
                let mut body = Vec::new();
                let _ = std::io::Read::read_to_end(request.as_reader(), &mut body);
                let view = FixtureRequest {
                    method: request.method().to_string().to_ascii_uppercase(),
                    url: request.url().to_string(),
                    body,
                };
                let scripted = handler(&view);
                let mut response = ServerResponse::from_data(scripted.body)
                    .with_status_code(scripted.status);
                for (name, value) in &scripted.headers {
                    if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                        response = response.with_header(header);
                    }
                }
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            server,
            worker: Some(worker),
        }
    }
}

impl Drop for FixtureService {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
