// system-tests/tests/helpers/docs.rs
// ============================================================================
// Module: Scenario OpenAPI Documents
// Description: Minimal OpenAPI documents for the end-to-end scenarios.
// Purpose: Declare exactly the endpoints each scenario exercises.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

/// Document declaring `GET /api/users` only.
pub fn users_get_only() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S1", "version": "1.0" },
        "paths": {
            "/api/users": {
                "get": { "responses": { "200": {} } }
            }
        }
    })
}

/// Document declaring `PUT /api/posts/{postId}`.
pub fn posts_put() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S2", "version": "1.0" },
        "paths": {
            "/api/posts/{postId}": {
                "put": {
                    "parameters": [
                        {
                            "name": "postId",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "required": ["title"],
                                    "properties": { "title": { "type": "string" } }
                                }
                            }
                        }
                    },
                    "responses": { "200": {} }
                }
            }
        }
    })
}

/// Document declaring `DELETE /api/posts/{postId}`.
pub fn posts_delete() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S3", "version": "1.0" },
        "paths": {
            "/api/posts/{postId}": {
                "delete": {
                    "parameters": [
                        {
                            "name": "postId",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": { "200": {} }
                }
            }
        }
    })
}

/// Document declaring `GET/POST/HEAD/OPTIONS /api/users`.
pub fn users_with_options() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S4", "version": "1.0" },
        "paths": {
            "/api/users": {
                "get": { "responses": { "200": {} } },
                "post": { "responses": { "201": {} } },
                "head": { "responses": { "200": {} } },
                "options": { "responses": { "200": {} } }
            }
        }
    })
}

/// Document declaring `HEAD/GET /api/posts`.
pub fn posts_head() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S5", "version": "1.0" },
        "paths": {
            "/api/posts": {
                "head": { "responses": { "200": {} } },
                "get": { "responses": { "200": {} } }
            }
        }
    })
}

/// Document declaring `PATCH /api/users` (for the 405 scenario).
pub fn users_patch() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "S6", "version": "1.0" },
        "paths": {
            "/api/users": {
                "patch": { "responses": { "405": {} } }
            }
        }
    })
}
