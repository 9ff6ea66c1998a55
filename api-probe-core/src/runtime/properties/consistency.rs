// api-probe-core/src/runtime/properties/consistency.rs
// ============================================================================
// Module: Response Consistency Properties
// Description: HEAD/GET parity and Allow-header accuracy checks.
// Purpose: Verify metadata responses agree with the catalog and with GET.
// Dependencies: crate::{core, runtime::properties}
// ============================================================================

//! ## Overview
//! Three consistency checks: HEAD responses must carry no body and must
//! mirror the GET response for the same URI; OPTIONS responses must
//! enumerate exactly the declared methods in `Allow`; 405 responses must
//! carry an `Allow` header at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::message::Request;
use crate::core::method::Method;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyCategory;
use crate::runtime::properties::PropertyContext;
use crate::runtime::properties::PropertyError;
use crate::runtime::properties::PropertyOutcome;

// ============================================================================
// SECTION: Allow Header Parsing
// ============================================================================

/// Parses an `Allow` header value into upper-cased method tokens.
///
/// The list is comma-separated, whitespace-tolerant, and case-insensitive;
/// empty tokens are dropped.
#[must_use]
pub fn parse_allow_header(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

// ============================================================================
// SECTION: HEAD-GET Consistency
// ============================================================================

/// HEAD must return no body and mirror GET's status and headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadGetConsistencyProperty;

impl Property for HeadGetConsistencyProperty {
    fn name(&self) -> &str {
        "HEAD-GET Response Consistency"
    }

    fn description(&self) -> &str {
        "HEAD responses must carry no body and agree with GET on status and headers"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.3.2"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::ResponseConsistency
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if ctx.request.method != Method::Head {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }

        // A HEAD response body is wrong no matter what GET returns.
        if !ctx.response.body.is_empty() {
            return Ok(PropertyOutcome::fail(format!(
                "HEAD response carried {} body bytes",
                ctx.response.body.len()
            )));
        }
        if ctx.response.content_length().is_some_and(|length| length > 0) {
            return Ok(PropertyOutcome::fail(format!(
                "HEAD response declared Content-Length {}",
                ctx.response.content_length().unwrap_or(0)
            )));
        }

        let get_request = Request {
            method: Method::Get,
            path: ctx.request.path.clone(),
            query: ctx.request.query.clone(),
            headers: ctx.request.headers.clone(),
            body: None,
        };
        let get_response = ctx.client.send(&get_request, ctx.cancel)?;

        if get_response.status != ctx.response.status {
            return Ok(PropertyOutcome::fail(format!(
                "status mismatch: HEAD {} vs GET {}",
                ctx.response.status, get_response.status
            )));
        }

        let mut names: BTreeSet<String> = ctx.response.header_names().into_iter().collect();
        names.extend(get_response.header_names());
        let mismatched: Vec<String> = names
            .into_iter()
            .filter(|name| {
                // Content-Length legitimately differs (HEAD has no payload)
                // and Date is stamped per response.
                if name == "content-length" || name == "date" {
                    return false;
                }
                ctx.response.header_joined(name) != get_response.header_joined(name)
            })
            .collect();
        if !mismatched.is_empty() {
            return Ok(PropertyOutcome::fail_with_details(
                "HEAD and GET response headers differ",
                format!("mismatched headers: {}", mismatched.join(", ")),
            ));
        }
        Ok(PropertyOutcome::pass())
    }
}

// ============================================================================
// SECTION: OPTIONS Allow Accuracy
// ============================================================================

/// OPTIONS responses must enumerate exactly the declared methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionsAllowProperty;

impl Property for OptionsAllowProperty {
    fn name(&self) -> &str {
        "OPTIONS Allow Header"
    }

    fn description(&self) -> &str {
        "OPTIONS responses must list exactly the methods declared for the resource"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.3.7"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::ResponseConsistency
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if ctx.request.method != Method::Options {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }

        let mut required: BTreeSet<String> = ctx
            .catalog
            .methods_for(&ctx.request.path)
            .into_iter()
            .map(|method| method.as_str().to_string())
            .collect();
        required.insert(Method::Options.as_str().to_string());

        let Some(allow) = ctx.response.header_joined("allow") else {
            return Ok(PropertyOutcome::fail("missing Allow header"));
        };
        let advertised = parse_allow_header(&allow);

        let missing: Vec<&String> = required.difference(&advertised).collect();
        let undeclared: Vec<&String> = advertised.difference(&required).collect();
        if missing.is_empty() && undeclared.is_empty() {
            return Ok(PropertyOutcome::pass());
        }
        let mut details = Vec::new();
        if !missing.is_empty() {
            details.push(format!(
                "missing: {}",
                missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            ));
        }
        if !undeclared.is_empty() {
            details.push(format!(
                "undeclared: {}",
                undeclared.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            ));
        }
        Ok(PropertyOutcome::fail_with_details(
            "Allow header does not match declared methods",
            details.join("; "),
        ))
    }
}

// ============================================================================
// SECTION: 405 Allow Presence
// ============================================================================

/// 405 responses must carry an `Allow` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowedAllowProperty;

impl Property for MethodNotAllowedAllowProperty {
    fn name(&self) -> &str {
        "405 Method Not Allowed Allow Header"
    }

    fn description(&self) -> &str {
        "405 responses must carry an Allow header naming the permitted methods"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §6.5.5"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::ResponseConsistency
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if ctx.response.status != 405 {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }
        // Only presence is checked; content accuracy is the OPTIONS check.
        match ctx.response.header_joined("allow") {
            Some(value) if !value.trim().is_empty() => Ok(PropertyOutcome::pass()),
            _ => Ok(PropertyOutcome::fail("missing Allow header")),
        }
    }
}
