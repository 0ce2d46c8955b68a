//! Assertions for the backend's JSON error envelope.
//!
//! Deliberately independent of backend types so the wire shape itself is
//! what gets checked.

use actix_web::body::MessageBody;
use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelopeLike {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub status_code: u16,
    pub timestamp: String,
    #[serde(default)]
    pub details: Option<Value>,
    pub request_id: String,
}

/// Assert that response parts carry the error envelope with the expected
/// status and code, and that `request_id` matches the `x-request-id` header.
///
/// Returns the parsed envelope for further checks.
pub fn assert_error_envelope(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    expected_code: &str,
    expected_status: StatusCode,
) -> ErrorEnvelopeLike {
    assert_eq!(status, expected_status, "unexpected HTTP status");

    let envelope: ErrorEnvelopeLike = serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "body is not an error envelope ({e}): {}",
            String::from_utf8_lossy(body)
        )
    });

    let header = headers
        .get("x-request-id")
        .expect("x-request-id header should be present")
        .to_str()
        .expect("x-request-id header should be valid UTF-8");
    assert_eq!(
        envelope.request_id, header,
        "request_id in body should match x-request-id header"
    );

    assert!(!envelope.success);
    assert_eq!(envelope.error, expected_code);
    assert_eq!(envelope.status_code, expected_status.as_u16());
    assert!(!envelope.message.is_empty());
    assert!(!envelope.timestamp.is_empty());
    envelope
}

/// `ServiceResponse` flavour of [`assert_error_envelope`].
pub async fn assert_error_response<B: MessageBody>(
    resp: actix_web::dev::ServiceResponse<B>,
    expected_code: &str,
    expected_status: StatusCode,
) -> ErrorEnvelopeLike {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = actix_web::test::read_body(resp).await;
    assert_error_envelope(status, &headers, &body, expected_code, expected_status)
}
