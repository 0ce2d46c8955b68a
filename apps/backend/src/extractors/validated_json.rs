use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::logging::pii::Redacted;
use crate::trace_ctx;
use crate::validation::Validate;

/// Request bodies above this size are rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// JSON body that has been parsed (400 on failure) and then passed its own
/// `Validate` rules (422 with field errors on failure).
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(_req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();

        Box::pin(async move {
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(trace_id = %trace_ctx::trace_id(), error = %e, "Failed to read request body");
                    AppError::bad_request(ErrorCode::BadRequest, "Failed to read request body")
                })?;
                if body.len() + chunk.len() > MAX_BODY_BYTES {
                    return Err(AppError::bad_request(
                        ErrorCode::BadRequest,
                        "Request body too large",
                    ));
                }
                body.extend_from_slice(&chunk);
            }

            let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
                debug!(
                    trace_id = %trace_ctx::trace_id(),
                    error = %Redacted(&e.to_string()),
                    body_size = body.len(),
                    "JSON body rejected"
                );
                AppError::bad_request(ErrorCode::BadRequest, describe_json_error(&e))
            })?;

            let errors = parsed.validate();
            if !errors.is_empty() {
                return Err(AppError::validation(errors));
            }
            Ok(ValidatedJson(parsed))
        })
    }
}

fn describe_json_error(error: &serde_json::Error) -> String {
    match error.classify() {
        Category::Syntax => format!("Invalid JSON at line {}", error.line()),
        Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        Category::Data => "Invalid JSON: wrong types for one or more fields".to_string(),
        Category::Io => "Invalid JSON: could not read body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use serde::Deserialize;

    use super::*;
    use crate::validation::FieldErrors;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: Option<String>,
    }

    impl Validate for Probe {
        fn validate(&self) -> FieldErrors {
            let mut errors = FieldErrors::default();
            if self.name.as_deref().unwrap_or("").is_empty() {
                errors.add("name", "The name field is required.");
            }
            errors
        }
    }

    async fn extract(body: &'static str) -> Result<ValidatedJson<Probe>, AppError> {
        let (req, mut payload) = TestRequest::post()
            .insert_header(("content-type", "application/json"))
            .set_payload(body)
            .to_http_parts();
        ValidatedJson::<Probe>::from_request(&req, &mut payload).await
    }

    #[actix_web::test]
    async fn valid_body_passes() {
        let probe = extract(r#"{"name":"acme"}"#).await.unwrap();
        assert_eq!(probe.name.as_deref(), Some("acme"));
    }

    #[actix_web::test]
    async fn syntax_error_is_bad_request() {
        let err = extract(r#"{"name": }"#).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert!(err.message().contains("line 1"));
    }

    #[actix_web::test]
    async fn failed_rules_are_unprocessable() {
        let err = extract(r#"{}"#).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 422);
        match err {
            AppError::Validation { errors } => {
                assert_eq!(errors.get("name").map(<[String]>::len), Some(1))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
