use actix_cors::Cors;
use actix_web::http::header;

use super::request_trace::REQUEST_ID_HEADER;

/// CORS for the JSON API. Origins come from `CORS_ALLOWED_ORIGINS`; entries
/// that are not http(s) URLs are ignored, and an empty list falls back to
/// localhost.
pub fn cors_middleware(origins: &[String]) -> Cors {
    let mut allowed: Vec<&str> = origins
        .iter()
        .map(|s| s.trim())
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();
    if allowed.is_empty() {
        allowed = vec!["http://localhost:3000", "http://127.0.0.1:3000"];
    }

    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(3600);

    allowed
        .into_iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
