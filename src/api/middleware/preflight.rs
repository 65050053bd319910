//! CORS preflight status.
//!
//! `CorsLayer` answers preflight requests itself with `200 OK` and an
//! empty body. Clients of this service expect `204 No Content`.

use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

pub async fn no_content(req: Request<axum::body::Body>, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;

    let mut response = next.run(req).await;

    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
