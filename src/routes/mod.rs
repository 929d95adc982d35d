//! HTTP routes for sessiongate

pub mod auth_routes;
pub mod protected;

pub use auth_routes::{handle_logout, handle_sign_in, handle_sign_up};
pub use protected::{handle_auth_route, handle_health_check};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::types::AuthError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Render an error as `{"status": "error", "error": ..}`.
///
/// Server-side failures are logged here with their full detail; the body
/// only carries the category.
pub(crate) fn error_response(err: AuthError) -> Response<BoxBody> {
    if err.is_server_error() {
        error!(error = %err, "Request failed");
    }
    let (status, body) = err.into_status_code_and_body();
    json_response(status, &body)
}
