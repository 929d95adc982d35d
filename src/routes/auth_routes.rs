//! HTTP routes for the session lifecycle
//!
//! - POST /sign-up - Create a user (Argon2-hashed password)
//! - POST /sign-in - Verify credentials, open a session, set the cookie
//! - POST /logout  - Drop the session and clear the cookie
//!
//! Handlers are generic over the request body so the router can be driven
//! with in-memory bodies as well as `hyper::body::Incoming`.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::SET_COOKIE;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{error_response, json_response, BoxBody};
use crate::auth::cookie::extract_session_id;
use crate::server::AppState;
use crate::session::{SignInRequest, SignUpRequest};
use crate::types::{AuthError, Result};

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 10 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn parse_json_body<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                AuthError::BadRequest("request body too large".into())
            } else {
                AuthError::BadRequest(format!("failed to read body: {}", e))
            }
        })?
        .to_bytes();

    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(error = %e, "Rejected request body");
        AuthError::BadRequest("Bad Request".into())
    })
}

/// POST /sign-up
pub async fn handle_sign_up<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: SignUpRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.lifecycle.sign_up(body).await {
        Ok(user) => json_response(
            StatusCode::OK,
            &json!({
                "status": "success",
                "message": "Created A User successfully",
                "data": user.view(),
            }),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /sign-in
///
/// The cookie is only set once the session record is stored.
pub async fn handle_sign_in<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: SignInRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    let signed_in = match state.lifecycle.sign_in(&body).await {
        Ok(s) => s,
        Err(e) => return error_response(e),
    };

    let cookie = match state
        .cookies
        .session(&signed_in.session_id, signed_in.max_age_secs)
    {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let mut response = json_response(
        StatusCode::OK,
        &json!({
            "status": "success",
            "message": "Found User By Email",
            "expiresAt": signed_in.expires_at,
        }),
    );
    response.headers_mut().insert(SET_COOKIE, cookie);
    response
}

/// POST /logout
///
/// The clearing cookie goes out on every response, including the 401 for a
/// request that carried no session.
pub async fn handle_logout<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody> {
    let session_id = extract_session_id(req.headers());

    let mut response = match state.lifecycle.logout(session_id.as_deref()).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({
                "status": "ok",
                "message": "Log Out Successful",
            }),
        ),
        Err(e) => error_response(e),
    };

    match state.cookies.clear() {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(e) => return error_response(e),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    fn request(body: impl Into<Bytes>) -> Request<Full<Bytes>> {
        Request::post("/sign-in").body(Full::new(body.into())).unwrap()
    }

    #[tokio::test]
    async fn test_parse_json_body() {
        let parsed: SignInRequest =
            parse_json_body(request(r#"{"email":"a@b.com","password":"secret1"}"#))
                .await
                .unwrap();
        assert_eq!(parsed.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let result: Result<SignInRequest> = parse_json_body(request("{not json")).await;
        assert!(matches!(result, Err(AuthError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let big = format!(
            r#"{{"email":"a@b.com","password":"{}"}}"#,
            "x".repeat(MAX_BODY_BYTES)
        );
        match parse_json_body::<SignInRequest, _>(request(big)).await {
            Err(AuthError::BadRequest(msg)) => assert_eq!(msg, "request body too large"),
            other => panic!("unexpected {:?}", other.map(|r| r.email)),
        }
    }
}
