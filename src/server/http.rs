//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection.

use hyper::body::{Body, Incoming};
use hyper::header::{HeaderValue, ALLOW};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::gate::RequestContext;
use crate::routes::{self, error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::types::Result;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Known paths and the single method each accepts
const ROUTES: &[(&str, &str)] = &[
    ("/sign-up", "POST"),
    ("/sign-in", "POST"),
    ("/logout", "POST"),
    ("/health-check", "GET"),
    ("/auth-route", "GET"),
];

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("sessiongate listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> std::result::Result<Response<BoxBody>, hyper::Error>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/sign-up") => routes::handle_sign_up(req, Arc::clone(&state)).await,
        (&Method::POST, "/sign-in") => routes::handle_sign_in(req, Arc::clone(&state)).await,
        (&Method::POST, "/logout") => routes::handle_logout(req, Arc::clone(&state)).await,
        (&Method::GET, "/health-check") | (&Method::GET, "/auth-route") => {
            handle_protected(&state, req).await
        }
        (_, p) => match ROUTES.iter().find(|(known, _)| *known == p) {
            Some((_, allowed)) => method_not_allowed_response(*allowed),
            None => not_found_response(p),
        },
    };

    info!("{} {} -> {}", method, path, response.status().as_u16());
    Ok(response)
}

/// Run the guard pipeline, then the protected handler
async fn handle_protected<B>(state: &AppState, req: Request<B>) -> Response<BoxBody> {
    let ctx = RequestContext::new(req.uri().path(), req.headers().clone());

    let ctx = match state.guards.run(ctx).await {
        Ok(ctx) => ctx,
        Err(e) => return error_response(e),
    };

    if let Some(user) = &ctx.user {
        debug!(user_id = %user.user_id, path = %ctx.path, "Gate passed");
    }

    match ctx.path.as_str() {
        "/health-check" => routes::handle_health_check(&ctx),
        _ => routes::handle_auth_route(&ctx),
    }
}

/// Not found response
fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({
            "status": "error",
            "error": "Not Found",
            "path": path,
        }),
    )
}

/// Method not allowed response
fn method_not_allowed_response(allowed: &'static str) -> Response<BoxBody> {
    let mut response = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &json!({
            "status": "error",
            "error": "Method Not Allowed",
        }),
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allowed));
    response
}
