//! Routes behind the auth gate
//!
//! Both handlers run only after the guard pipeline has forwarded the request,
//! so the context normally carries the authenticated user.

use hyper::{Response, StatusCode};
use serde_json::json;

use super::{error_response, json_response, BoxBody};
use crate::auth::gate::RequestContext;
use crate::types::AuthError;

/// GET /health-check
pub fn handle_health_check(_ctx: &RequestContext) -> Response<BoxBody> {
    json_response(StatusCode::OK, &json!({ "status": "ok" }))
}

/// GET /auth-route
pub fn handle_auth_route(ctx: &RequestContext) -> Response<BoxBody> {
    let user = match &ctx.user {
        Some(u) => u,
        None => return error_response(AuthError::Unauthorized("unauthorized".into())),
    };

    json_response(
        StatusCode::OK,
        &json!({
            "status": "success",
            "message": "Authenticated Route working well",
            "userId": user.user_id,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gate::AuthenticatedUser;
    use chrono::Utc;
    use hyper::HeaderMap;
    use uuid::Uuid;

    #[test]
    fn test_auth_route_requires_user() {
        let ctx = RequestContext::new("/auth-route", HeaderMap::new());
        assert_eq!(handle_auth_route(&ctx).status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_route_with_user() {
        let mut ctx = RequestContext::new("/auth-route", HeaderMap::new());
        ctx.user = Some(AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "a@b.com".into(),
            session_expires_at: Utc::now(),
        });
        assert_eq!(handle_auth_route(&ctx).status(), StatusCode::OK);
        assert_eq!(handle_health_check(&ctx).status(), StatusCode::OK);
    }
}
