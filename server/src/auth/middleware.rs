use crate::api::ErrorResponse;
use crate::db::DbPool;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::authenticate;
use super::extractor::AuthUser;

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// The token of an `Authorization: Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that requires a valid auth token for all requests.
/// Apply this to routes that should be protected by default. The resolved
/// user is stored in the request extensions for the [`AuthUser`] extractor.
pub async fn require_auth(
    State(pool): State<Arc<DbPool>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        return unauthorized("Missing Authorization header");
    };

    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("Invalid Authorization header");
    };

    let Some(token) = bearer_token(auth_str) else {
        return unauthorized("Invalid Authorization header format");
    };

    let caller = match authenticate(&pool, token) {
        Ok(caller) => caller,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to verify session".to_string(),
                }),
            )
                .into_response();
        }
    };

    let Some(id) = caller.user() else {
        return unauthorized("Invalid or expired token");
    };

    request.extensions_mut().insert(AuthUser { id });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }
}
