//! Authentication middleware for Axum

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::jwt::TokenService;

/// State for the authentication middleware
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
}

/// The verified session claims of the caller, inserted into request
/// extensions by [`auth_middleware`].
///
/// Carries the raw token too, so handlers can hand it to the gateway
/// for live-role lookups and stale-claim detection.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    /// Admin claim as issued — check the gateway for the current role
    pub admin_claim: bool,
    pub token: String,
}

/// Extract token from Authorization header
fn extract_token(auth_header: &str) -> &str {
    auth_header.strip_prefix("Bearer ").unwrap_or(auth_header)
}

/// Session authentication middleware - requires a valid session token
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return auth_error_response("Missing authentication token");
    };

    let token = extract_token(&auth_header);
    match auth_state.tokens.decode_session(token) {
        Some(claims) => {
            let user = AuthenticatedUser {
                user_id: claims.sub,
                admin_claim: claims.admin,
                token: token.to_string(),
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => auth_error_response("Invalid authentication token"),
    }
}

/// Create an authentication error response
fn auth_error_response(message: &str) -> Response {
    let body = Json(json!({
        "success": false,
        "error": message
    }));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

/// Resolve the client IP for rate limiting: first entry of the
/// `X-Forwarded-For` list when present, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.1:443".parse().unwrap()
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 5.6.7.8".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "1.2.3.4");
    }

    #[test]
    fn client_ip_falls_back_to_peer() {
        assert_eq!(client_ip(&HeaderMap::new(), peer()), "10.0.0.1");
    }

    #[test]
    fn bearer_prefix_stripped() {
        assert_eq!(extract_token("Bearer abc"), "abc");
        assert_eq!(extract_token("abc"), "abc");
    }
}
