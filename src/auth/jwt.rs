//! Session and confirmation token handling
//!
//! Two structurally distinct JWT kinds are issued:
//!
//! - **Session tokens** assert `{sub, admin, iat, exp}` and prove identity
//!   on authenticated requests.
//! - **Confirmation tokens** assert `{email, purpose, iat, exp}` and are
//!   used only for the email-confirmation link.
//!
//! The required claim sets are disjoint, so decoding one kind where the
//! other is expected always fails — a confirmation token can never pass
//! for a session token or vice versa.
//!
//! The admin claim is frozen at issuance time. A token minted before a
//! privilege change stays structurally valid until expiry with a stale
//! claim; detection of that condition lives in [`crate::auth::gateway`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Purpose claim value for email-confirmation tokens
const CONFIRMATION_PURPOSE: &str = "confirm_email";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Session token lifetime in hours
    pub session_ttl_hours: i64,
    /// Confirmation token lifetime in hours
    pub confirmation_ttl_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "super-secret-key-change-in-production".to_string()),
            session_ttl_hours: 24,
            confirmation_ttl_hours: 48,
            issuer: "smartstay".to_string(),
        }
    }
}

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Admin flag as of issuance time — NOT necessarily the current role
    pub admin: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Claims carried by an email-confirmation token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfirmationClaims {
    /// Email address being confirmed
    pub email: String,
    /// Always [`CONFIRMATION_PURPOSE`]
    pub purpose: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Issues and validates session and confirmation tokens.
#[derive(Clone)]
pub struct TokenService {
    config: JwtConfig,
}

/// Tolerate an `Authorization: Bearer <token>` value being passed whole
fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation
    }

    // ── Session tokens ─────────────────────────────────────────

    /// Issue a session token for a user, embedding the admin flag as it
    /// stands right now.
    pub fn issue_session(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.clone(),
            admin: user.is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.session_ttl_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
    }

    /// Decode and verify a session token. `None` on any failure: bad
    /// signature, malformed structure, missing claims, or expiry.
    pub fn decode_session(&self, token: &str) -> Option<SessionClaims> {
        decode::<SessionClaims>(
            strip_bearer(token),
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .ok()
    }

    /// Whether the token is a currently valid session token
    pub fn validate_session(&self, token: &str) -> bool {
        self.decode_session(token).is_some()
    }

    /// Extract the user ID from a session token
    pub fn session_user_id(&self, token: &str) -> Option<String> {
        self.decode_session(token).map(|c| c.sub)
    }

    /// The admin claim as asserted at issuance time. `false` for any
    /// token that does not decode.
    pub fn session_admin_claim(&self, token: &str) -> bool {
        self.decode_session(token).map(|c| c.admin).unwrap_or(false)
    }

    // ── Confirmation tokens ────────────────────────────────────

    /// Issue a single-purpose email-confirmation token
    pub fn issue_confirmation(&self, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = ConfirmationClaims {
            email: email.to_lowercase(),
            purpose: CONFIRMATION_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.confirmation_ttl_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
    }

    /// Decode and verify a confirmation token
    pub fn decode_confirmation(&self, token: &str) -> Option<ConfirmationClaims> {
        let claims = decode::<ConfirmationClaims>(
            strip_bearer(token),
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .ok()?;
        if claims.purpose != CONFIRMATION_PURPOSE {
            return None;
        }
        Some(claims)
    }

    /// Whether the token is a currently valid confirmation token
    pub fn validate_confirmation(&self, token: &str) -> bool {
        self.decode_confirmation(token).is_some()
    }

    /// Extract the email from a confirmation token
    pub fn confirmation_email(&self, token: &str) -> Option<String> {
        self.decode_confirmation(token).map(|c| c.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            confirmation_ttl_hours: 1,
            issuer: "smartstay-test".to_string(),
        })
    }

    fn sample_user(admin: bool) -> User {
        let mut u = User::new("a@b.com", "Ana", "García", "deadbeef");
        u.is_admin = admin;
        u
    }

    #[test]
    fn session_token_roundtrip() {
        let svc = service();
        let user = sample_user(false);
        let token = svc.issue_session(&user).unwrap();

        assert!(svc.validate_session(&token));
        assert_eq!(svc.session_user_id(&token).as_deref(), Some(user.id.as_str()));
        assert!(!svc.session_admin_claim(&token));
    }

    #[test]
    fn session_token_carries_admin_flag_at_issuance() {
        let svc = service();
        let token = svc.issue_session(&sample_user(true)).unwrap();
        assert!(svc.session_admin_claim(&token));
    }

    #[test]
    fn bearer_prefix_is_tolerated() {
        let svc = service();
        let token = svc.issue_session(&sample_user(false)).unwrap();
        assert!(svc.validate_session(&format!("Bearer {}", token)));
    }

    #[test]
    fn garbage_tokens_rejected() {
        let svc = service();
        assert!(!svc.validate_session("not.a.token"));
        assert!(!svc.validate_session(""));
        assert!(svc.session_user_id("not.a.token").is_none());
        assert!(!svc.validate_confirmation("not.a.token"));
    }

    #[test]
    fn wrong_secret_rejected() {
        let svc = service();
        let other = TokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let token = other.issue_session(&sample_user(false)).unwrap();
        assert!(!svc.validate_session(&token));
    }

    #[test]
    fn expired_session_rejected() {
        let svc = TokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_ttl_hours: -1,
            confirmation_ttl_hours: 1,
            issuer: "smartstay-test".to_string(),
        });
        let token = svc.issue_session(&sample_user(false)).unwrap();
        assert!(!svc.validate_session(&token));
    }

    #[test]
    fn confirmation_token_roundtrip() {
        let svc = service();
        let token = svc.issue_confirmation("A@B.com").unwrap();
        assert!(svc.validate_confirmation(&token));
        assert_eq!(svc.confirmation_email(&token).as_deref(), Some("a@b.com"));
    }

    #[test]
    fn token_kinds_are_mutually_unrecognizable() {
        let svc = service();
        let session = svc.issue_session(&sample_user(true)).unwrap();
        let confirmation = svc.issue_confirmation("a@b.com").unwrap();

        assert!(!svc.validate_session(&confirmation));
        assert!(!svc.validate_confirmation(&session));
        assert!(svc.session_user_id(&confirmation).is_none());
        assert!(svc.confirmation_email(&session).is_none());
    }
}
