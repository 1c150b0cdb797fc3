//! Auth gateway: request identity resolution and role consistency
//!
//! Composes the token service with the user repository. Expected
//! outcomes (invalid token, missing identity) are values, never errors;
//! only storage failures propagate as `DomainError`.

use std::sync::Arc;

use crate::auth::jwt::TokenService;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, User};

/// Validates session tokens against live identity state.
pub struct AuthGateway {
    tokens: TokenService,
    repos: Arc<dyn RepositoryProvider>,
}

impl AuthGateway {
    pub fn new(tokens: TokenService, repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { tokens, repos }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve the caller behind a session token.
    ///
    /// `None` when the token is invalid (malformed, bad signature,
    /// expired) or when it references an identity that no longer exists.
    pub async fn resolve_identity(&self, token: &str) -> DomainResult<Option<User>> {
        let Some(user_id) = self.tokens.session_user_id(token) else {
            return Ok(None);
        };
        self.repos.users().find_by_id(&user_id).await
    }

    /// The caller's *current* admin flag — the stored role is the source
    /// of truth, independent of what the token asserted at issuance.
    pub async fn is_currently_admin(&self, token: &str) -> DomainResult<bool> {
        Ok(self
            .resolve_identity(token)
            .await?
            .map(|u| u.is_admin)
            .unwrap_or(false))
    }

    /// Whether the token's embedded admin claim disagrees with the
    /// stored role. `true` means the token predates a privilege change
    /// and the caller should re-authenticate.
    ///
    /// Detection only — the gateway never revokes tokens server-side;
    /// the HTTP layer answers with a status telling the client to
    /// refresh.
    pub async fn detect_stale_admin_claim(&self, token: &str) -> DomainResult<bool> {
        let claimed = self.tokens.session_admin_claim(token);
        let current = self.is_currently_admin(token).await?;
        Ok(claimed != current)
    }

    /// Admin-only: set another user's admin flag.
    ///
    /// Rejects a target equal to the acting identity — an admin cannot
    /// change their own flag, which prevents accidental self-lockout.
    pub async fn set_admin_flag(
        &self,
        acting: &User,
        target_id: &str,
        is_admin: bool,
    ) -> DomainResult<User> {
        if acting.id == target_id {
            return Err(DomainError::Validation(
                "cannot change own admin status".to_string(),
            ));
        }

        let Some(mut target) = self.repos.users().find_by_id(target_id).await? else {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: target_id.to_string(),
            });
        };

        tracing::info!(
            "Update admin status for user {} to {}",
            target.email,
            is_admin
        );
        target.is_admin = is_admin;
        target.updated_at = chrono::Utc::now();
        self.repos.users().save(target.clone()).await?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::infrastructure::storage::MemoryRepositoryProvider;

    fn gateway() -> AuthGateway {
        let tokens = TokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            confirmation_ttl_hours: 1,
            issuer: "smartstay-test".to_string(),
        });
        AuthGateway::new(tokens, Arc::new(MemoryRepositoryProvider::new()))
    }

    async fn stored_user(gw: &AuthGateway, admin: bool) -> User {
        let mut user = User::new("a@b.com", "Ana", "García", "deadbeef");
        user.is_admin = admin;
        user.is_confirmed = true;
        gw.repos.users().save(user.clone()).await.unwrap();
        user
    }

    #[tokio::test]
    async fn resolves_identity_for_valid_token() {
        let gw = gateway();
        let user = stored_user(&gw, false).await;
        let token = gw.tokens().issue_session(&user).unwrap();

        let resolved = gw.resolve_identity(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn invalid_token_resolves_to_none() {
        let gw = gateway();
        assert!(gw.resolve_identity("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_for_deleted_user_resolves_to_none() {
        let gw = gateway();
        // never stored
        let user = User::new("ghost@b.com", "Gh", "Ost", "deadbeef");
        let token = gw.tokens().issue_session(&user).unwrap();
        assert!(gw.resolve_identity(&token).await.unwrap().is_none());
        assert!(!gw.is_currently_admin(&token).await.unwrap());
    }

    #[tokio::test]
    async fn stale_admin_claim_detected_after_promotion() {
        let gw = gateway();
        let mut user = stored_user(&gw, false).await;
        let token = gw.tokens().issue_session(&user).unwrap();

        // promote in storage after the token was minted
        user.is_admin = true;
        gw.repos.users().save(user).await.unwrap();

        // embedded claim still says non-admin
        assert!(!gw.tokens().session_admin_claim(&token));
        // live role says admin
        assert!(gw.is_currently_admin(&token).await.unwrap());
        // and the disagreement is flagged
        assert!(gw.detect_stale_admin_claim(&token).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_token_has_no_stale_claim() {
        let gw = gateway();
        let user = stored_user(&gw, true).await;
        let token = gw.tokens().issue_session(&user).unwrap();
        assert!(!gw.detect_stale_admin_claim(&token).await.unwrap());
    }

    #[tokio::test]
    async fn self_demotion_is_rejected() {
        let gw = gateway();
        let admin = stored_user(&gw, true).await;

        let result = gw.set_admin_flag(&admin, &admin.id, false).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        // flag untouched
        let stored = gw.repos.users().find_by_id(&admin.id).await.unwrap().unwrap();
        assert!(stored.is_admin);
    }

    #[tokio::test]
    async fn set_admin_flag_persists_for_other_user() {
        let gw = gateway();
        let admin = stored_user(&gw, true).await;
        let mut other = User::new("other@b.com", "Ot", "Her", "deadbeef");
        other.is_confirmed = true;
        gw.repos.users().save(other.clone()).await.unwrap();

        let updated = gw.set_admin_flag(&admin, &other.id, true).await.unwrap();
        assert!(updated.is_admin);

        let stored = gw.repos.users().find_by_id(&other.id).await.unwrap().unwrap();
        assert!(stored.is_admin);
    }

    #[tokio::test]
    async fn set_admin_flag_unknown_target_is_not_found() {
        let gw = gateway();
        let admin = stored_user(&gw, true).await;
        let result = gw.set_admin_flag(&admin, "no-such-id", true).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
