//! User repository interface

use async_trait::async_trait;

use super::model::User;
use crate::domain::DomainResult;

/// Read projection of a user without the credential.
#[derive(Debug, Clone)]
pub struct UserProjection {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_confirmed: bool,
}

impl From<User> for UserProjection {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            is_admin: u.is_admin,
            is_confirmed: u.is_confirmed,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update a user
    async fn save(&self, user: User) -> DomainResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    /// Find user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    /// All users, credential stripped
    async fn find_all_projected(&self) -> DomainResult<Vec<UserProjection>>;

    /// Total number of users
    async fn count(&self) -> DomainResult<u64>;
}
