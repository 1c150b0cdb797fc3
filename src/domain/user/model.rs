//! User domain entity

use chrono::{DateTime, Utc};

/// A registered account.
///
/// Emails are stored lowercase so lookups stay case-insensitive without
/// collation tricks. The `credential` holds the hex digest produced by
/// the password hasher, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    /// Lowercased email, unique across accounts
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Hex-encoded password digest
    pub credential: String,
    pub is_admin: bool,
    /// Set once the confirmation link has been visited
    pub is_confirmed: bool,
    /// Product IDs the user saved to their wishlist
    pub wishlist: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unconfirmed, non-admin user
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into().to_lowercase(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            credential: credential.into(),
            is_admin: false,
            is_confirmed: false,
            wishlist: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_unconfirmed_and_non_admin() {
        let u = User::new("Test@Example.COM", "Ana", "García", "abc123");
        assert!(!u.is_admin);
        assert!(!u.is_confirmed);
        assert!(u.wishlist.is_empty());
        assert_eq!(u.email, "test@example.com");
        assert_eq!(u.full_name(), "Ana García");
    }
}
