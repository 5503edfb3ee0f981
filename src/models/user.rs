//! User model

use serde::{Deserialize, Serialize};

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Artist,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Artist => "artist",
            UserRole::User => "user",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "artist" => Some(UserRole::Artist),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// An account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i64,
    /// Unique, compared case-insensitively
    pub email: String,
    /// Password hash, never serialized to JSON
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: i64,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: 0,
            email,
            password: password_hash,
            role: UserRole::User,
            is_active: true,
            is_verified: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn admin(email: String, password_hash: String) -> Self {
        Self {
            role: UserRole::Admin,
            is_verified: true,
            ..Self::new(email, password_hash)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Email key used for case-insensitive uniqueness comparison
    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Serialize without the password hash
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            is_active: self.is_active,
            is_verified: self.is_verified,
        }
    }
}

/// Public user info (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_not_serialized() {
        let user = User::new("a@b.c".into(), "secret-hash".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(UserRole::from_str("Admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("curator"), None);
    }
}
