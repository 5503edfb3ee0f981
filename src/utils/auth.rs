//! Authentication utilities

use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::models::UserRole;

const PBKDF2_ITERATIONS: u32 = 100_000;
const HASH_LENGTH: usize = 32;

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

/// Access tokens are short-lived; refresh tokens last a week.
pub const ACCESS_TOKEN_TTL: u64 = 60 * 60;
pub const REFRESH_TOKEN_TTL: u64 = 60 * 60 * 24 * 7;

/// user identity stored in the jwt sub claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserIdentity,
    pub exp: usize,
    #[serde(default)]
    pub token_type: String,
}

/// hash a password using pbkdf2-sha256
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut hash,
    );

    hex::encode(hash)
}

/// verify a password against a hash using constant-time comparison
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    let computed_hash = hash_password(password, salt);
    computed_hash.as_bytes().ct_eq(hash.as_bytes()).into()
}

/// generate a random string of the given length
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// create jwt token with token type and ttl seconds
pub fn create_jwt(
    identity: UserIdentity,
    secret: &str,
    token_type: &str,
    expires_in: u64,
) -> Result<String> {
    let expiration = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + expires_in;

    let claims = Claims {
        sub: identity,
        exp: expiration as usize,
        token_type: token_type.to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// verify jwt token and optionally enforce token type
pub fn verify_jwt(token: &str, secret: &str, expected_type: Option<&str>) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.sub = None;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    let claims = token_data.claims;
    if let Some(t) = expected_type {
        if !claims.token_type.is_empty() && claims.token_type != t {
            return Err(anyhow::anyhow!("Invalid token type"));
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> UserIdentity {
        UserIdentity {
            id: 1,
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter2", "salt-a");
        assert!(verify_password("hunter2", &hash, "salt-a"));
        assert!(!verify_password("hunter3", &hash, "salt-a"));
        assert!(!verify_password("hunter2", &hash, "salt-b"));
    }

    #[test]
    fn test_jwt_roundtrip() {
        let token = create_jwt(identity(), "secret", ACCESS_TOKEN, 60).unwrap();
        let claims = verify_jwt(&token, "secret", Some(ACCESS_TOKEN)).unwrap();

        assert_eq!(claims.sub.id, 1);
        assert_eq!(claims.sub.email, "admin@example.com");
        assert_eq!(claims.token_type, ACCESS_TOKEN);
    }

    #[test]
    fn test_jwt_rejects_wrong_type() {
        let token = create_jwt(identity(), "secret", REFRESH_TOKEN, 60).unwrap();
        assert!(verify_jwt(&token, "secret", Some(ACCESS_TOKEN)).is_err());
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let token = create_jwt(identity(), "secret", ACCESS_TOKEN, 60).unwrap();
        assert!(verify_jwt(&token, "other", None).is_err());
    }

    #[test]
    fn test_random_string() {
        let s1 = generate_random_string(32);
        let s2 = generate_random_string(32);

        assert_eq!(s1.len(), 32);
        assert_ne!(s1, s2);
    }
}
