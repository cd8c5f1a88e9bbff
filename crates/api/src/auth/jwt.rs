//! JWT identity-token validation.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. The subject
//! is the identity provider's opaque user id.

use autobahn_core::identity::CallerIdentity;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims read from every identity token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the identity provider's user id.
    pub sub: String,
    /// Display username. Falls back to `sub` when absent.
    #[serde(default, alias = "preferred_username")]
    pub username: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    pub fn into_identity(self) -> CallerIdentity {
        let username = self.username.unwrap_or_else(|| self.sub.clone());
        CallerIdentity::new(self.sub, username)
    }
}

/// Configuration for JWT validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to verify tokens.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from the environment.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Validate and decode a token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    fn claims(username: Option<&str>, exp_offset: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: "auth0|ada".to_string(),
            username: username.map(str::to_string),
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let config = test_config();
        let token = sign(&claims(Some("ada"), 900), &config.secret);

        let identity = validate_token(&token, &config)
            .expect("token validation should succeed")
            .into_identity();
        assert_eq!(identity.subject, "auth0|ada");
        assert_eq!(identity.username, "ada");
    }

    #[test]
    fn test_missing_username_falls_back_to_subject() {
        let config = test_config();
        let token = sign(&claims(None, 900), &config.secret);

        let identity = validate_token(&token, &config).unwrap().into_identity();
        assert_eq!(identity.username, "auth0|ada");
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        // Well beyond the default 60-second leeway.
        let token = sign(&claims(Some("ada"), -300), &config.secret);

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let token = sign(&claims(Some("ada"), 900), "secret-alpha");
        let config = JwtConfig {
            secret: "secret-bravo".to_string(),
        };

        assert!(
            validate_token(&token, &config).is_err(),
            "token signed with a different secret must fail"
        );
    }
}
