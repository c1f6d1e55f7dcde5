//! Bearer-token issuance and validation.
//!
//! Tokens are compact HS256 JWTs carrying the principal identity and a fixed
//! 24-hour expiry. Validation collapses every failure mode (malformed
//! envelope, bad signature, wrong algorithm, expired, mis-shaped claims) into
//! one opaque outcome so callers cannot build an oracle out of the responses.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskloom_core::UserId;

/// Fixed token lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Decoded token claims: who the principal is and when the token dies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub username: String,
    /// Issue time, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Single failure outcome for every validation problem.
    #[error("invalid or expired token")]
    Invalid,

    #[error("token signing failed")]
    Signing,
}

/// Issues and validates bearer tokens with a process-wide symmetric secret.
///
/// The secret comes from configuration; there is no rotation and no
/// revocation. Cloning shares the underlying keys.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Override the lifetime (tests issue already-expired tokens this way).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a token for the given principal.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Validate a token and return its claims.
    ///
    /// Only HS256 is accepted; asymmetric algorithms and `none` fail like any
    /// other invalid token.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug.
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET)
    }

    #[test]
    fn roundtrip_preserves_claims() {
        let token = issuer().issue(UserId::new(7), "alice").unwrap();
        let claims = issuer().validate(&token).unwrap();

        assert_eq!(claims.user_id, UserId::new(7));
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn token_has_three_segments() {
        let token = issuer().issue(UserId::new(1), "alice").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = issuer().with_ttl(Duration::hours(-1));
        let token = expired.issue(UserId::new(1), "alice").unwrap();
        assert_eq!(issuer().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issuer().issue(UserId::new(1), "alice").unwrap();
        let other = TokenIssuer::new(b"another-secret");
        assert_eq!(other.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issuer().issue(UserId::new(1), "alice").unwrap();
        let suffixed = format!("{token}x");
        assert_eq!(issuer().validate(&suffixed), Err(TokenError::Invalid));
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        assert_eq!(issuer().validate("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(issuer().validate(""), Err(TokenError::Invalid));
        assert_eq!(issuer().validate("a.b"), Err(TokenError::Invalid));
    }

    #[test]
    fn none_algorithm_is_rejected() {
        // Hand-built unsigned token claiming alg=none.
        let now = Utc::now().timestamp();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "user_id": 1,
                "username": "alice",
                "iat": now,
                "exp": now + 3600,
            })
            .to_string(),
        );
        let token = format!("{header}.{payload}.");

        assert_eq!(issuer().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn non_hs256_hmac_variant_is_rejected() {
        // Same HMAC family, different tag; validators pin HS256 exactly.
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: UserId::new(1),
            username: "alice".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(issuer().validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn mis_shaped_claims_are_rejected() {
        // Valid signature, wrong payload shape (no user_id).
        #[derive(Serialize)]
        struct Bare {
            exp: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Bare {
                exp: Utc::now().timestamp() + 3600,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(issuer().validate(&token), Err(TokenError::Invalid));
    }
}
