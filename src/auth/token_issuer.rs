//! Access and refresh token minting and verification.
//!
//! Both tokens are HS256 JWTs signed with different secrets, so a token of one
//! kind never verifies as the other. Keys and lifetimes come in through
//! [`TokenKeys`]; nothing is read from the process environment here.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::user::User;
use crate::config::AuthConfig;
use crate::domain::UserId;
use crate::errors::{AuthErrorType, Error, Result};

/// Signing secrets and lifetimes for both token kinds
#[derive(Clone)]
pub struct TokenKeys {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl From<&AuthConfig> for TokenKeys {
    fn from(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            access_ttl: config.access_token_expiry(),
            refresh_secret: config.refresh_token_secret.clone(),
            refresh_ttl: config.refresh_token_expiry(),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Freshly minted access/refresh pair
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// Why a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for Error {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid => Error::auth(error.to_string(), AuthErrorType::InvalidToken),
            TokenError::Expired => Error::auth(error.to_string(), AuthErrorType::ExpiredToken),
        }
    }
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn expiry_from(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX))
    }
}

pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(keys: TokenKeys) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: SigningKey::new(&keys.access_secret, keys.access_ttl),
            refresh: SigningKey::new(&keys.refresh_secret, keys.refresh_ttl),
            validation,
        }
    }

    /// Mint a new access/refresh pair for `user`. No side effects.
    pub fn mint(&self, user: &User) -> Result<TokenPair> {
        self.mint_at(user, Utc::now().timestamp())
    }

    pub(crate) fn mint_at(&self, user: &User, issued_at: i64) -> Result<TokenPair> {
        let access_claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            iat: issued_at,
            exp: self.access.expiry_from(issued_at),
            jti: Uuid::new_v4().to_string(),
        };
        let refresh_claims = RefreshClaims {
            sub: user.id.to_string(),
            iat: issued_at,
            exp: self.refresh.expiry_from(issued_at),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access_claims, &self.access.encoding)
            .map_err(|e| Error::internal(format!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(&header, &refresh_claims, &self.refresh.encoding)
            .map_err(|e| Error::internal(format!("Failed to sign refresh token: {}", e)))?;

        Ok(TokenPair { access_token, refresh_token })
    }

    /// Verify an access token and return its subject
    pub fn verify_access(&self, token: &str) -> std::result::Result<UserId, TokenError> {
        self.verify_access_claims(token).map(|claims| UserId::from_string(claims.sub))
    }

    pub fn verify_access_claims(
        &self,
        token: &str,
    ) -> std::result::Result<AccessClaims, TokenError> {
        self.decode_with::<AccessClaims>(token, &self.access)
    }

    /// Verify a refresh token and return its subject
    pub fn verify_refresh(&self, token: &str) -> std::result::Result<UserId, TokenError> {
        self.decode_with::<RefreshClaims>(token, &self.refresh)
            .map(|claims| UserId::from_string(claims.sub))
    }

    fn decode_with<C: DeserializeOwned>(
        &self,
        token: &str,
        key: &SigningKey,
    ) -> std::result::Result<C, TokenError> {
        decode::<C>(token, &key.decoding, &self.validation).map(|data| data.claims).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )
    }
}
