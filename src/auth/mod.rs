//! # Authentication
//!
//! Password hashing, token issuance, session lifecycle and the request
//! authentication middleware.

pub mod hashing;
pub mod middleware;
pub mod session;
pub mod token_issuer;
pub mod user;

pub use middleware::{authenticate, CurrentUser, SessionAuthenticator};
pub use session::{LoginOutcome, LoginRequest, SessionService};
pub use token_issuer::{TokenError, TokenIssuer, TokenKeys, TokenPair};
pub use user::{NewUser, User};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
