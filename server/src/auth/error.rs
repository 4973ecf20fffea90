//! Authentication Error Types

use agora_common::ErrorCode;
use thiserror::Error;

use crate::authz::StoreError;

/// Reasons a request could not be tied to a principal.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing Authorization header.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Invalid or expired token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but its user no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Token could not be issued.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Principal lookup failed.
    #[error("Principal lookup failed")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Error code reported to the caller.
    ///
    /// Lookup failures are defects, everything else means "no principal".
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Store(_) => ErrorCode::Unexpected,
            _ => ErrorCode::Unauthenticated,
        }
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
