//! Error types for gatehouse — Railway Programming
//!
//! All operations return `Result<T, AuthError>`.
//! No panics, no unwraps in production code paths.

use thiserror::Error;

/// Unified error type for all gatehouse operations
#[derive(Error, Debug)]
pub enum AuthError {
    // ─── Registration Errors ───

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    // ─── Credential Errors ───

    #[error("No account for: {0}")]
    UnknownAccount(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    // ─── Token Errors ───

    #[error("Refresh token not found or already used")]
    RefreshTokenConsumed,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Expired access token")]
    TokenExpired,

    #[error("Invalid access token: {0}")]
    TokenInvalid(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ─── Infrastructure Errors ───

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status classification for the API layer
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmailTaken(_) => 409,
            Self::RoleNotFound(_) | Self::UserNotFound(_) => 404,
            Self::UnknownAccount(_)
            | Self::InvalidCredentials
            | Self::RefreshTokenConsumed
            | Self::RefreshTokenExpired
            | Self::MissingToken
            | Self::TokenExpired
            | Self::TokenInvalid(_) => 401,
            Self::Forbidden(_) => 403,
            Self::PasswordHash(_)
            | Self::Store(_)
            | Self::Io(_)
            | Self::Config(_)
            | Self::ActorUnavailable(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Internal faults are logged with full detail and surfaced opaque
    pub fn is_internal(&self) -> bool {
        self.status_code() == 500
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(err.to_string()),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        match err {
            // The verifier reports a mismatch as a distinct case; everything
            // else (malformed hash, parameter trouble) is an internal fault.
            argon2::password_hash::Error::Password => AuthError::InvalidCredentials,
            other => AuthError::PasswordHash(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Internal(format!("webhook request failed: {err}"))
    }
}

/// Result type alias for gatehouse operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(AuthError::EmailTaken("a@b.com".into()).status_code(), 409);
        assert_eq!(AuthError::RoleNotFound("Admin".into()).status_code(), 404);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::RefreshTokenConsumed.status_code(), 401);
        assert_eq!(AuthError::Forbidden("not yours".into()).status_code(), 403);
        assert_eq!(AuthError::Store("down".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_faults_flagged() {
        assert!(AuthError::Internal("boom".into()).is_internal());
        assert!(AuthError::ActorUnavailable("SessionActor".into()).is_internal());
        assert!(!AuthError::TokenExpired.is_internal());
    }

    #[test]
    fn test_jwt_error_split() {
        let expired = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert!(matches!(AuthError::from(expired), AuthError::TokenExpired));

        let invalid = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidToken,
        );
        assert!(matches!(AuthError::from(invalid), AuthError::TokenInvalid(_)));
    }
}
