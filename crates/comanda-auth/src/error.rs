//! Authentication error types.

use comanda_core::error::Error;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountSuspended
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => Error::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => Error::Crypto(msg),
        }
    }
}
