//! COMANDA Auth: password authentication, JWT issuance/validation,
//! and refresh-token sessions for staff and HQ operators.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{
    AuthService, HqAuthService, HqLoginInput, HqRefreshInput, LoginInput, LoginOutput,
    RefreshInput, RefreshOutput,
};
pub use token::{AccessTokenClaims, TokenScope, ValidatedClaims};
