//! SurrealDB repository implementations.

mod access_code;
mod client;
mod feedback;
mod hq_operator;
mod menu;
mod order;
mod session;
mod snapshot;
mod staff;
mod subscription;

pub use access_code::SurrealAccessCodeRepository;
pub use client::SurrealClientRepository;
pub use feedback::SurrealFeedbackRepository;
pub use hq_operator::SurrealHqOperatorRepository;
pub use menu::SurrealMenuItemRepository;
pub use order::SurrealOrderRepository;
pub use session::SurrealSessionRepository;
pub use snapshot::SurrealSnapshotRepository;
pub use staff::{SurrealStaffRepository, verify_password};
pub use subscription::SurrealSubscriptionEventRepository;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};

use crate::error::DbError;

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub(crate) fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}
