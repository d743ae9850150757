//! Access code minting, redemption and revocation.
//!
//! Codes open a table's self-service ordering session. Minting is a
//! manager action; redemption happens from the public ordering page and
//! bumps the use counter atomically in the repository.

use chrono::{DateTime, Utc};
use comanda_core::error::{Error, PosResult};
use comanda_core::models::access_code::{AccessCode, CODE_ALPHABET, CODE_LEN, CreateAccessCode};
use comanda_core::models::entitlement::{ActionClass, Feature};
use comanda_core::repository::{AccessCodeRepository, PaginatedResult, Pagination};
use comanda_entitle::EntitlementCheck;
use rand::Rng;
use uuid::Uuid;

/// Attempts at finding an unused code before giving up. The code space
/// is 32^8, so a second pass already means something is wrong.
const MAX_MINT_ATTEMPTS: usize = 4;

/// Input for minting a new access code. The code string itself is
/// generated server-side.
#[derive(Debug, Clone)]
pub struct MintAccessCode {
    pub tenant_id: Uuid,
    pub label: Option<String>,
    pub max_uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct AccessCodeService<A: AccessCodeRepository, E: EntitlementCheck> {
    codes: A,
    entitlements: E,
}

impl<A: AccessCodeRepository, E: EntitlementCheck> AccessCodeService<A, E> {
    pub fn new(codes: A, entitlements: E) -> Self {
        Self {
            codes,
            entitlements,
        }
    }

    /// Mint a new code. Administrative; gated on the `AccessCodes`
    /// feature.
    pub async fn mint(&self, input: MintAccessCode) -> PosResult<AccessCode> {
        self.entitlements
            .check_feature(
                input.tenant_id,
                Feature::AccessCodes,
                ActionClass::Administrative,
            )
            .await?;

        if input.max_uses == 0 {
            return Err(Error::Validation {
                message: "max_uses must be at least 1".into(),
            });
        }
        if let Some(expires_at) = input.expires_at {
            if expires_at <= Utc::now() {
                return Err(Error::Validation {
                    message: "expiry must be in the future".into(),
                });
            }
        }

        for _ in 0..MAX_MINT_ATTEMPTS {
            let code = generate_code();
            match self.codes.get_by_code(input.tenant_id, &code).await {
                Err(Error::NotFound { .. }) => {
                    return self
                        .codes
                        .create(CreateAccessCode {
                            tenant_id: input.tenant_id,
                            code,
                            label: input.label.clone(),
                            max_uses: input.max_uses,
                            expires_at: input.expires_at,
                        })
                        .await;
                }
                Ok(_) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::Internal(
            "could not allocate an unused access code".into(),
        ))
    }

    /// Redeem a code from the ordering page: verifies it is live and
    /// bumps its use counter in one step.
    pub async fn redeem(&self, tenant_id: Uuid, code: &str) -> PosResult<AccessCode> {
        self.entitlements
            .check_feature(tenant_id, Feature::AccessCodes, ActionClass::Operational)
            .await?;
        self.codes.redeem(tenant_id, code).await
    }

    /// Revoke a code so it can no longer be redeemed.
    pub async fn revoke(&self, tenant_id: Uuid, id: Uuid) -> PosResult<()> {
        self.entitlements
            .check_feature(tenant_id, Feature::AccessCodes, ActionClass::Operational)
            .await?;
        self.codes.revoke(tenant_id, id).await
    }

    /// Staff listing, newest first.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> PosResult<PaginatedResult<AccessCode>> {
        self.entitlements
            .check_feature(tenant_id, Feature::AccessCodes, ActionClass::Operational)
            .await?;
        self.codes.list(tenant_id, pagination).await
    }
}

/// Generate a random code from the unambiguous alphabet.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_use_the_alphabet() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn generated_codes_vary() {
        // 32^8 combinations; a collision here means the generator is
        // broken.
        assert_ne!(generate_code(), generate_code());
    }
}
