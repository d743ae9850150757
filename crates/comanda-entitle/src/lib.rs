//! COMANDA Entitle: resolves a tenant's plan entitlements from the HQ
//! authority with per-tenant snapshot fallback.

pub mod service;

pub use service::{EntitlementCheck, EntitlementService, EntitlementSource, ResolvedEntitlements};
