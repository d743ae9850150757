//! Domain models for COMANDA.
//!
//! These are the core types shared across all crates.

pub mod access_code;
pub mod client;
pub mod entitlement;
pub mod feedback;
pub mod hq;
pub mod menu;
pub mod order;
pub mod session;
pub mod staff;
pub mod subscription;
