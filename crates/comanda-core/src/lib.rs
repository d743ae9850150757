//! Core domain types for COMANDA: models, repository traits and the
//! shared error type. This crate has no database or HTTP dependencies;
//! everything IO-shaped lives behind the traits in [`repository`].

pub mod error;
pub mod models;
pub mod repository;

pub use error::{Error, PosResult};
