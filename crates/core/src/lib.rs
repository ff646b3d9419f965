//! `sumki-core`: shared domain building blocks for the order wizard.
//!
//! This crate contains **pure domain** primitives (no host bridge, no IO).

pub mod error;
pub mod field;
pub mod id;
pub mod product;

pub use error::{DomainError, DomainResult};
pub use field::OrderField;
pub use id::SessionId;
pub use product::ProductKind;
