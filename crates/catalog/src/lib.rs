//! Normalization tables: internal codes → customer-facing labels.
//!
//! Tables are static, built once per process and never mutated. Lookups that
//! miss fall back to the raw code so unknown codes still render as text.

pub mod tables;

pub use tables::{NormalizationTables, TableKind};
