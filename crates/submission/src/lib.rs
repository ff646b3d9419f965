//! `sumki-submission`
//!
//! **Responsibility:** hand a finished order draft to the host platform.
//!
//! This crate provides:
//! - The host bridge seam (`HostBridge`), injected rather than global
//! - The submission gateway with its duplicate-send guard and send timeout
//! - Identity reading and out-of-band contact acquisition
//! - An HTTP relay bridge for delivering straight to the seller chat
//! - `OrderSession`, which wires the wizard to the gateway

pub mod bridge;
pub mod config;
pub mod contact;
pub mod gateway;
pub mod relay;
pub mod session;

pub use bridge::{BridgeError, HostBridge};
pub use config::{ConfigError, RelayConfig, SubmissionConfig};
pub use contact::ContactRequester;
pub use gateway::{SubmissionGateway, SubmissionState, SubmitError};
pub use relay::{DeliveryMode, HttpRelay, RelayBridge, RelayError};
pub use session::{OrderSession, SessionError};
