//! Zapgate core - Lightning payments client and QR surface
//!
//! This crate holds the external collaborators of the payment session:
//! a client for a ZBD-style Lightning payments service and a QR encoder
//! that turns payment-request strings into raster images.

pub mod client;
pub mod config;
pub mod error;
pub mod qr;
pub mod types;

pub use client::{PaymentsClient, ZbdClient};
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use qr::{ImageQrEncoder, QrEncoder, QrRaster};
pub use types::{
    ChargeRequest, ChargeResponse, StatusOutcome, WithdrawalRequest, WithdrawalResponse,
};
