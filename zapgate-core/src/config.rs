use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Payments service endpoint.
    pub base_url: String,
    /// Bearer secret sent as the `apikey` header.
    pub api_key: String,
    /// Per-play charge.
    pub fee_sats: u64,
    /// Side length of QR rasters, in pixels.
    pub qr_pixels: u32,
    /// Used in charge and withdrawal description fields.
    pub product_description: String,
    /// How long the PAID/WITHDRAWN badge stays visible before the
    /// panel closes.
    pub completion_dwell: Duration,
    /// Cadence of status polling against the service.
    pub poll_interval: Duration,
    /// Seed credit granted before any play has been paid.
    pub initial_balance_sats: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.zebedee.io".to_string(),
            api_key: String::new(),
            fee_sats: 10,
            qr_pixels: 350,
            product_description: "ZAPGATE DEMO GAME".to_string(),
            completion_dwell: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            initial_balance_sats: 0,
        }
    }
}

impl GateConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(GateError::config("Base URL cannot be empty"));
        }

        if self.api_key.is_empty() {
            return Err(GateError::config("API key cannot be empty"));
        }

        if self.fee_sats == 0 {
            return Err(GateError::config("Play fee must be greater than 0"));
        }

        if self.qr_pixels == 0 {
            return Err(GateError::config("QR raster size must be greater than 0"));
        }

        Ok(())
    }
}
