use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::types::{
    ChargeRequest, ChargeResponse, StatusOutcome, WithdrawalRequest, WithdrawalResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote operations the payment session needs from the service.
///
/// `subscribe_*` suspends until the remote state is terminal and resolves
/// exactly once per call; repeated calls with the same id may return the
/// last outcome.
#[async_trait]
pub trait PaymentsClient: Send + Sync {
    async fn create_charge(&self, req: &ChargeRequest) -> Result<ChargeResponse>;

    async fn subscribe_charge(&self, id: &str) -> Result<StatusOutcome>;

    async fn create_withdrawal(&self, req: &WithdrawalRequest) -> Result<WithdrawalResponse>;

    async fn subscribe_withdrawal(&self, id: &str) -> Result<StatusOutcome>;
}

// Response envelopes for the ZBD-style REST API. Create responses carry
// `data.invoice.request` and `data.id`; status polls carry `data.status`
// as a lower-case word.
#[derive(Debug, Deserialize)]
struct CreateEnvelope {
    data: CreateData,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    id: String,
    invoice: Option<InvoiceData>,
}

#[derive(Debug, Deserialize)]
struct InvoiceData {
    request: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    data: StatusData,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: String,
}

/// HTTP client for a ZBD-style Lightning payments service.
pub struct ZbdClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl ZbdClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GateError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(1),
        })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        Ok(Self::new(&config.base_url, &config.api_key)?.with_poll_interval(config.poll_interval))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn submit<B: Serialize>(&self, path: &str, body: &B) -> Result<(String, String)> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::protocol(format!(
                "Service rejected request to {}: {}",
                path, status
            )));
        }

        let envelope: CreateEnvelope = parse_body(response).await?;
        let payment_request = envelope
            .data
            .invoice
            .and_then(|i| i.request)
            .unwrap_or_default();

        Ok((envelope.data.id, payment_request))
    }

    async fn poll_status(&self, path: &str, id: &str) -> Result<StatusOutcome> {
        let url = format!("{}{}/{}", self.base_url, path, id);

        loop {
            let response = self
                .http
                .get(&url)
                .header("apikey", &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(GateError::protocol(format!(
                    "Status poll for {} failed: {}",
                    id, status
                )));
            }

            let envelope: StatusEnvelope = parse_body(response).await?;
            match envelope.data.status.as_str() {
                "pending" | "processing" => {
                    tracing::debug!("{} still {}, polling again", id, envelope.data.status);
                    tokio::time::sleep(self.poll_interval).await;
                }
                word => return Ok(StatusOutcome::from_status_word(word)),
            }
        }
    }
}

async fn parse_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| GateError::protocol(format!("Malformed service response: {}", e)))
}

#[async_trait]
impl PaymentsClient for ZbdClient {
    async fn create_charge(&self, req: &ChargeRequest) -> Result<ChargeResponse> {
        tracing::debug!(
            "Creating charge: {} ({} sats)",
            req.description,
            req.amount_sats
        );

        let (id, payment_request) = self.submit("/v0/charges", req).await?;
        tracing::info!("Created charge {}", id);

        Ok(ChargeResponse {
            id,
            payment_request,
        })
    }

    async fn subscribe_charge(&self, id: &str) -> Result<StatusOutcome> {
        self.poll_status("/v0/charges", id).await
    }

    async fn create_withdrawal(&self, req: &WithdrawalRequest) -> Result<WithdrawalResponse> {
        tracing::debug!(
            "Creating withdrawal: {} ({} sats)",
            req.description,
            req.amount_sats
        );

        let (id, payment_request) = self.submit("/v0/withdrawal-requests", req).await?;
        tracing::info!("Created withdrawal {}", id);

        Ok(WithdrawalResponse {
            id,
            payment_request,
        })
    }

    async fn subscribe_withdrawal(&self, id: &str) -> Result<StatusOutcome> {
        self.poll_status("/v0/withdrawal-requests", id).await
    }
}
