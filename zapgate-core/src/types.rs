use serde::{Deserialize, Serialize};

/// Body submitted to create a charge, shaped for the payments service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub description: String,
    #[serde(rename = "amountInSatoshi")]
    pub amount_sats: u64,
}

impl ChargeRequest {
    pub fn new(description: impl Into<String>, amount_sats: u64) -> Self {
        Self {
            description: description.into(),
            amount_sats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChargeResponse {
    pub id: String,
    /// Bolt11 invoice string; empty when the service did not attach one.
    pub payment_request: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub description: String,
    #[serde(rename = "amountInSatoshi")]
    pub amount_sats: u64,
}

impl WithdrawalRequest {
    pub fn new(description: impl Into<String>, amount_sats: u64) -> Self {
        Self {
            description: description.into(),
            amount_sats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalResponse {
    pub id: String,
    /// LNURL-withdraw string; empty when the service did not attach one.
    pub payment_request: String,
}

/// Terminal outcome of a charge or withdrawal subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

impl StatusOutcome {
    /// Map a lower-case remote status word; anything other than
    /// "completed" is non-success, reported verbatim.
    pub fn from_status_word(word: &str) -> Self {
        match word {
            "completed" => StatusOutcome::Completed,
            other => StatusOutcome::Failed(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StatusOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_request_wire_shape() {
        let req = ChargeRequest::new("10 sats for DEMO GAME", 10);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["description"], "10 sats for DEMO GAME");
        assert_eq!(json["amountInSatoshi"], 10);
    }

    #[test]
    fn status_word_mapping() {
        assert!(StatusOutcome::from_status_word("completed").is_completed());
        assert_eq!(
            StatusOutcome::from_status_word("expired"),
            StatusOutcome::Failed("expired".to_string())
        );
    }
}
