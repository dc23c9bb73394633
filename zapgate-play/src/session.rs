use crate::error::{PlayError, Result};
use crate::presenter::{Presenter, SlotImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;
use zapgate_core::{
    ChargeRequest, GateError, PaymentsClient, QrEncoder, StatusOutcome, WithdrawalRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Charge,
    Withdraw,
}

/// Session lifecycle. `Settled`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Requesting,
    AwaitingPayment,
    Settled,
    Failed { reason: String },
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Settled | SessionState::Failed { .. } | SessionState::Cancelled
        )
    }
}

/// Caption shown next to the QR code; a pure function of the session
/// kind and amount.
pub fn caption(kind: SessionKind, amount_sats: u64) -> String {
    match kind {
        SessionKind::Charge => format!("Play Game for {} sats", amount_sats),
        SessionKind::Withdraw => format!("Congrats! Withdraw {} sats", amount_sats),
    }
}

/// Flips a session's cancellation flag. Cloneable so the host can keep
/// one while the session is being driven.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Requests cancellation. A no-op once the session has terminated.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// A single in-flight charge or withdrawal, from `begin` to terminal
/// state. Created by the coordinator and mutated only by its own run
/// loop.
pub struct Session {
    id: Uuid,
    kind: SessionKind,
    amount_sats: u64,
    description: String,
    remote_id: Option<String>,
    payment_request: Option<String>,
    state: SessionState,
    created_at: DateTime<Utc>,
    cancel_rx: watch::Receiver<bool>,
}

impl Session {
    pub fn new(
        kind: SessionKind,
        amount_sats: u64,
        description: impl Into<String>,
    ) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);

        let session = Self {
            id: Uuid::new_v4(),
            kind,
            amount_sats,
            description: description.into(),
            remote_id: None,
            payment_request: None,
            state: SessionState::Idle,
            created_at: Utc::now(),
            cancel_rx: rx,
        };

        (session, CancelHandle { tx: Arc::new(tx) })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn amount_sats(&self) -> u64 {
        self.amount_sats
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn payment_request(&self) -> Option<&str> {
        self.payment_request.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Drive the session from `Idle` to a terminal state. Returns `Ok`
    /// only when the session settled; every other terminal state is
    /// surfaced as the error that caused it.
    pub async fn run(
        &mut self,
        client: &dyn PaymentsClient,
        encoder: &dyn QrEncoder,
        presenter: &dyn Presenter,
        qr_pixels: u32,
        completion_dwell: Duration,
    ) -> Result<()> {
        match self
            .drive(client, encoder, presenter, qr_pixels, completion_dwell)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                let panel_open = matches!(self.state, SessionState::AwaitingPayment);

                match &err {
                    PlayError::Cancelled => {
                        tracing::warn!("Session {} cancelled", self.id);
                        self.state = SessionState::Cancelled;
                    }
                    other => {
                        tracing::error!("Session {} failed: {}", self.id, other);
                        // A rejected begin on a terminated session must not
                        // disturb its terminal state.
                        if !self.state.is_terminal() {
                            self.state = SessionState::Failed {
                                reason: other.to_string(),
                            };
                        }
                    }
                }

                if panel_open {
                    presenter.set_panel_visible(false);
                }

                Err(err)
            }
        }
    }

    async fn drive(
        &mut self,
        client: &dyn PaymentsClient,
        encoder: &dyn QrEncoder,
        presenter: &dyn Presenter,
        qr_pixels: u32,
        completion_dwell: Duration,
    ) -> Result<()> {
        self.begin()?;

        // Requesting: obtain a payment request from the service.
        let (remote_id, payment_request) = match self.kind {
            SessionKind::Charge => {
                let req = ChargeRequest::new(&self.description, self.amount_sats);
                let resp = client.create_charge(&req).await?;
                (resp.id, resp.payment_request)
            }
            SessionKind::Withdraw => {
                let req = WithdrawalRequest::new(&self.description, self.amount_sats);
                let resp = client.create_withdrawal(&req).await?;
                (resp.id, resp.payment_request)
            }
        };

        if self.is_cancelled() {
            return Err(PlayError::Cancelled);
        }

        if payment_request.is_empty() {
            return Err(GateError::protocol(format!(
                "Payment request missing from create response for {}",
                remote_id
            ))
            .into());
        }

        self.remote_id = Some(remote_id.clone());

        // Encode before opening the panel; an encoder failure never
        // subscribes.
        let raster = encoder.encode(&payment_request, qr_pixels)?;
        self.payment_request = Some(payment_request);
        self.state = SessionState::AwaitingPayment;
        tracing::info!(
            "Session {} awaiting payment for {} ({} sats)",
            self.id,
            remote_id,
            self.amount_sats
        );

        presenter.set_panel_visible(true);
        presenter.set_caption(&caption(self.kind, self.amount_sats));
        presenter.set_image(SlotImage::Qr(raster));

        // Await the terminal remote status, racing external cancellation.
        // `biased` checks the cancel flag first, so a status that resolves
        // after cancel() never settles the session.
        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            if cancel_rx.wait_for(|flag| *flag).await.is_err() {
                // Handle dropped without cancelling; never resolves.
                std::future::pending::<()>().await;
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancelled => StatusOutcome::Cancelled,
            resolved = async {
                match self.kind {
                    SessionKind::Charge => client.subscribe_charge(&remote_id).await,
                    SessionKind::Withdraw => client.subscribe_withdrawal(&remote_id).await,
                }
            } => resolved?,
        };

        let outcome = if self.is_cancelled() {
            StatusOutcome::Cancelled
        } else {
            outcome
        };

        match outcome {
            StatusOutcome::Completed => {
                self.state = SessionState::Settled;
                tracing::info!("Session {} settled", self.id);

                let badge = match self.kind {
                    SessionKind::Charge => SlotImage::Paid,
                    SessionKind::Withdraw => SlotImage::Withdrawn,
                };
                presenter.set_image(badge);

                // Keep the badge visible long enough for the player to
                // perceive success before the panel closes.
                tokio::time::sleep(completion_dwell).await;
                presenter.set_panel_visible(false);

                Ok(())
            }
            StatusOutcome::Failed(reason) => Err(PlayError::RemoteNotCompleted(reason)),
            StatusOutcome::Cancelled => Err(PlayError::Cancelled),
        }
    }

    fn begin(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(PlayError::InvalidState(
                "Session has already begun".to_string(),
            ));
        }

        self.state = SessionState::Requesting;
        tracing::info!(
            "Session {} requesting {:?} of {} sats",
            self.id,
            self.kind,
            self.amount_sats
        );
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("amount_sats", &self.amount_sats)
            .field("state", &self.state)
            .field("remote_id", &self.remote_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::NullPresenter;
    use async_trait::async_trait;
    use zapgate_core::{ChargeResponse, ImageQrEncoder, WithdrawalResponse};

    struct CompletingClient;

    #[async_trait]
    impl PaymentsClient for CompletingClient {
        async fn create_charge(
            &self,
            _req: &ChargeRequest,
        ) -> zapgate_core::Result<ChargeResponse> {
            Ok(ChargeResponse {
                id: "c1".to_string(),
                payment_request: "lnbc10".to_string(),
            })
        }

        async fn subscribe_charge(&self, _id: &str) -> zapgate_core::Result<StatusOutcome> {
            Ok(StatusOutcome::Completed)
        }

        async fn create_withdrawal(
            &self,
            _req: &WithdrawalRequest,
        ) -> zapgate_core::Result<WithdrawalResponse> {
            Ok(WithdrawalResponse {
                id: "w1".to_string(),
                payment_request: "lnurl1dp68gurn8ghj7".to_string(),
            })
        }

        async fn subscribe_withdrawal(&self, _id: &str) -> zapgate_core::Result<StatusOutcome> {
            Ok(StatusOutcome::Completed)
        }
    }

    #[test]
    fn caption_is_pure_function_of_kind_and_amount() {
        assert_eq!(caption(SessionKind::Charge, 10), "Play Game for 10 sats");
        assert_eq!(
            caption(SessionKind::Withdraw, 30),
            "Congrats! Withdraw 30 sats"
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::AwaitingPayment.is_terminal());
        assert!(SessionState::Settled.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }

    #[tokio::test]
    async fn second_begin_is_rejected() {
        let (mut session, _cancel) = Session::new(SessionKind::Charge, 10, "test charge");

        session
            .run(
                &CompletingClient,
                &ImageQrEncoder,
                &NullPresenter,
                64,
                Duration::ZERO,
            )
            .await
            .unwrap();
        assert_eq!(*session.state(), SessionState::Settled);

        let err = session
            .run(
                &CompletingClient,
                &ImageQrEncoder,
                &NullPresenter,
                64,
                Duration::ZERO,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlayError::InvalidState(_)));
        assert_eq!(*session.state(), SessionState::Settled);
    }

    #[tokio::test]
    async fn records_remote_id_and_payment_request() {
        let (mut session, _cancel) = Session::new(SessionKind::Charge, 10, "test charge");

        session
            .run(
                &CompletingClient,
                &ImageQrEncoder,
                &NullPresenter,
                64,
                Duration::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(session.remote_id(), Some("c1"));
        assert_eq!(session.payment_request(), Some("lnbc10"));
    }
}
