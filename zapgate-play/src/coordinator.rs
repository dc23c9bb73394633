use crate::error::{PlayError, Result};
use crate::presenter::Presenter;
use crate::session::{CancelHandle, Session, SessionKind};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;
use zapgate_core::{GateConfig, PaymentsClient, QrEncoder};

type HostCallback = Arc<dyn Fn(SessionKind) + Send + Sync>;

struct ActiveSession {
    id: Uuid,
    kind: SessionKind,
    cancel: CancelHandle,
}

struct GateState {
    balance_sats: u64,
    active: Option<ActiveSession>,
}

struct Inner {
    config: GateConfig,
    client: Box<dyn PaymentsClient>,
    encoder: Box<dyn QrEncoder>,
    presenter: Box<dyn Presenter>,
    state: Mutex<GateState>,
    on_settled: Mutex<Option<HostCallback>>,
    on_failed: Mutex<Option<HostCallback>>,
}

/// Owns the accumulated balance and the at-most-one active session.
///
/// Cloneable handle over shared state; the host hands clones to whichever
/// component wants to initiate payments. The state lock is never held
/// across an await.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn new(
        config: GateConfig,
        client: impl PaymentsClient + 'static,
        encoder: impl QrEncoder + 'static,
        presenter: impl Presenter + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let balance_sats = config.initial_balance_sats;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                client: Box::new(client),
                encoder: Box::new(encoder),
                presenter: Box::new(presenter),
                state: Mutex::new(GateState {
                    balance_sats,
                    active: None,
                }),
                on_settled: Mutex::new(None),
                on_failed: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.inner.config
    }

    pub fn balance(&self) -> u64 {
        self.inner.state.lock().balance_sats
    }

    pub fn has_active_session(&self) -> bool {
        self.inner.state.lock().active.is_some()
    }

    /// Registered callback fires once per settled session, after the
    /// balance has been updated. The host typically loads the starting
    /// scene here.
    pub fn set_on_settled(&self, callback: impl Fn(SessionKind) + Send + Sync + 'static) {
        *self.inner.on_settled.lock() = Some(Arc::new(callback));
    }

    pub fn set_on_failed(&self, callback: impl Fn(SessionKind) + Send + Sync + 'static) {
        *self.inner.on_failed.lock() = Some(Arc::new(callback));
    }

    /// Requests cancellation of the active session, if any. The session
    /// reaches `Cancelled` even if the remote status later resolves.
    pub fn cancel_active(&self) -> bool {
        let state = self.inner.state.lock();
        match &state.active {
            Some(active) => {
                tracing::info!("Cancelling {:?} session {}", active.kind, active.id);
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Charges the per-play fee. On settlement the fee is credited to the
    /// balance and `on_settled` fires.
    pub async fn pay_for_play(&self) -> Result<()> {
        let product = self.inner.config.product_description.clone();

        self.run_session(
            SessionKind::Charge,
            |_state| Ok(self.inner.config.fee_sats),
            move |fee| format!("{} sats for {}", fee, product),
        )
        .await
    }

    /// Withdraws the full current balance. On settlement the balance is
    /// zeroed.
    pub async fn withdraw_all(&self) -> Result<()> {
        let product = self.inner.config.product_description.clone();

        self.run_session(
            SessionKind::Withdraw,
            |state| {
                if state.balance_sats == 0 {
                    return Err(PlayError::InsufficientBalance {
                        need: 1,
                        available: 0,
                    });
                }
                Ok(state.balance_sats)
            },
            move |_amount| product,
        )
        .await
    }

    async fn run_session(
        &self,
        kind: SessionKind,
        amount: impl FnOnce(&GateState) -> Result<u64>,
        describe: impl FnOnce(u64) -> String,
    ) -> Result<()> {
        // Claim the mutual-exclusion token and read the amount under one
        // lock acquisition, before any network call; a session settling
        // in between cannot leave the amount stale.
        let (mut session, amount_sats) = {
            let mut state = self.inner.state.lock();
            if state.active.is_some() {
                return Err(PlayError::Busy);
            }
            let amount_sats = amount(&state)?;
            let (session, cancel) = Session::new(kind, amount_sats, describe(amount_sats));
            state.active = Some(ActiveSession {
                id: session.id(),
                kind,
                cancel,
            });
            (session, amount_sats)
        };

        let result = session
            .run(
                self.inner.client.as_ref(),
                self.inner.encoder.as_ref(),
                self.inner.presenter.as_ref(),
                self.inner.config.qr_pixels,
                self.inner.config.completion_dwell,
            )
            .await;

        // Consume the terminal event exactly once: release the token and
        // settle the balance under a single lock acquisition, so a
        // duplicate terminal observation cannot credit twice.
        let settled = result.is_ok();
        {
            let mut state = self.inner.state.lock();
            let consumed = state.active.take().is_some();
            if consumed && settled {
                match kind {
                    SessionKind::Charge => state.balance_sats += amount_sats,
                    SessionKind::Withdraw => state.balance_sats = 0,
                }
                tracing::info!(
                    "Session {} settled; balance is now {} sats",
                    session.id(),
                    state.balance_sats
                );
            }
        }

        // Clone the callback out of its guard before invoking it, so a
        // callback that re-registers callbacks cannot deadlock.
        match &result {
            Ok(()) => {
                let callback = self.inner.on_settled.lock().clone();
                if let Some(callback) = callback {
                    callback(kind);
                }
            }
            Err(err) => {
                tracing::warn!("Session {} did not settle: {}", session.id(), err);
                let callback = self.inner.on_failed.lock().clone();
                if let Some(callback) = callback {
                    callback(kind);
                }
            }
        }

        result
    }
}
