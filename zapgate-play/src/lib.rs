//! Zapgate payment session controller
//!
//! Gates game-scene entry behind a Lightning micropayment and lets the
//! player withdraw accumulated winnings via LNURL-withdraw. The hosting
//! engine owns the main loop and rendering; this crate drives one charge
//! or withdrawal at a time through an explicit state machine and projects
//! it onto a narrow presenter surface.

pub mod coordinator;
pub mod error;
pub mod presenter;
pub mod session;

pub use coordinator::Coordinator;
pub use error::{PlayError, Result};
pub use presenter::{NullPresenter, Presenter, SlotImage};
pub use session::{caption, CancelHandle, Session, SessionKind, SessionState};
