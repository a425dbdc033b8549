//! Session reconciliation for the Memoria client core.
//!
//! This crate unifies the auth provider's asynchronous session stream into a
//! single consistent, awaitable snapshot:
//! - subscribes to the stream and folds every emission into one
//!   [`ReconcilerState`],
//! - deduplicates nothing on the wire (overlapping refreshes are allowed) but
//!   guarantees that every caller awaiting a refresh is woken by the next
//!   settled emission, exactly once,
//! - tracks initial-load completion so route guards can run against settled
//!   state,
//! - keeps the persisted bearer token in sync with the session snapshot.

mod error;
mod load_fsm;
mod reconciler;
mod source;
mod state;

pub use error::{ReconcilerError, ReconcilerResult};
pub use load_fsm::{LoadMachine, LoadMachineInput, LoadMachineState, LoadPhase};
pub use reconciler::SessionReconciler;
pub use source::SessionSource;
pub use state::ReconcilerState;

// Re-exported so consumers of the snapshot don't need a direct dependency on
// the adapter crate.
pub use memoria_auth_client::{Session, SessionEmission, User};
