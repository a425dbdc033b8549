//! Load-phase state machine using rust-fsm.
//!
//! Tracks where the session snapshot is in its load lifecycle. The key
//! distinction is Loading vs Refetching: both mean a fetch is in flight, but
//! only Loading happens before the first settled result, and guards must wait
//! it out before trusting the snapshot.
//!
//! ## State Diagram
//!
//! ```text
//! ┌───────────────┐
//! │ Uninitialized │ (initial)
//! └───────┬───────┘
//!         │ FetchStarted
//!         ▼
//! ┌───────────────┐  Settled   ┌───────────────┐
//! │    Loading    │ ─────────► │    Settled    │ ◄──┐
//! └───────────────┘            └───────┬───────┘    │ Settled
//!                                      │ FetchStarted
//!                                      ▼            │
//!                              ┌───────────────┐    │
//!                              │  Refetching   │ ───┘
//!                              └───────────────┘
//! ```
//!
//! Every input is accepted in every state, so feeding the machine from the
//! emission handler can never fail.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub load_machine(Uninitialized)

    Uninitialized => {
        FetchStarted => Loading,
        Settled => Settled
    },
    Loading => {
        FetchStarted => Loading,
        Settled => Settled
    },
    Settled => {
        FetchStarted => Refetching,
        Settled => Settled
    },
    Refetching => {
        FetchStarted => Refetching,
        Settled => Settled
    }
}

// Re-export the generated types with clearer names
pub use load_machine::Input as LoadMachineInput;
pub use load_machine::State as LoadMachineState;
pub use load_machine::StateMachine as LoadMachine;

/// Simplified view of the load phase for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// No fetch has started yet.
    Uninitialized,
    /// The initial load is in flight; the snapshot is not trustworthy.
    Loading,
    /// At least one fetch has settled and nothing is in flight.
    Settled,
    /// A refresh after the initial load is in flight; the snapshot still
    /// reflects the last settled result.
    Refetching,
}

impl LoadPhase {
    /// Returns true while any fetch is in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, LoadPhase::Loading | LoadPhase::Refetching)
    }

    /// Returns true once the initial load has completed.
    pub fn has_settled_once(&self) -> bool {
        matches!(self, LoadPhase::Settled | LoadPhase::Refetching)
    }
}

impl From<&LoadMachineState> for LoadPhase {
    fn from(state: &LoadMachineState) -> Self {
        match state {
            LoadMachineState::Uninitialized => LoadPhase::Uninitialized,
            LoadMachineState::Loading => LoadPhase::Loading,
            LoadMachineState::Settled => LoadPhase::Settled,
            LoadMachineState::Refetching => LoadPhase::Refetching,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_uninitialized() {
        let machine = LoadMachine::new();
        assert_eq!(
            LoadPhase::from(machine.state()),
            LoadPhase::Uninitialized
        );
    }

    #[test]
    fn first_fetch_enters_loading_not_refetching() {
        let mut machine = LoadMachine::new();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        assert_eq!(LoadPhase::from(machine.state()), LoadPhase::Loading);
    }

    #[test]
    fn fetch_after_settle_is_refetching() {
        let mut machine = LoadMachine::new();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        machine.consume(&LoadMachineInput::Settled).unwrap();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        assert_eq!(LoadPhase::from(machine.state()), LoadPhase::Refetching);
    }

    #[test]
    fn overlapping_fetches_stay_in_flight() {
        let mut machine = LoadMachine::new();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        machine.consume(&LoadMachineInput::Settled).unwrap();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        machine.consume(&LoadMachineInput::FetchStarted).unwrap();
        assert_eq!(LoadPhase::from(machine.state()), LoadPhase::Refetching);
        machine.consume(&LoadMachineInput::Settled).unwrap();
        assert_eq!(LoadPhase::from(machine.state()), LoadPhase::Settled);
    }

    #[test]
    fn every_input_is_accepted_in_every_state() {
        for state_inputs in [
            vec![],
            vec![LoadMachineInput::FetchStarted],
            vec![LoadMachineInput::FetchStarted, LoadMachineInput::Settled],
            vec![
                LoadMachineInput::FetchStarted,
                LoadMachineInput::Settled,
                LoadMachineInput::FetchStarted,
            ],
        ] {
            for probe in [LoadMachineInput::FetchStarted, LoadMachineInput::Settled] {
                let mut machine = LoadMachine::new();
                for input in state_inputs.iter() {
                    machine.consume(input).unwrap();
                }
                assert!(machine.consume(&probe).is_ok());
            }
        }
    }
}
