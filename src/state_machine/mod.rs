// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Lifecycles are modelled as Mealy machines: the next state and an output
//! are a pure function of the current state and an observed input.
//!
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! Nothing here performs I/O. The caller polls the outside world, turns the
//! observation into an input and stamps the transition with the time it was
//! observed.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use vaultwarden_infrastructure::state_machine::*;
//!
//! let mut certificate = StateMachineWithHistory::new(CertificateState::Requested);
//! certificate
//!     .transition_with_history(CertificateSignal::RecordsIssued, Utc::now())
//!     .unwrap();
//! assert_eq!(*certificate.current_state(), CertificateState::PendingValidation);
//! ```

pub mod certificate_lifecycle;

pub use certificate_lifecycle::{CertificateSignal, CertificateState, TransitionOutput};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Why an input was refused in the current state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The state accepts no further input of this kind
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The input arrived before the state was ready for it
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The input would repeat a step that may only happen once
    #[error("Business rule violated: {0}")]
    BusinessRuleViolation(String),
}

/// A finite state machine over typed states and inputs
pub trait StateMachine: Sized + Clone + PartialEq {
    type Input;

    /// Produced alongside the next state (use `()` if none)
    type Output;

    /// Next state and output for `input`, or why it is refused
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// Inputs accepted in this state, when they can be enumerated
    fn valid_inputs(&self) -> Vec<Self::Input> {
        Vec::new()
    }
}

/// One recorded state change
#[derive(Debug, Clone, Serialize)]
pub struct Transition<S, I> {
    pub from: S,
    pub to: S,
    pub input: I,
    pub timestamp: DateTime<Utc>,
}

/// A state machine that remembers how it got where it is
///
/// Only changes of state are recorded. Inputs that leave the state as it is
/// (a poll that finds nothing new) are applied but leave no trace, so waiting
/// indefinitely does not grow the history.
#[derive(Debug, Clone)]
pub struct StateMachineWithHistory<FSM: StateMachine> {
    current: FSM,
    history: Vec<Transition<FSM, FSM::Input>>,
}

impl<FSM: StateMachine> StateMachineWithHistory<FSM> {
    pub fn new(initial: FSM) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Apply `input` observed at `timestamp`
    pub fn transition_with_history(
        &mut self,
        input: FSM::Input,
        timestamp: DateTime<Utc>,
    ) -> TransitionResult<FSM::Output> {
        let (next, output) = self.current.transition(&input)?;

        if next != self.current {
            let from = std::mem::replace(&mut self.current, next.clone());
            self.history.push(Transition {
                from,
                to: next,
                input,
                timestamp,
            });
        }

        Ok(output)
    }

    /// State changes, oldest first
    pub fn get_history(&self) -> &[Transition<FSM, FSM::Input>] {
        &self.history
    }

    pub fn current_state(&self) -> &FSM {
        &self.current
    }
}
