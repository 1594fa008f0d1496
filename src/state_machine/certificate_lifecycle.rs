// Copyright (c) 2025 - Cowboy AI, Inc.
//! Certificate Lifecycle State Machine
//!
//! Uses the generic StateMachine trait from parent module.
//!
//! # States
//!
//! - Requested: certificate asked for, no validation records yet
//! - PendingValidation: records issued, waiting for an operator to publish them
//! - Validated: ownership confirmed (terminal)
//!
//! # Inputs
//!
//! - RecordsIssued: Requested → PendingValidation
//! - StillPending: PendingValidation → PendingValidation
//! - OwnershipConfirmed: PendingValidation → Validated
//!
//! There is no timeout and no failure state: a certificate may stay in
//! PendingValidation forever.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Certificate validation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateState {
    Requested,
    PendingValidation,
    Validated,
}

impl CertificateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CertificateState::Validated)
    }
}

impl fmt::Display for CertificateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateState::Requested => write!(f, "Requested"),
            CertificateState::PendingValidation => write!(f, "PendingValidation"),
            CertificateState::Validated => write!(f, "Validated"),
        }
    }
}

/// Observation fed into the certificate lifecycle (FSM input)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateSignal {
    /// The issuer returned DNS validation records
    RecordsIssued,

    /// A status poll found the certificate still unvalidated
    StillPending,

    /// The issuer confirmed domain ownership
    OwnershipConfirmed,
}

/// Transition output with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutput {
    /// Warnings generated during transition
    pub warnings: Vec<String>,

    /// Whether the gate opened with this transition
    pub gate_opened: bool,
}

impl TransitionOutput {
    /// Create output with no warnings
    pub fn ok() -> Self {
        Self {
            warnings: Vec::new(),
            gate_opened: false,
        }
    }

    /// Create output with warnings
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            gate_opened: false,
        }
    }

    /// Create output for the transition into Validated
    pub fn opened() -> Self {
        Self {
            warnings: Vec::new(),
            gate_opened: true,
        }
    }
}

impl StateMachine for CertificateState {
    type Input = CertificateSignal;
    type Output = TransitionOutput;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use CertificateSignal::*;
        use CertificateState::*;

        match (self, input) {
            (Requested, RecordsIssued) => Ok((PendingValidation, TransitionOutput::ok())),
            (Requested, StillPending) | (Requested, OwnershipConfirmed) => {
                Err(TransitionError::PreconditionFailed(
                    "Validation records have not been issued".to_string(),
                ))
            }

            (PendingValidation, StillPending) => Ok((
                PendingValidation,
                TransitionOutput::with_warnings(vec![
                    "Validation records not yet published".to_string()
                ]),
            )),
            (PendingValidation, OwnershipConfirmed) => Ok((Validated, TransitionOutput::opened())),
            (PendingValidation, RecordsIssued) => Err(TransitionError::BusinessRuleViolation(
                "Validation records already issued".to_string(),
            )),

            // Terminal
            (Validated, _) => Err(TransitionError::InvalidTransition {
                from: self.to_string(),
                to: "any state".to_string(),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use CertificateSignal::*;
        use CertificateState::*;

        match self {
            Requested => vec![RecordsIssued],
            PendingValidation => vec![StillPending, OwnershipConfirmed],
            Validated => vec![],
        }
    }
}
