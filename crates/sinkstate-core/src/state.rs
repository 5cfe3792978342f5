//! Record lifecycle states and the transition table
//!
//! ```text
//!   Ready ──► Processing ──► Succeeded (terminal)
//!     ▲            │
//!     │            ▼
//!     └──────── Failed
//! ```
//!
//! Everything outside the arrows is illegal, including staying in the same
//! state. A same-state attempt usually means the record appears twice in the
//! data being processed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a sink record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtlState {
    Ready,
    Processing,
    Succeeded,
    Failed,
}

impl EtlState {
    /// All states, in lifecycle order
    pub const ALL: [EtlState; 4] = [
        EtlState::Ready,
        EtlState::Processing,
        EtlState::Succeeded,
        EtlState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EtlState::Ready => "ready",
            EtlState::Processing => "processing",
            EtlState::Succeeded => "succeeded",
            EtlState::Failed => "failed",
        }
    }

    /// States reachable from `self` in one step
    pub fn allowed_transitions(&self) -> &'static [EtlState] {
        match self {
            EtlState::Ready => &[EtlState::Processing],
            EtlState::Processing => &[EtlState::Succeeded, EtlState::Failed],
            EtlState::Failed => &[EtlState::Ready],
            EtlState::Succeeded => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn can_transition_to(&self, proposed: EtlState) -> bool {
        self.allowed_transitions().contains(&proposed)
    }

    /// Check that moving from `self` to `proposed` is legal
    pub fn validate_transition(self, proposed: EtlState) -> Result<(), IllegalTransition> {
        if self.can_transition_to(proposed) {
            Ok(())
        } else {
            Err(IllegalTransition {
                current: self,
                proposed,
            })
        }
    }
}

impl std::fmt::Display for EtlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EtlState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ready" => Ok(EtlState::Ready),
            "processing" => Ok(EtlState::Processing),
            "succeeded" => Ok(EtlState::Succeeded),
            "failed" => Ok(EtlState::Failed),
            _ => Err(UnknownState(s.to_string())),
        }
    }
}

/// Free-function form of [`EtlState::validate_transition`]
pub fn validate_transition(current: EtlState, proposed: EtlState) -> Result<(), IllegalTransition> {
    current.validate_transition(proposed)
}

/// A state string that does not name any [`EtlState`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown record state '{0}' (expected ready, processing, succeeded or failed)")]
pub struct UnknownState(pub String);

/// Attempted transition outside the legal table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllegalTransition {
    pub current: EtlState,
    pub proposed: EtlState,
}

impl IllegalTransition {
    /// Same-state attempts are how duplicates within one batch show up
    pub fn is_duplicate(&self) -> bool {
        self.current == self.proposed
    }
}

impl std::fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_duplicate() {
            write!(
                f,
                "Current state '{}' cannot transition to '{}', you might have duplicate records in your data set",
                self.current, self.proposed
            )
        } else if self.current.is_terminal() {
            write!(f, "Current state '{}' does not allow any transitions", self.current)
        } else {
            write!(
                f,
                "Current state '{}' cannot transition to '{}'",
                self.current, self.proposed
            )
        }
    }
}

impl std::error::Error for IllegalTransition {}
