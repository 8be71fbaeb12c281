//! State machine for an asset being staged
//!
//! Empty → PartiallyFilled → Ready → Committing → Committed, with Discarded
//! reachable from every state before Committed. A failed commit rolls
//! Committing back to Ready.

use serde::{Deserialize, Serialize};

pub use hyuga_common::StateError;

/// Staging states of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StagingState {
    #[default]
    Empty,
    PartiallyFilled,
    Ready,
    Committing,
    Committed,
    Discarded,
}

impl StagingState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Discarded)
    }

    /// States in which fields and images may still change
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Empty | Self::PartiallyFilled | Self::Ready)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [StagingState] {
        match self {
            Self::Empty => &[Self::PartiallyFilled, Self::Ready, Self::Discarded],
            Self::PartiallyFilled => &[Self::PartiallyFilled, Self::Ready, Self::Discarded],
            Self::Ready => &[
                Self::PartiallyFilled,
                Self::Ready,
                Self::Committing,
                Self::Discarded,
            ],
            Self::Committing => &[Self::Committed, Self::Ready, Self::Discarded],
            Self::Committed => &[],
            Self::Discarded => &[],
        }
    }
}

impl std::fmt::Display for StagingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::PartiallyFilled => write!(f, "partially_filled"),
            Self::Ready => write!(f, "ready"),
            Self::Committing => write!(f, "committing"),
            Self::Committed => write!(f, "committed"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// Events that trigger staging transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingEvent {
    /// A field or image changed; `ready` is readiness after the change
    Edit { ready: bool },
    /// User asked to commit
    Commit,
    /// Backend persisted the asset
    Acknowledge,
    /// Backend call failed
    Reject,
    /// Draft removed locally
    Discard,
}

impl std::fmt::Display for StagingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit { .. } => write!(f, "edit"),
            Self::Commit => write!(f, "commit"),
            Self::Acknowledge => write!(f, "acknowledge"),
            Self::Reject => write!(f, "reject"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Staging state machine
pub struct StagingStateMachine;

impl StagingStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: StagingState,
        event: StagingEvent,
    ) -> Result<StagingState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (
                StagingState::Empty | StagingState::PartiallyFilled | StagingState::Ready,
                StagingEvent::Edit { ready },
            ) => {
                if ready {
                    StagingState::Ready
                } else {
                    StagingState::PartiallyFilled
                }
            }

            (StagingState::Ready, StagingEvent::Commit) => StagingState::Committing,

            (StagingState::Committing, StagingEvent::Acknowledge) => StagingState::Committed,
            (StagingState::Committing, StagingEvent::Reject) => StagingState::Ready,

            (_, StagingEvent::Discard) => StagingState::Discarded,

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: StagingState, event: &StagingEvent) -> bool {
        Self::transition(current, *event).is_ok()
    }
}
