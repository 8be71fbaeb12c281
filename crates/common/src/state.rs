//! Error type shared by state machines

use thiserror::Error;

/// A rejected state transition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid transition: {event} is not allowed in state {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} accepts no further events")]
    TerminalState(String),
}

impl StateError {
    /// State the machine was in when the event was rejected
    pub fn state(&self) -> &str {
        match self {
            StateError::InvalidTransition { from, .. } => from,
            StateError::TerminalState(state) => state,
        }
    }
}
