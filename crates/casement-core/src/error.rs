//! Error taxonomy for window operations
//!
//! Only caller bugs are modeled as errors. Operational conditions such as a
//! rejected focus change, a dropped message or a full pool are reported as
//! booleans/outcomes by the component that owns them.

use thiserror::Error;

use crate::window::WindowState;

/// Errors surfaced to the caller of a window operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The operation is not allowed from the window's current lifecycle state
    #[error("cannot {operation} window '{id}' while it is {state}")]
    InvalidState {
        id: String,
        operation: &'static str,
        state: WindowState,
    },

    /// A live window already uses this id
    #[error("window id '{0}' is already registered")]
    DuplicateId(String),

    /// The window (or handle) is unknown to the registry
    #[error("window '{0}' is not registered")]
    NotRegistered(String),
}

impl WindowError {
    /// Shorthand for an [`WindowError::InvalidState`] error
    pub fn invalid_state(id: &str, operation: &'static str, state: WindowState) -> Self {
        Self::InvalidState {
            id: id.to_string(),
            operation,
            state,
        }
    }
}
