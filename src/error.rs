//! Error types for view management.
//!
//! None of these are fatal to the host. They describe contract violations by
//! a caller (unregistered types, double closes, unbalanced unlocks) and are
//! always logged before being returned.

use crate::view::ViewId;
use thiserror::Error;

/// Errors surfaced by the registry and the view manager.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewError {
    /// The requested view type was never bound to a configuration entry.
    #[error("unregistered view type: {type_name}")]
    UnregisteredViewType { type_name: &'static str },

    /// No live view with this id exists (already destroyed or never created).
    #[error("view {id} not found")]
    ViewNotFound { id: ViewId },

    /// The view is already running (or has queued) its close sequence.
    #[error("view {id} ('{name}') is already closing")]
    AlreadyClosing { id: ViewId, name: String },

    /// `unlock_input` was called with no outstanding lock.
    #[error("input unlock without matching lock")]
    InputLockUnderflow,

    /// The host dropped the bootstrap callback without delivering the root.
    #[error("bootstrap asset '{path}' was never delivered by the host")]
    BootstrapDropped { path: String },
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ViewError::AlreadyClosing {
            id: ViewId(3),
            name: "Start".to_string(),
        };
        assert_eq!(err.to_string(), "view #3 ('Start') is already closing");

        let err = ViewError::UnregisteredViewType {
            type_name: "game::ViewShop",
        };
        assert!(err.to_string().contains("game::ViewShop"));
    }
}
