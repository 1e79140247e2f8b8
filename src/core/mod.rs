//! Core view-stack logic
//!
//! This module contains the view manager, the per-view state machine and the
//! shared UI state they drive. NO rendering here: everything visual goes
//! through the host bridges.

mod context;
pub mod events;
pub mod input_lock;
mod instance;
pub mod manager;
pub mod messages;

pub use events::{AnimationPhase, RequestId, UiEvent};
pub use input_lock::{InputLock, LockTransition};
pub use instance::CloseStep;
pub use manager::ViewManager;
pub use messages::{MessageChannel, TransientMessages};
