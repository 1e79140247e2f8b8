//! viewstack - runtime view-stack manager for game UI layers
//!
//! Instantiates, shows, animates, stacks and tears down screen-level views on
//! behalf of a host engine. The engine supplies asset instantiation, animation
//! playback and overlay surfaces through the traits in [`bridge`]; this crate
//! owns the view lifecycle, the reference-counted input lock, the debug mask
//! and transient messages.

pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod headless;
pub mod registry;
pub mod view;

pub use crate::core::{MessageChannel, RequestId, ViewManager};
pub use bridge::{AnimationBridge, AnimationGroup, AssetHost, ContainerRef, ResourceRef, UiSurface};
pub use config::{ManagerSettings, ViewConfigEntry, ViewTable};
pub use error::{ViewError, ViewResult};
pub use registry::{ViewConfigRegistry, ViewTypes};
pub use view::{LifecycleEvent, LifecycleHooks, View, ViewHandle, ViewId, ViewState};
