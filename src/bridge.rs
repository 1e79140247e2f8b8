//! Host capabilities consumed by the view manager.
//!
//! The manager never looks inside a resource or container handle. It only
//! passes them back to the host that produced them: to instantiate views, to
//! play animation groups on them, and to release them when a view is gone.

use crate::core::MessageChannel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque handle to an instantiated object owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRef(pub u64);

/// Opaque handle to a parent surface that views are instantiated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerRef(pub u64);

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res:{}", self.0)
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container:{}", self.0)
    }
}

/// World-space position applied to the UI root after bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Default for Placement {
    fn default() -> Self {
        // Parks the UI root far off the gameplay camera
        Self {
            x: 5000.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// Named animation group played on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationGroup(pub i32);

impl AnimationGroup {
    pub const SHOW: AnimationGroup = AnimationGroup(100);
    pub const CLOSE: AnimationGroup = AnimationGroup(200);
    pub const POSITIVE_MESSAGE: AnimationGroup = AnimationGroup(300);
    pub const NEGATIVE_MESSAGE: AnimationGroup = AnimationGroup(400);
}

/// Parent surfaces found inside the bootstrap root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiContainers {
    /// Parent for ordinary views
    pub views: ContainerRef,
    /// Parent for views flagged as loading screens
    pub loading: ContainerRef,
    /// Resource carrying the transient message animations
    pub messages: ResourceRef,
}

/// Completion callback handed to [`AssetHost::instantiate_async`].
///
/// May be invoked synchronously inside the call or later from any task.
pub type InstantiateCallback = Box<dyn FnOnce(ResourceRef) + Send>;

/// Asset instantiation supplied by the host.
pub trait AssetHost: Send {
    /// Instantiate the asset at `path` under `parent` and report the result.
    fn instantiate_async(
        &mut self,
        path: &str,
        parent: Option<ContainerRef>,
        on_complete: InstantiateCallback,
    );

    /// Instantiate a copy of an already loaded template under `parent`.
    fn instantiate_sync(&mut self, template: ResourceRef, parent: ContainerRef) -> ResourceRef;

    /// Move the bootstrap root to its resting position.
    fn place(&mut self, resource: ResourceRef, placement: Placement);

    /// Find the view, loading and message surfaces inside the bootstrap root.
    fn resolve_containers(&mut self, root: ResourceRef) -> UiContainers;

    /// Destroy an instantiated object.
    fn release(&mut self, resource: ResourceRef);
}

/// Animation playback supplied by the host.
pub trait AnimationBridge: Send {
    /// Start every animation of `group` attached to `resource`.
    ///
    /// Returns the longest duration among them, or zero when the resource
    /// has no animation in that group.
    fn play_group(&mut self, resource: ResourceRef, group: AnimationGroup) -> Duration;
}

/// Overlay state the manager drives on the host.
pub trait UiSurface: Send {
    /// Enable or disable the full-screen raycast blocker.
    fn set_input_blocker(&mut self, enabled: bool);

    /// Apply an alpha to the debug mask overlay.
    fn set_debug_mask_alpha(&mut self, alpha: f32);

    /// Show `text` on a message channel, or hide the channel with `None`.
    fn set_message(&mut self, channel: MessageChannel, text: Option<&str>);
}

/// Adapter turning two host closures into an [`AssetHost`].
///
/// Placement, container lookup and release are forwarded to `rest`.
pub struct FnAssetHost<A, S, R> {
    instantiate_async: A,
    instantiate_sync: S,
    rest: R,
}

/// The non-instantiation half of an [`AssetHost`].
pub trait AssetLifecycle: Send {
    fn place(&mut self, resource: ResourceRef, placement: Placement);
    fn resolve_containers(&mut self, root: ResourceRef) -> UiContainers;
    fn release(&mut self, resource: ResourceRef);
}

impl<A, S, R> FnAssetHost<A, S, R>
where
    A: FnMut(&str, Option<ContainerRef>, InstantiateCallback) + Send,
    S: FnMut(ResourceRef, ContainerRef) -> ResourceRef + Send,
    R: AssetLifecycle,
{
    pub fn new(instantiate_async: A, instantiate_sync: S, rest: R) -> Self {
        Self {
            instantiate_async,
            instantiate_sync,
            rest,
        }
    }
}

impl<A, S, R> AssetHost for FnAssetHost<A, S, R>
where
    A: FnMut(&str, Option<ContainerRef>, InstantiateCallback) + Send,
    S: FnMut(ResourceRef, ContainerRef) -> ResourceRef + Send,
    R: AssetLifecycle,
{
    fn instantiate_async(
        &mut self,
        path: &str,
        parent: Option<ContainerRef>,
        on_complete: InstantiateCallback,
    ) {
        (self.instantiate_async)(path, parent, on_complete)
    }

    fn instantiate_sync(&mut self, template: ResourceRef, parent: ContainerRef) -> ResourceRef {
        (self.instantiate_sync)(template, parent)
    }

    fn place(&mut self, resource: ResourceRef, placement: Placement) {
        self.rest.place(resource, placement)
    }

    fn resolve_containers(&mut self, root: ResourceRef) -> UiContainers {
        self.rest.resolve_containers(root)
    }

    fn release(&mut self, resource: ResourceRef) {
        self.rest.release(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Fixed;

    impl AssetLifecycle for Fixed {
        fn place(&mut self, _resource: ResourceRef, _placement: Placement) {}

        fn resolve_containers(&mut self, _root: ResourceRef) -> UiContainers {
            UiContainers {
                views: ContainerRef(1),
                loading: ContainerRef(2),
                messages: ResourceRef(3),
            }
        }

        fn release(&mut self, _resource: ResourceRef) {}
    }

    #[test]
    fn test_fn_host_forwards_closures() {
        let paths = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&paths);
        let mut host = FnAssetHost::new(
            move |path: &str, parent: Option<ContainerRef>, done: InstantiateCallback| {
                seen.lock().unwrap().push((path.to_string(), parent));
                done(ResourceRef(42));
            },
            |template: ResourceRef, _parent: ContainerRef| ResourceRef(template.0 + 1),
            Fixed,
        );

        let delivered = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&delivered);
        host.instantiate_async(
            "UI/Start",
            Some(ContainerRef(1)),
            Box::new(move |res| *slot.lock().unwrap() = Some(res)),
        );

        assert_eq!(*delivered.lock().unwrap(), Some(ResourceRef(42)));
        assert_eq!(
            paths.lock().unwrap().as_slice(),
            &[("UI/Start".to_string(), Some(ContainerRef(1)))]
        );
        assert_eq!(
            host.instantiate_sync(ResourceRef(9), ContainerRef(1)),
            ResourceRef(10)
        );
        assert_eq!(host.resolve_containers(ResourceRef(0)).loading, ContainerRef(2));
    }

    #[test]
    fn test_default_placement() {
        let placement = Placement::default();
        assert_eq!(placement.x, 5000.0);
        assert_eq!(placement.y, 0.0);
    }
}
