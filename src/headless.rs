//! Headless host: implements every bridge without an engine.
//!
//! Resources are plain counters, animation durations come from a table keyed
//! by asset path, and every call the manager makes is recorded. The CLI demo
//! runs against it, and so do the tests.

use crate::bridge::{
    AnimationBridge, AnimationGroup, AssetHost, ContainerRef, InstantiateCallback, Placement,
    ResourceRef, UiContainers, UiSurface,
};
use crate::core::MessageChannel;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const VIEW_CONTAINER: ContainerRef = ContainerRef(1);
pub const LOADING_CONTAINER: ContainerRef = ContainerRef(2);
pub const MESSAGE_RESOURCE: ResourceRef = ResourceRef(3);

/// One recorded bridge call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    InstantiateAsync {
        path: String,
        parent: Option<ContainerRef>,
    },
    InstantiateSync {
        template: ResourceRef,
        parent: ContainerRef,
    },
    Delivered {
        path: String,
        resource: ResourceRef,
    },
    Place {
        resource: ResourceRef,
        placement: Placement,
    },
    Release(ResourceRef),
    PlayGroup {
        resource: ResourceRef,
        group: AnimationGroup,
        duration: Duration,
    },
    InputBlocker(bool),
    DebugMask(f32),
    Message {
        channel: MessageChannel,
        text: Option<String>,
    },
}

#[derive(Default)]
struct HeadlessState {
    next_resource: u64,
    paths: HashMap<ResourceRef, String>,
    durations: HashMap<(String, AnimationGroup), Duration>,
    message_durations: HashMap<AnimationGroup, Duration>,
    latencies: HashMap<String, Duration>,
    default_latency: Duration,
    calls: Vec<HostCall>,
}

/// Cloneable handle to a shared recording host.
#[derive(Clone)]
pub struct HeadlessHost {
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        let state = HeadlessState {
            // Low ids are reserved for the containers
            next_resource: 100,
            ..HeadlessState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        // A panic while holding the lock only happens in a failing test
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Duration reported when `group` plays on views instantiated from `path`.
    pub fn set_animation(&self, path: &str, group: AnimationGroup, duration: Duration) -> &Self {
        self.state()
            .durations
            .insert((path.to_string(), group), duration);
        self
    }

    /// Duration reported for a message channel's presentation animation.
    pub fn set_message_animation(&self, channel: MessageChannel, duration: Duration) -> &Self {
        self.state()
            .message_durations
            .insert(channel.animation_group(), duration);
        self
    }

    /// Delay before an async instantiation of `path` completes. Zero
    /// completes synchronously inside the call.
    pub fn set_latency(&self, path: &str, latency: Duration) -> &Self {
        self.state().latencies.insert(path.to_string(), latency);
        self
    }

    pub fn set_default_latency(&self, latency: Duration) -> &Self {
        self.state().default_latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Input blocker toggles, in order.
    pub fn blocker_toggles(&self) -> Vec<bool> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::InputBlocker(enabled) => Some(*enabled),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<ResourceRef> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Release(resource) => Some(*resource),
                _ => None,
            })
            .collect()
    }

    /// Animation groups played on `resource`, in order.
    pub fn groups_played(&self, resource: ResourceRef) -> Vec<AnimationGroup> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::PlayGroup {
                    resource: r, group, ..
                } if *r == resource => Some(*group),
                _ => None,
            })
            .collect()
    }

    pub fn resource_path(&self, resource: ResourceRef) -> Option<String> {
        self.state().paths.get(&resource).cloned()
    }

    fn allocate(&self, path: &str) -> ResourceRef {
        let mut state = self.state();
        let resource = ResourceRef(state.next_resource);
        state.next_resource += 1;
        state.paths.insert(resource, path.to_string());
        resource
    }

    fn record(&self, call: HostCall) {
        self.state().calls.push(call);
    }
}

impl AssetHost for HeadlessHost {
    fn instantiate_async(
        &mut self,
        path: &str,
        parent: Option<ContainerRef>,
        on_complete: InstantiateCallback,
    ) {
        self.record(HostCall::InstantiateAsync {
            path: path.to_string(),
            parent,
        });

        let resource = self.allocate(path);
        let latency = {
            let state = self.state();
            state
                .latencies
                .get(path)
                .copied()
                .unwrap_or(state.default_latency)
        };

        let host = self.clone();
        let path = path.to_string();
        let deliver = move || {
            host.record(HostCall::Delivered { path, resource });
            on_complete(resource);
        };

        if latency.is_zero() {
            deliver();
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                deliver();
            });
        }
    }

    fn instantiate_sync(&mut self, template: ResourceRef, parent: ContainerRef) -> ResourceRef {
        self.record(HostCall::InstantiateSync { template, parent });
        let path = self
            .resource_path(template)
            .unwrap_or_else(|| format!("template:{}", template.0));
        self.allocate(&path)
    }

    fn place(&mut self, resource: ResourceRef, placement: Placement) {
        self.record(HostCall::Place {
            resource,
            placement,
        });
    }

    fn resolve_containers(&mut self, _root: ResourceRef) -> UiContainers {
        UiContainers {
            views: VIEW_CONTAINER,
            loading: LOADING_CONTAINER,
            messages: MESSAGE_RESOURCE,
        }
    }

    fn release(&mut self, resource: ResourceRef) {
        self.record(HostCall::Release(resource));
    }
}

impl AnimationBridge for HeadlessHost {
    fn play_group(&mut self, resource: ResourceRef, group: AnimationGroup) -> Duration {
        let duration = {
            let state = self.state();
            let configured = if resource == MESSAGE_RESOURCE {
                state.message_durations.get(&group).copied()
            } else {
                state
                    .paths
                    .get(&resource)
                    .and_then(|path| state.durations.get(&(path.clone(), group)).copied())
            };
            configured.unwrap_or(Duration::ZERO)
        };

        self.record(HostCall::PlayGroup {
            resource,
            group,
            duration,
        });
        duration
    }
}

impl UiSurface for HeadlessHost {
    fn set_input_blocker(&mut self, enabled: bool) {
        self.record(HostCall::InputBlocker(enabled));
    }

    fn set_debug_mask_alpha(&mut self, alpha: f32) {
        self.record(HostCall::DebugMask(alpha));
    }

    fn set_message(&mut self, channel: MessageChannel, text: Option<&str>) {
        self.record(HostCall::Message {
            channel,
            text: text.map(str::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_delivery_and_durations() {
        let mut host = HeadlessHost::new();
        host.set_animation("UI/Start", AnimationGroup::SHOW, Duration::from_millis(500));

        let delivered = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&delivered);
        host.instantiate_async(
            "UI/Start",
            Some(VIEW_CONTAINER),
            Box::new(move |res| *slot.lock().unwrap() = Some(res)),
        );

        let resource = delivered.lock().unwrap().expect("delivered synchronously");
        assert_eq!(host.resource_path(resource).as_deref(), Some("UI/Start"));
        assert_eq!(
            host.play_group(resource, AnimationGroup::SHOW),
            Duration::from_millis(500)
        );
        assert_eq!(host.play_group(resource, AnimationGroup::CLOSE), Duration::ZERO);
        assert_eq!(
            host.groups_played(resource),
            vec![AnimationGroup::SHOW, AnimationGroup::CLOSE]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_defers_delivery() {
        let mut host = HeadlessHost::new();
        host.set_latency("UI/Slow", Duration::from_secs(2));

        let (tx, rx) = tokio::sync::oneshot::channel();
        host.instantiate_async(
            "UI/Slow",
            None,
            Box::new(move |res| {
                let _ = tx.send(res);
            }),
        );

        let start = tokio::time::Instant::now();
        let resource = rx.await.expect("delivered");
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(host.calls().contains(&HostCall::Delivered {
            path: "UI/Slow".to_string(),
            resource,
        }));
    }

    #[test]
    fn test_sync_instantiation_inherits_template_path() {
        let mut host = HeadlessHost::new();
        let template = host.allocate("UI/Template");
        let copy = host.instantiate_sync(template, LOADING_CONTAINER);
        assert_ne!(copy, template);
        assert_eq!(host.resource_path(copy).as_deref(), Some("UI/Template"));
    }
}
