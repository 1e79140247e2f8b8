//! The view stack.
//!
//! `ViewManager` owns every live view, the input lock, the debug mask and the
//! transient message channels. It is driven from a single task: public
//! operations mutate state synchronously, and deferred work (asset
//! instantiation, animation timers, message expiry) comes back as queued
//! [`UiEvent`]s that the owner applies with [`ViewManager::process_next`] or
//! [`ViewManager::process_pending`].

use super::context::{Observer, UiContext};
use super::events::{AnimationPhase, RequestId, UiEvent};
use super::instance::{CloseCallback, CloseStep, ViewInstance};
use super::messages::{MessageChannel, TransientMessages};
use crate::bridge::{AnimationBridge, AssetHost, ContainerRef, ResourceRef, UiContainers, UiSurface};
use crate::config::{ManagerSettings, ViewConfigEntry};
use crate::error::{ViewError, ViewResult};
use crate::registry::ViewConfigRegistry;
use crate::view::{
    AnyView, LifecycleEvent, LifecycleHooks, LifecycleNotice, View, ViewHandle, ViewId, ViewState,
    ViewSummary,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

type Attach = Box<dyn FnOnce(&mut ViewManager, ResourceRef) + Send>;

/// A show waiting for the host to deliver its asset.
struct PendingShow {
    view_name: String,
    attach: Attach,
}

pub struct ViewManager {
    settings: ManagerSettings,
    registry: ViewConfigRegistry,
    host: Box<dyn AssetHost>,
    root: ResourceRef,
    containers: UiContainers,
    ui: UiContext,
    /// Live views in stacking order
    views: Vec<ViewInstance>,
    pending: HashMap<RequestId, PendingShow>,
    messages: TransientMessages,
    events_rx: mpsc::UnboundedReceiver<UiEvent>,
    next_view_id: u64,
    next_request_id: u64,
}

impl ViewManager {
    /// Instantiate the bootstrap root, park it, and build a manager around it.
    ///
    /// Completes once the host delivers the root asset. Must run inside a
    /// tokio runtime; animation continuations are spawned on it.
    pub async fn init(
        settings: ManagerSettings,
        registry: ViewConfigRegistry,
        host: impl AssetHost + 'static,
        animator: impl AnimationBridge + 'static,
        surface: impl UiSurface + 'static,
    ) -> ViewResult<Self> {
        let mut host: Box<dyn AssetHost> = Box::new(host);

        let (root_tx, root_rx) = oneshot::channel();
        host.instantiate_async(
            &settings.bootstrap_asset,
            None,
            Box::new(move |resource| {
                let _ = root_tx.send(resource);
            }),
        );
        let root = root_rx.await.map_err(|_| {
            error!(
                "Bootstrap asset '{}' was never delivered",
                settings.bootstrap_asset
            );
            ViewError::BootstrapDropped {
                path: settings.bootstrap_asset.clone(),
            }
        })?;

        host.place(root, settings.root_placement);
        let containers = host.resolve_containers(root);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let ui = UiContext::new(Box::new(surface), Box::new(animator), events_tx);

        info!(
            "View manager ready: root {} with {} registered views",
            root,
            registry.len()
        );

        Ok(Self {
            settings,
            registry,
            host,
            root,
            containers,
            ui,
            views: Vec::new(),
            pending: HashMap::new(),
            messages: TransientMessages::new(),
            events_rx,
            next_view_id: 1,
            next_request_id: 1,
        })
    }

    // ----- showing -----

    /// Show a view of type `T`, instantiating its configured asset.
    ///
    /// `on_complete` runs once the asset arrives and the view has been
    /// initialized and pushed on the stack. Completion order across
    /// concurrent calls follows the host, not call order.
    pub fn show_async<T, F>(&mut self, args: T::Args, on_complete: F) -> ViewResult<RequestId>
    where
        T: View,
        F: FnOnce(ViewHandle<T>) + Send + 'static,
    {
        self.show_async_with::<T, F>(args, LifecycleHooks::default(), on_complete)
    }

    /// Like [`ViewManager::show_async`], attaching `hooks` before the show
    /// sequence starts so they see every lifecycle event.
    pub fn show_async_with<T, F>(
        &mut self,
        args: T::Args,
        hooks: LifecycleHooks,
        on_complete: F,
    ) -> ViewResult<RequestId>
    where
        T: View,
        F: FnOnce(ViewHandle<T>) + Send + 'static,
    {
        let config = Arc::clone(self.resolve::<T>()?);
        let parent = self.container_for(&config);
        let request = RequestId(self.next_request_id);
        self.next_request_id += 1;

        let asset_path = config.asset_path.clone();
        let view_name = config.view_name.clone();
        let attach: Attach = Box::new(move |manager, resource| {
            let id = manager.attach(resource, config, Box::new(T::create(args)), hooks);
            on_complete(ViewHandle::new(id));
        });
        self.pending.insert(request, PendingShow { view_name, attach });

        debug!("Instantiating '{}' under {} ({})", asset_path, parent, request);
        let events = self.ui.sender();
        self.host.instantiate_async(
            &asset_path,
            Some(parent),
            Box::new(move |resource| {
                let _ = events.send(UiEvent::Instantiated { request, resource });
            }),
        );

        Ok(request)
    }

    /// Show a view of type `T` from an already loaded template.
    pub fn show<T: View>(&mut self, template: ResourceRef, args: T::Args) -> ViewResult<ViewHandle<T>> {
        self.show_with::<T>(template, args, LifecycleHooks::default())
    }

    /// Like [`ViewManager::show`], attaching `hooks` before the show sequence starts.
    pub fn show_with<T: View>(
        &mut self,
        template: ResourceRef,
        args: T::Args,
        hooks: LifecycleHooks,
    ) -> ViewResult<ViewHandle<T>> {
        let config = Arc::clone(self.resolve::<T>()?);
        let parent = self.container_for(&config);
        let resource = self.host.instantiate_sync(template, parent);
        let id = self.attach(resource, config, Box::new(T::create(args)), hooks);
        Ok(ViewHandle::new(id))
    }

    fn resolve<T: View>(&self) -> ViewResult<&Arc<ViewConfigEntry>> {
        self.registry.resolve_type::<T>().inspect_err(|e| {
            error!("Cannot show view: {}", e);
        })
    }

    fn container_for(&self, config: &ViewConfigEntry) -> ContainerRef {
        if config.is_loading_view {
            self.containers.loading
        } else {
            self.containers.views
        }
    }

    fn attach(
        &mut self,
        resource: ResourceRef,
        config: Arc<ViewConfigEntry>,
        behavior: Box<dyn AnyView>,
        hooks: LifecycleHooks,
    ) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;

        info!("Opening view '{}' {} on {}", config.view_name, id, resource);
        let mut view = ViewInstance::start(id, config, resource, behavior, hooks);
        view.init(&mut self.ui);
        self.views.push(view);
        id
    }

    // ----- lookup -----

    /// Every live view of type `T`, in stacking order.
    pub fn get_views<T: View>(&self) -> ViewResult<Vec<ViewHandle<T>>> {
        let name = &self.registry.resolve_type::<T>()?.view_name;
        Ok(self
            .views
            .iter()
            .filter(|v| v.name() == name && v.behavior().as_any().is::<T>())
            .map(|v| ViewHandle::new(v.id()))
            .collect())
    }

    /// The earliest-opened live view of type `T`. Ties keep stacking order.
    pub fn get_view<T: View>(&self) -> ViewResult<Option<ViewHandle<T>>> {
        let name = &self.registry.resolve_type::<T>()?.view_name;
        Ok(self
            .views
            .iter()
            .filter(|v| v.name() == name && v.behavior().as_any().is::<T>())
            .min_by_key(|v| v.open_time())
            .map(|v| ViewHandle::new(v.id())))
    }

    /// The most recently pushed live view.
    pub fn latest_view(&self) -> Option<ViewId> {
        self.views.last().map(ViewInstance::id)
    }

    pub fn view<T: View>(&self, handle: ViewHandle<T>) -> Option<&T> {
        self.find(handle.id())?.behavior().as_any().downcast_ref::<T>()
    }

    pub fn view_mut<T: View>(&mut self, handle: ViewHandle<T>) -> Option<&mut T> {
        let index = self.index_of(handle.id())?;
        self.views[index].behavior_mut().as_any_mut().downcast_mut::<T>()
    }

    pub fn view_state(&self, id: impl Into<ViewId>) -> Option<ViewState> {
        self.find(id.into()).map(ViewInstance::state)
    }

    pub fn view_config(&self, id: impl Into<ViewId>) -> Option<&ViewConfigEntry> {
        self.find(id.into()).map(|v| v.config().as_ref())
    }

    pub fn view_resource(&self, id: impl Into<ViewId>) -> Option<ResourceRef> {
        self.find(id.into()).map(ViewInstance::resource)
    }

    pub fn contains(&self, id: impl Into<ViewId>) -> bool {
        self.find(id.into()).is_some()
    }

    pub fn live_view_count(&self) -> usize {
        self.views.len()
    }

    pub fn summaries(&self) -> Vec<ViewSummary> {
        self.views.iter().map(ViewInstance::summary).collect()
    }

    pub fn pending_shows(&self) -> usize {
        self.pending.len()
    }

    fn find(&self, id: ViewId) -> Option<&ViewInstance> {
        self.views.iter().find(|v| v.id() == id)
    }

    fn index_of(&self, id: ViewId) -> Option<usize> {
        self.views.iter().position(|v| v.id() == id)
    }

    // ----- closing -----

    /// Run the view's close sequence, then remove it and release its resource.
    ///
    /// A view still opening closes as soon as its show animation ends. A
    /// second close on the same view is rejected with `AlreadyClosing`.
    pub fn close_view(&mut self, id: impl Into<ViewId>) -> ViewResult<()> {
        self.close_inner(id.into(), None)
    }

    /// Like [`ViewManager::close_view`], calling `on_closed` after removal.
    pub fn close_view_then<F>(&mut self, id: impl Into<ViewId>, on_closed: F) -> ViewResult<()>
    where
        F: FnOnce(ViewId) + Send + 'static,
    {
        self.close_inner(id.into(), Some(Box::new(on_closed)))
    }

    fn close_inner(&mut self, id: ViewId, on_closed: Option<CloseCallback>) -> ViewResult<()> {
        let Some(index) = self.index_of(id) else {
            error!("Close requested for unknown view {}", id);
            return Err(ViewError::ViewNotFound { id });
        };

        info!("Closing view '{}' {}", self.views[index].name(), id);
        match self.views[index].request_close(&mut self.ui, on_closed) {
            Ok(CloseStep::Finished) => {
                self.destroy(index);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Rejected close: {}", e);
                Err(e)
            }
        }
    }

    /// Close the top view if it accepts escape and nothing is mid-transition.
    pub fn handle_escape(&mut self) -> Option<ViewId> {
        if self.is_input_locked() {
            return None;
        }
        let top = self.views.last()?;
        if top.state() != ViewState::Active || !top.config().can_close_by_escape {
            return None;
        }
        let id = top.id();
        self.close_view(id).ok().map(|_| id)
    }

    fn destroy(&mut self, index: usize) {
        let mut view = self.views.remove(index);
        let on_closed = view.teardown();
        self.host.release(view.resource());
        info!("Destroyed view '{}' {}", view.name(), view.id());
        if let Some(callback) = on_closed {
            callback(view.id());
        }
    }

    // ----- continuations -----

    /// Wait for the next continuation and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply every continuation already queued. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Keep applying continuations until no show, animation or message is outstanding.
    ///
    /// Never returns if the host drops an instantiation callback.
    pub async fn run_until_idle(&mut self) {
        while self.has_outstanding_work() {
            if !self.process_next().await {
                break;
            }
        }
    }

    pub fn has_outstanding_work(&self) -> bool {
        !self.pending.is_empty()
            || self.messages.any_active()
            || self.views.iter().any(|v| v.state() != ViewState::Active)
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Instantiated { request, resource } => {
                let Some(pending) = self.pending.remove(&request) else {
                    warn!("Instantiation for unknown request {}; releasing {}", request, resource);
                    self.host.release(resource);
                    return;
                };
                debug!("Asset for '{}' arrived ({})", pending.view_name, request);
                (pending.attach)(self, resource);
            }
            UiEvent::AnimationFinished { view, phase } => self.finish_animation(view, phase),
            UiEvent::MessageExpired {
                channel,
                generation,
            } => {
                if self.messages.expire(channel, generation) {
                    self.ui.surface().set_message(channel, None);
                } else {
                    debug!("Stale {} message expiry ignored", channel.as_str());
                }
            }
        }
    }

    fn finish_animation(&mut self, id: ViewId, phase: AnimationPhase) {
        let Some(index) = self.index_of(id) else {
            warn!("Animation finished for destroyed view {}", id);
            return;
        };

        let view = &mut self.views[index];
        match (phase, view.state()) {
            (AnimationPhase::Show, ViewState::Opening) => {
                debug!("View '{}' {} shown", view.name(), id);
                if let Some(pending) = view.finish_open(&mut self.ui) {
                    if view.begin_close(&mut self.ui, pending.on_closed) == CloseStep::Finished {
                        self.destroy(index);
                    }
                }
            }
            (AnimationPhase::Close, ViewState::Closing) => {
                view.finish_close(&mut self.ui);
                self.destroy(index);
            }
            (phase, state) => {
                warn!(
                    "Ignoring {:?} animation end for view {} in state {:?}",
                    phase, id, state
                );
            }
        }
    }

    // ----- input lock -----

    pub fn lock_input(&mut self) {
        self.ui.lock_input();
    }

    /// Release one input lock. Unlocking with no outstanding lock is reported
    /// and leaves the count at zero.
    pub fn unlock_input(&mut self) -> ViewResult<()> {
        self.ui.unlock_input()
    }

    pub fn is_input_locked(&self) -> bool {
        self.ui.is_input_locked()
    }

    pub fn input_lock_count(&self) -> u32 {
        self.ui.input_lock_count()
    }

    // ----- debug mask -----

    pub fn set_dark_mode(&mut self, enabled: bool) {
        debug!("Dark mode {}", if enabled { "on" } else { "off" });
        self.ui.set_dark_mode(enabled);
    }

    pub fn is_dark_mode(&self) -> bool {
        self.ui.is_dark_mode()
    }

    /// Apply a debug mask alpha. A no-op unless dark mode is enabled.
    pub fn update_debug_mask(&mut self, alpha: f32) {
        self.ui.update_debug_mask(alpha);
    }

    pub fn debug_mask_alpha(&self) -> f32 {
        self.ui.debug_mask_alpha()
    }

    // ----- messages -----

    /// Show `text` on `channel`, replacing any message still up there.
    pub fn show_transient_message(&mut self, channel: MessageChannel, text: &str) {
        let generation = self.messages.begin(channel, text);
        self.ui.surface().set_message(channel, Some(text));

        let played = self
            .ui
            .play(self.containers.messages, channel.animation_group());
        let hold = if played.is_zero() {
            self.settings.message_hold()
        } else {
            played
        };

        debug!("{} message for {:?}: {}", channel.as_str(), hold, text);
        let timer = self.ui.schedule(
            hold,
            UiEvent::MessageExpired {
                channel,
                generation,
            },
        );
        self.messages.set_timer(channel, timer);
    }

    pub fn positive_message(&mut self, text: &str) {
        self.show_transient_message(MessageChannel::Positive, text);
    }

    pub fn negative_message(&mut self, text: &str) {
        self.show_transient_message(MessageChannel::Negative, text);
    }

    pub fn current_message(&self, channel: MessageChannel) -> Option<&str> {
        self.messages.current(channel)
    }

    // ----- notifications -----

    /// Subscribe to one lifecycle event of a live view.
    ///
    /// The view already ran `BeforeShow` (and `AfterShow` too, if its show
    /// animation took no time) before its id was handed out. Pass hooks to
    /// [`ViewManager::show_async_with`] or [`ViewManager::show_with`] to see
    /// those, or use [`ViewManager::observe`].
    pub fn subscribe<F>(&mut self, id: impl Into<ViewId>, event: LifecycleEvent, callback: F) -> ViewResult<()>
    where
        F: FnMut() + Send + 'static,
    {
        let id = id.into();
        let index = self.index_of(id).ok_or(ViewError::ViewNotFound { id })?;
        self.views[index].subscribe(event, Box::new(callback));
        Ok(())
    }

    /// Observe lifecycle events of every view, including ones not shown yet.
    pub fn observe<F>(&mut self, observer: F)
    where
        F: FnMut(&LifecycleNotice) + Send + 'static,
    {
        let observer: Observer = Box::new(observer);
        self.ui.observe(observer);
    }

    // ----- accessors -----

    pub fn registry(&self) -> &ViewConfigRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn root(&self) -> ResourceRef {
        self.root
    }

    pub fn containers(&self) -> UiContainers {
        self.containers
    }

    /// Tear everything down: hide any message still up, cancel continuations,
    /// release every live view (top first) and finally the root.
    pub fn shutdown(mut self) {
        for channel in MessageChannel::ALL {
            if self.messages.current(channel).is_some() {
                self.ui.surface().set_message(channel, None);
            }
        }
        self.messages.abort_all();
        let pending = self.pending.len();
        self.pending.clear();

        while let Some(mut view) = self.views.pop() {
            // Close callbacks are not run; the views never finished closing
            let _ = view.teardown();
            self.host.release(view.resource());
            debug!("Released view '{}' {} at shutdown", view.name(), view.id());
        }

        self.host.release(self.root);
        info!(
            "View manager shut down ({} pending shows abandoned)",
            pending
        );
    }
}
