//! A single live view and its show/close state machine.
//!
//! ```text
//! attach ─▶ Opening ──show done──▶ Active ──close──▶ Closing ──close done──▶ removed
//!              │                     ▲
//!              └── close (queued) ───┘ replayed once the show finishes
//! ```
//!
//! Each transition into Opening or Closing takes one input lock, and the
//! matching animation continuation releases exactly that lock.

use super::context::UiContext;
use super::events::{AnimationPhase, UiEvent};
use crate::bridge::{AnimationGroup, ResourceRef};
use crate::config::ViewConfigEntry;
use crate::error::{ViewError, ViewResult};
use crate::view::{
    AnyView, LifecycleCallback, LifecycleEvent, LifecycleHooks, LifecycleNotice, ViewId,
    ViewState, ViewSummary,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Runs after a view has been removed and its resource released.
pub type CloseCallback = Box<dyn FnOnce(ViewId) + Send>;

/// A close requested while the view was still opening.
pub struct PendingClose {
    pub on_closed: Option<CloseCallback>,
}

/// Outcome of asking a view to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStep {
    /// The show animation is still running; the close starts when it ends
    Queued,
    /// The close animation is running
    Animating,
    /// No close animation; the view can be destroyed now
    Finished,
}

pub struct ViewInstance {
    id: ViewId,
    config: Arc<ViewConfigEntry>,
    resource: ResourceRef,
    open_time: Instant,
    state: ViewState,
    saved_mask_alpha: f32,
    queued_close: Option<PendingClose>,
    on_closed: Option<CloseCallback>,
    behavior: Box<dyn AnyView>,
    hooks: LifecycleHooks,
    timer: Option<JoinHandle<()>>,
}

impl ViewInstance {
    /// Bind behavior and its hooks to an instantiated resource. Nothing is shown yet.
    pub fn start(
        id: ViewId,
        config: Arc<ViewConfigEntry>,
        resource: ResourceRef,
        behavior: Box<dyn AnyView>,
        hooks: LifecycleHooks,
    ) -> Self {
        Self {
            id,
            config,
            resource,
            open_time: Instant::now(),
            state: ViewState::Opening,
            saved_mask_alpha: 0.0,
            queued_close: None,
            on_closed: None,
            behavior,
            hooks,
            timer: None,
        }
    }

    /// Begin the show sequence: swap in this view's debug mask, lock input,
    /// announce, and play the show group.
    pub fn init(&mut self, cx: &mut UiContext) {
        self.saved_mask_alpha = cx.debug_mask_alpha();
        cx.update_debug_mask(self.config.debug_mask_alpha);
        cx.lock_input();
        self.emit(cx, LifecycleEvent::BeforeShow);

        let duration = cx.play(self.resource, AnimationGroup::SHOW);
        if duration.is_zero() {
            // Nobody holds this view's id yet, so there is no queued close
            let _ = self.finish_open(cx);
        } else {
            debug!(
                "View '{}' {} show animation: {:?}",
                self.config.view_name, self.id, duration
            );
            self.timer = Some(cx.schedule(
                duration,
                UiEvent::AnimationFinished {
                    view: self.id,
                    phase: AnimationPhase::Show,
                },
            ));
        }
    }

    /// Show animation done. Returns a close that was requested meanwhile.
    pub fn finish_open(&mut self, cx: &mut UiContext) -> Option<PendingClose> {
        self.timer = None;
        self.state = ViewState::Active;
        self.emit(cx, LifecycleEvent::AfterShow);
        self.behavior.shown();
        // Balanced with the lock taken in init; an error here is already logged
        let _ = cx.unlock_input();
        self.queued_close.take()
    }

    /// Ask the view to close. Rejects a second close.
    pub fn request_close(
        &mut self,
        cx: &mut UiContext,
        on_closed: Option<CloseCallback>,
    ) -> ViewResult<CloseStep> {
        match self.state {
            ViewState::Closing => Err(self.already_closing()),
            ViewState::Opening if self.queued_close.is_some() => Err(self.already_closing()),
            ViewState::Opening => {
                debug!(
                    "View '{}' {} still opening; close queued",
                    self.config.view_name, self.id
                );
                self.queued_close = Some(PendingClose { on_closed });
                Ok(CloseStep::Queued)
            }
            ViewState::Active => Ok(self.begin_close(cx, on_closed)),
        }
    }

    /// Begin the close sequence: restore the previous debug mask, lock input,
    /// announce, and play the close group.
    pub fn begin_close(&mut self, cx: &mut UiContext, on_closed: Option<CloseCallback>) -> CloseStep {
        self.state = ViewState::Closing;
        self.on_closed = on_closed;
        self.behavior.closing();
        cx.update_debug_mask(self.saved_mask_alpha);
        cx.lock_input();
        self.emit(cx, LifecycleEvent::BeforeClose);

        let duration = cx.play(self.resource, AnimationGroup::CLOSE);
        if duration.is_zero() {
            self.finish_close(cx);
            CloseStep::Finished
        } else {
            self.timer = Some(cx.schedule(
                duration,
                UiEvent::AnimationFinished {
                    view: self.id,
                    phase: AnimationPhase::Close,
                },
            ));
            CloseStep::Animating
        }
    }

    /// Close animation done. The caller removes and releases the view next.
    pub fn finish_close(&mut self, cx: &mut UiContext) {
        self.timer = None;
        let _ = cx.unlock_input();
        self.emit(cx, LifecycleEvent::AfterClose);
    }

    /// Stop any pending continuation and hand back the close callback.
    pub fn teardown(&mut self) -> Option<CloseCallback> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.on_closed.take()
    }

    fn emit(&mut self, cx: &mut UiContext, event: LifecycleEvent) {
        self.hooks.fire(event);
        cx.notify(&LifecycleNotice {
            id: self.id,
            view_name: self.config.view_name.clone(),
            event,
        });
    }

    fn already_closing(&self) -> ViewError {
        ViewError::AlreadyClosing {
            id: self.id,
            name: self.config.view_name.clone(),
        }
    }

    pub fn subscribe(&mut self, event: LifecycleEvent, callback: LifecycleCallback) {
        self.hooks.subscribe(event, callback);
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.view_name
    }

    pub fn config(&self) -> &Arc<ViewConfigEntry> {
        &self.config
    }

    pub fn resource(&self) -> ResourceRef {
        self.resource
    }

    pub fn open_time(&self) -> Instant {
        self.open_time
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn behavior(&self) -> &dyn AnyView {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn AnyView {
        self.behavior.as_mut()
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            id: self.id,
            view_name: self.config.view_name.clone(),
            state: self.state,
            type_name: self.behavior.type_name(),
        }
    }
}
