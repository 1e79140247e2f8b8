//! Manager-owned state shared by every view instance: the input lock, the
//! debug mask, the host overlays and the continuation queue.

use super::events::{self, UiEvent};
use super::input_lock::{InputLock, LockTransition};
use crate::bridge::{AnimationBridge, AnimationGroup, ResourceRef, UiSurface};
use crate::error::ViewResult;
use crate::view::LifecycleNotice;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub type Observer = Box<dyn FnMut(&LifecycleNotice) + Send>;

pub struct UiContext {
    surface: Box<dyn UiSurface>,
    animator: Box<dyn AnimationBridge>,
    input: InputLock,
    dark_mode: bool,
    mask_alpha: f32,
    observers: Vec<Observer>,
    events: UnboundedSender<UiEvent>,
}

impl UiContext {
    pub fn new(
        surface: Box<dyn UiSurface>,
        animator: Box<dyn AnimationBridge>,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            surface,
            animator,
            input: InputLock::new(),
            dark_mode: false,
            mask_alpha: 0.0,
            observers: Vec::new(),
            events,
        }
    }

    pub fn lock_input(&mut self) {
        if self.input.lock() == LockTransition::Engaged {
            debug!("Input blocker enabled");
            self.surface.set_input_blocker(true);
        }
    }

    pub fn unlock_input(&mut self) -> ViewResult<()> {
        match self.input.unlock() {
            Ok(LockTransition::Released) => {
                debug!("Input blocker disabled");
                self.surface.set_input_blocker(false);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Unlock input number error: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_input_locked(&self) -> bool {
        self.input.is_locked()
    }

    pub fn input_lock_count(&self) -> u32 {
        self.input.count()
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Apply a debug mask alpha. Ignored unless dark mode is on.
    pub fn update_debug_mask(&mut self, alpha: f32) {
        if self.dark_mode {
            self.mask_alpha = alpha;
            self.surface.set_debug_mask_alpha(alpha);
        }
    }

    pub fn debug_mask_alpha(&self) -> f32 {
        self.mask_alpha
    }

    pub fn play(&mut self, resource: ResourceRef, group: AnimationGroup) -> Duration {
        self.animator.play_group(resource, group)
    }

    pub fn surface(&mut self) -> &mut dyn UiSurface {
        self.surface.as_mut()
    }

    pub fn schedule(&self, after: Duration, event: UiEvent) -> JoinHandle<()> {
        events::schedule(&self.events, after, event)
    }

    pub fn sender(&self) -> UnboundedSender<UiEvent> {
        self.events.clone()
    }

    pub fn observe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn notify(&mut self, notice: &LifecycleNotice) {
        for observer in &mut self.observers {
            observer(notice);
        }
    }
}
