//! View types: the behavior trait implemented by concrete screens, typed
//! handles returned to callers, and per-instance lifecycle notifications.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Identity of a live view instance. Never reused within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Behavior of a concrete view type.
///
/// `create` is the factory bound to the type's class binding at registration;
/// the other hooks run at fixed points of the show/close sequence.
pub trait View: Any + Send + Sized {
    /// Arguments supplied by whoever shows the view
    type Args: Send + 'static;

    fn create(args: Self::Args) -> Self;

    /// The show animation finished and input is about to unlock.
    fn on_shown(&mut self) {}

    /// The close sequence is starting.
    fn on_closing(&mut self) {}
}

/// Object-safe face of [`View`] used for storage inside the manager.
pub trait AnyView: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn shown(&mut self);
    fn closing(&mut self);
    fn type_name(&self) -> &'static str;
}

impl<T: View> AnyView for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn shown(&mut self) {
        View::on_shown(self)
    }

    fn closing(&mut self) {
        View::on_closing(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Typed reference to a live view of type `T`.
///
/// Handles are plain ids; resolving one against the manager fails once the
/// view has been destroyed.
pub struct ViewHandle<T> {
    id: ViewId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ViewHandle<T> {
    pub(crate) fn new(id: ViewId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }
}

impl<T> Clone for ViewHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ViewHandle<T> {}

impl<T> PartialEq for ViewHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ViewHandle<T> {}

impl<T> fmt::Debug for ViewHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewHandle<{}>({})", std::any::type_name::<T>(), self.id)
    }
}

impl<T> From<ViewHandle<T>> for ViewId {
    fn from(handle: ViewHandle<T>) -> Self {
        handle.id
    }
}

/// Lifecycle state of a live view.
///
/// A view is uninitialized until the manager attaches it and destroyed once
/// it leaves the live list, so neither appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Show animation running, input locked
    Opening,
    /// Fully shown
    Active,
    /// Close animation running, input locked
    Closing,
}

/// The four notifications every view instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    BeforeShow,
    AfterShow,
    BeforeClose,
    AfterClose,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeShow => "before-show",
            Self::AfterShow => "after-show",
            Self::BeforeClose => "before-close",
            Self::AfterClose => "after-close",
        }
    }
}

/// Manager-wide copy of a lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleNotice {
    pub id: ViewId,
    pub view_name: String,
    pub event: LifecycleEvent,
}

pub type LifecycleCallback = Box<dyn FnMut() + Send>;

/// Per-instance subscribers, invoked in registration order.
#[derive(Default)]
pub struct LifecycleHooks {
    subscribers: Vec<(LifecycleEvent, LifecycleCallback)>,
}

impl LifecycleHooks {
    pub fn subscribe(&mut self, event: LifecycleEvent, callback: LifecycleCallback) {
        self.subscribers.push((event, callback));
    }

    /// Builder form of [`LifecycleHooks::subscribe`], for hooks handed to a show call.
    pub fn on<F>(mut self, event: LifecycleEvent, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.subscribe(event, Box::new(callback));
        self
    }

    pub fn fire(&mut self, event: LifecycleEvent) {
        for (_, callback) in self.subscribers.iter_mut().filter(|(e, _)| *e == event) {
            callback();
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

/// Read-only description of a live view, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub id: ViewId,
    pub view_name: String,
    pub state: ViewState,
    pub type_name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Probe {
        shown: u32,
    }

    impl View for Probe {
        type Args = u32;

        fn create(args: u32) -> Self {
            Self { shown: args }
        }

        fn on_shown(&mut self) {
            self.shown += 1;
        }
    }

    #[test]
    fn test_any_view_downcast_and_hooks() {
        let mut boxed: Box<dyn AnyView> = Box::new(Probe::create(5));
        boxed.shown();

        let probe = boxed.as_any().downcast_ref::<Probe>().expect("probe");
        assert_eq!(probe.shown, 6);
        assert!(boxed.type_name().ends_with("Probe"));
        assert!(boxed.as_any().downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_hooks_fire_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = LifecycleHooks::default();

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            hooks.subscribe(
                LifecycleEvent::AfterShow,
                Box::new(move || log.lock().unwrap().push(tag)),
            );
        }
        let other = Arc::clone(&log);
        hooks.subscribe(
            LifecycleEvent::BeforeClose,
            Box::new(move || other.lock().unwrap().push("close")),
        );

        hooks.fire(LifecycleEvent::AfterShow);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(hooks.len(), 3);
    }

    #[test]
    fn test_handle_is_copy_and_converts() {
        let handle: ViewHandle<Probe> = ViewHandle::new(ViewId(7));
        let copy = handle;
        assert_eq!(handle, copy);
        assert_eq!(ViewId::from(copy), ViewId(7));
        assert_eq!(ViewId(7).to_string(), "#7");
    }
}
