//! Deferred continuations delivered back to the manager.
//!
//! Timers and host callbacks never touch manager state directly. They post a
//! `UiEvent` on the manager's queue and the owner applies it, one event at a
//! time, on its own task.

use super::messages::MessageChannel;
use crate::bridge::ResourceRef;
use crate::view::ViewId;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Identity of an in-flight asynchronous show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// Which animation a view was waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Show,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The host finished instantiating the asset for a pending show
    Instantiated {
        request: RequestId,
        resource: ResourceRef,
    },
    /// A view's show or close animation ran its reported duration
    AnimationFinished { view: ViewId, phase: AnimationPhase },
    /// A transient message reached the end of its display time
    MessageExpired {
        channel: MessageChannel,
        generation: u64,
    },
}

/// Post `event` after `after` has elapsed on the tokio clock.
///
/// Must be called from within a tokio runtime. Aborting the returned handle
/// cancels the continuation.
pub fn schedule(events: &UnboundedSender<UiEvent>, after: Duration, event: UiEvent) -> JoinHandle<()> {
    let events = events.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        // Receiver gone means the manager shut down
        let _ = events.send(event);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_duration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        let event = UiEvent::AnimationFinished {
            view: ViewId(1),
            phase: AnimationPhase::Show,
        };

        schedule(&tx, Duration::from_millis(500), event.clone());

        assert_eq!(rx.recv().await, Some(event));
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_schedule_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = schedule(
            &tx,
            Duration::from_secs(1),
            UiEvent::MessageExpired {
                channel: MessageChannel::Positive,
                generation: 1,
            },
        );
        handle.abort();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
