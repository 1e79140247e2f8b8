//! Transient toast-style messages.
//!
//! Each channel owns one text field. A new message on a channel aborts the
//! previous message's timer and bumps the channel generation, so an expiry
//! that was already queued for the old message is recognized as stale.

use crate::bridge::AnimationGroup;
use tokio::task::JoinHandle;

/// Message channel with its own text field and presentation animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageChannel {
    Positive,
    Negative,
}

impl MessageChannel {
    pub const ALL: [MessageChannel; 2] = [MessageChannel::Positive, MessageChannel::Negative];

    pub fn animation_group(&self) -> AnimationGroup {
        match self {
            MessageChannel::Positive => AnimationGroup::POSITIVE_MESSAGE,
            MessageChannel::Negative => AnimationGroup::NEGATIVE_MESSAGE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageChannel::Positive => "positive",
            MessageChannel::Negative => "negative",
        }
    }

    fn index(&self) -> usize {
        match self {
            MessageChannel::Positive => 0,
            MessageChannel::Negative => 1,
        }
    }
}

#[derive(Default)]
struct MessageSlot {
    generation: u64,
    text: Option<String>,
    timer: Option<JoinHandle<()>>,
}

/// Per-channel message state.
#[derive(Default)]
pub struct TransientMessages {
    slots: [MessageSlot; 2],
}

impl TransientMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new message, pre-empting whatever the channel was showing.
    /// Returns the generation the expiry must carry.
    pub fn begin(&mut self, channel: MessageChannel, text: &str) -> u64 {
        let slot = &mut self.slots[channel.index()];
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation += 1;
        slot.text = Some(text.to_string());
        slot.generation
    }

    pub fn set_timer(&mut self, channel: MessageChannel, timer: JoinHandle<()>) {
        self.slots[channel.index()].timer = Some(timer);
    }

    /// Clear the channel if `generation` is still current. Returns false for stale expiries.
    pub fn expire(&mut self, channel: MessageChannel, generation: u64) -> bool {
        let slot = &mut self.slots[channel.index()];
        if slot.generation != generation || slot.text.is_none() {
            return false;
        }
        slot.text = None;
        slot.timer = None;
        true
    }

    pub fn current(&self, channel: MessageChannel) -> Option<&str> {
        self.slots[channel.index()].text.as_deref()
    }

    pub fn any_active(&self) -> bool {
        self.slots.iter().any(|s| s.text.is_some())
    }

    pub fn abort_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
            slot.text = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_makes_old_expiry_stale() {
        let mut messages = TransientMessages::new();
        let first = messages.begin(MessageChannel::Positive, "Saved");
        let second = messages.begin(MessageChannel::Positive, "Saved again");

        assert!(!messages.expire(MessageChannel::Positive, first));
        assert_eq!(messages.current(MessageChannel::Positive), Some("Saved again"));

        assert!(messages.expire(MessageChannel::Positive, second));
        assert_eq!(messages.current(MessageChannel::Positive), None);
        assert!(!messages.any_active());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut messages = TransientMessages::new();
        let good = messages.begin(MessageChannel::Positive, "ok");
        let bad = messages.begin(MessageChannel::Negative, "no");

        assert_eq!(good, 1);
        assert_eq!(bad, 1);
        assert!(messages.expire(MessageChannel::Negative, bad));
        assert_eq!(messages.current(MessageChannel::Positive), Some("ok"));
    }

    #[test]
    fn test_channel_groups() {
        assert_eq!(
            MessageChannel::Positive.animation_group(),
            AnimationGroup::POSITIVE_MESSAGE
        );
        assert_eq!(MessageChannel::Negative.as_str(), "negative");
    }
}
