//! Reference-counted input lock.
//!
//! The count only moves by one at a time and never goes below zero. Callers
//! toggle the input blocker on the returned transition, so the blocker state
//! is always a function of `count == 0`.

use crate::error::{ViewError, ViewResult};

/// Effect of a lock or unlock on the blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// 0 -> 1: enable the blocker
    Engaged,
    /// 1 -> 0: disable the blocker
    Released,
    /// Count changed but stayed above zero
    Unchanged,
}

#[derive(Debug, Default, Clone)]
pub struct InputLock {
    count: u32,
}

impl InputLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&mut self) -> LockTransition {
        self.count += 1;
        if self.count == 1 {
            LockTransition::Engaged
        } else {
            LockTransition::Unchanged
        }
    }

    /// Release one lock. Unlocking at zero is an error and leaves the count at zero.
    pub fn unlock(&mut self) -> ViewResult<LockTransition> {
        match self.count {
            0 => Err(ViewError::InputLockUnderflow),
            1 => {
                self.count = 0;
                Ok(LockTransition::Released)
            }
            _ => {
                self.count -= 1;
                Ok(LockTransition::Unchanged)
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_only_at_zero_boundary() {
        let mut lock = InputLock::new();
        assert_eq!(lock.lock(), LockTransition::Engaged);
        assert_eq!(lock.lock(), LockTransition::Unchanged);
        assert!(lock.is_locked());

        assert_eq!(lock.unlock(), Ok(LockTransition::Unchanged));
        assert!(lock.is_locked());
        assert_eq!(lock.unlock(), Ok(LockTransition::Released));
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_underflow_clamps_at_zero() {
        let mut lock = InputLock::new();
        assert_eq!(lock.unlock(), Err(ViewError::InputLockUnderflow));
        assert_eq!(lock.count(), 0);

        // A later lock still engages normally
        assert_eq!(lock.lock(), LockTransition::Engaged);
        assert_eq!(lock.count(), 1);
    }

    #[test]
    fn test_random_balanced_sequences() {
        // Deterministic pseudo-random walk that never unlocks more than it locked
        let mut seed: u32 = 0x9e37_79b9;
        for _ in 0..50 {
            let mut lock = InputLock::new();
            let mut outstanding = 0u32;
            let mut toggles = 0u32;
            let mut expected_toggles = 0u32;

            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;

                if seed % 2 == 0 || outstanding == 0 {
                    if outstanding == 0 {
                        expected_toggles += 1;
                    }
                    outstanding += 1;
                    if lock.lock() != LockTransition::Unchanged {
                        toggles += 1;
                    }
                } else {
                    outstanding -= 1;
                    if outstanding == 0 {
                        expected_toggles += 1;
                    }
                    if lock.unlock().unwrap() != LockTransition::Unchanged {
                        toggles += 1;
                    }
                }

                assert_eq!(lock.is_locked(), outstanding > 0);
                assert_eq!(lock.count(), outstanding);
            }

            assert_eq!(toggles, expected_toggles);
        }
    }
}
