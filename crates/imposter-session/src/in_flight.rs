//! Per-action in-flight flags.
//!
//! A double tap on "create" must not create two rooms. Each networked
//! action owns one flag; [`InFlight::try_begin`] sets it or reports that
//! the action is already running, and the returned guard clears it on drop
//! (including when the awaiting future is cancelled).

use std::sync::atomic::{AtomicBool, Ordering};

use crate::Action;

#[derive(Debug, Default)]
pub struct InFlight {
    create: AtomicBool,
    join: AtomicBool,
    next_round: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, action: Action) -> &AtomicBool {
        match action {
            Action::Create => &self.create,
            Action::Join => &self.join,
            Action::NextRound => &self.next_round,
        }
    }

    /// Marks `action` as running. `None` if it already was.
    pub fn try_begin(&self, action: Action) -> Option<InFlightGuard<'_>> {
        let flag = self.flag(action);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag })
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.flag(action).load(Ordering::Acquire)
    }
}

/// Clears its flag when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused_until_guard_drops() {
        let flags = InFlight::new();

        let guard = flags.try_begin(Action::Create).unwrap();
        assert!(flags.is_busy(Action::Create));
        assert!(flags.try_begin(Action::Create).is_none());

        drop(guard);
        assert!(!flags.is_busy(Action::Create));
        assert!(flags.try_begin(Action::Create).is_some());
    }

    #[test]
    fn test_actions_are_independent() {
        let flags = InFlight::new();
        let _create = flags.try_begin(Action::Create).unwrap();

        assert!(flags.try_begin(Action::Join).is_some());
        assert!(!flags.is_busy(Action::NextRound));
    }
}
