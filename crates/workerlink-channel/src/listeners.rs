use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::event::{Listener, ListenerId};

/// Listener registry shared between a handle and its delivery thread.
///
/// Delivery is held back until the first listener is added, then runs until
/// the set is closed.
pub(crate) struct ListenerSet {
    state: Mutex<ListenerState>,
    ready: Condvar,
}

struct ListenerState {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
    started: bool,
    closed: bool,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ListenerState {
                next_id: 1,
                entries: Vec::new(),
                started: false,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListenerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add(&self, listener: Listener) -> ListenerId {
        let mut state = self.lock();
        let id = ListenerId::new(state.next_id);
        state.next_id += 1;
        if !state.closed {
            state.entries.push((id, listener));
            if !state.started {
                state.started = true;
                self.ready.notify_all();
            }
        }
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|(entry, _)| *entry != id);
        state.entries.len() != before
    }

    /// Current listeners in registration order, or `None` once closed.
    pub(crate) fn snapshot(&self) -> Option<Vec<Listener>> {
        let state = self.lock();
        if state.closed {
            return None;
        }
        Some(
            state
                .entries
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect(),
        )
    }

    /// Block until delivery may start. Returns `false` if closed first.
    pub(crate) fn wait_started(&self) -> bool {
        let mut state = self.lock();
        while !state.started && !state.closed {
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        !state.closed
    }

    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.entries.clear();
        self.ready.notify_all();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::event::MessageEvent;

    fn noop() -> Listener {
        Arc::new(|_: &MessageEvent| {})
    }

    #[test]
    fn ids_are_unique_and_removable() {
        let set = ListenerSet::new();
        let a = set.add(noop());
        let b = set.add(noop());
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn first_listener_starts_delivery() {
        let set = Arc::new(ListenerSet::new());
        let waiter = {
            let set = set.clone();
            std::thread::spawn(move || set.wait_started())
        };
        set.add(noop());
        assert!(waiter.join().expect("waiter should finish"));
    }

    #[test]
    fn close_releases_waiters_and_drops_listeners() {
        let set = Arc::new(ListenerSet::new());
        let waiter = {
            let set = set.clone();
            std::thread::spawn(move || set.wait_started())
        };
        set.close();
        assert!(!waiter.join().expect("waiter should finish"));
        assert!(set.snapshot().is_none());

        set.add(noop());
        assert_eq!(set.len(), 0, "closed set must not keep listeners");
    }
}
