//! Caller-owned cells filled by the render thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct Shared<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

/// Result of a command that reports back from the render thread.
///
/// The recording side keeps one clone and puts the other into the command.
/// When the command executes, the dispatcher fills the slot and wakes any
/// waiter. The value can be taken once.
pub struct ReturnSlot<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ReturnSlot<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Returns true if a value is waiting to be taken.
    pub fn is_ready(&self) -> bool {
        self.shared.value.lock().is_some()
    }

    /// Take the value without blocking.
    pub fn try_take(&self) -> Option<T> {
        self.shared.value.lock().take()
    }

    /// Block until a value arrives or `timeout` elapses, then take it.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut value = self.shared.value.lock();
        while value.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.shared.ready.wait_until(&mut value, deadline).timed_out() {
                        break;
                    }
                }
                None => self.shared.ready.wait(&mut value),
            }
        }
        value.take()
    }

    pub(crate) fn fulfill(&self, value: T) {
        *self.shared.value.lock() = Some(value);
        self.shared.ready.notify_all();
    }
}

impl<T> Clone for ReturnSlot<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for ReturnSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ReturnSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfill_then_take() {
        let slot = ReturnSlot::new();
        assert!(!slot.is_ready());
        assert_eq!(slot.try_take(), None);

        slot.clone().fulfill(5u32);
        assert!(slot.is_ready());
        assert_eq!(slot.try_take(), Some(5));
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_wait_timeout_wakes() {
        let slot = ReturnSlot::<Vec<u8>>::new();
        let remote = slot.clone();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            remote.fulfill(vec![1, 2]);
        });
        assert_eq!(slot.wait_timeout(Duration::from_secs(5)), Some(vec![1, 2]));
        worker.join().expect("worker panicked");
    }

    #[test]
    fn test_wait_timeout_expires() {
        let slot = ReturnSlot::<u8>::new();
        assert_eq!(slot.wait_timeout(Duration::from_millis(5)), None);
    }
}
