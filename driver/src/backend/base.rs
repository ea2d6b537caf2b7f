//! State shared by every backend: deferred buffer release.
//!
//! Buffer payloads reach the render thread inside commands. Once a backend is
//! done with one, the payload and its release callback must go back to the
//! thread that owns the callback's captures. `schedule_destroy` queues the pair
//! on an mpsc channel; `purge` drains it on the main thread.
//!
//! ```text
//! render thread                         main thread
//! ─────────────                         ───────────
//! execute(UpdateBufferObject)
//!   └─ schedule_destroy(desc) ──mpsc──► purge()
//!                                         └─ callback(data)
//! ```

use std::sync::mpsc;

use parking_lot::Mutex;

use super::format_table::check_texture_info;
use crate::types::{BufferDescriptor, ReleaseCallback};

struct PendingRelease {
    data: Vec<u8>,
    callback: ReleaseCallback,
}

/// Deferred release queue owned by each backend.
pub struct DriverBase {
    sender: mpsc::Sender<PendingRelease>,
    receiver: Mutex<mpsc::Receiver<PendingRelease>>,
}

static_assertions::assert_impl_all!(DriverBase: Send, Sync);

impl DriverBase {
    pub fn new() -> Self {
        debug_assert!(check_texture_info(), "texture info table is not sorted");
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Hand a consumed buffer back for release on the next [`purge`](Self::purge).
    ///
    /// Buffers without a callback are dropped here and never touch the queue.
    #[inline]
    pub fn schedule_destroy(&self, buffer: BufferDescriptor) {
        if buffer.has_callback() {
            self.schedule_destroy_slow(buffer);
        }
    }

    #[cold]
    fn schedule_destroy_slow(&self, buffer: BufferDescriptor) {
        let (data, callback) = buffer.into_parts();
        let Some(callback) = callback else {
            return;
        };
        // The receiver lives in `self`, so the send cannot fail while `self` is alive.
        if self.sender.send(PendingRelease { data, callback }).is_err() {
            log::error!("DriverBase: release queue closed, dropping callback");
        }
    }

    /// Run every queued release callback on the calling thread.
    ///
    /// Returns the number of callbacks that fired.
    pub fn purge(&self) -> usize {
        let pending: Vec<PendingRelease> = self.receiver.lock().try_iter().collect();
        let count = pending.len();
        for PendingRelease { data, callback } in pending {
            callback(data);
        }
        if count > 0 {
            log::trace!("DriverBase: purged {} buffer(s)", count);
        }
        count
    }
}

impl Default for DriverBase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DriverBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverBase").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_buffer(calls: &Arc<AtomicUsize>, data: Vec<u8>) -> BufferDescriptor {
        let calls = calls.clone();
        BufferDescriptor::with_callback(data, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_without_callback_queues_nothing() {
        let base = DriverBase::new();
        base.schedule_destroy(BufferDescriptor::new(vec![0; 64]));
        assert_eq!(base.purge(), 0);
    }

    #[test]
    fn test_callback_fires_once_after_purge() {
        let base = DriverBase::new();
        let calls = Arc::new(AtomicUsize::new(0));
        base.schedule_destroy(counting_buffer(&calls, vec![1, 2, 3]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(base.purge(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(base.purge(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_receives_data() {
        let base = DriverBase::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        base.schedule_destroy(BufferDescriptor::with_callback(vec![7, 8], move |data| {
            sink.lock().extend(data);
        }));
        base.purge();
        assert_eq!(*seen.lock(), vec![7, 8]);
    }

    #[test]
    fn test_schedule_from_other_thread() {
        let base = Arc::new(DriverBase::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let base = base.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    for _ in 0..8 {
                        base.schedule_destroy(counting_buffer(&calls, vec![0]));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(base.purge(), 32);
        assert_eq!(calls.load(Ordering::SeqCst), 32);
    }
}
