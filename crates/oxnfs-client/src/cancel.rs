//! Single-fire latches and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

/// Fires at most once. Used to make teardown idempotent.
#[derive(Debug, Default)]
pub struct CloseLatch {
    fired: AtomicBool,
}

impl CloseLatch {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Fire the latch. Returns `true` only for the caller that fired it.
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

type Listener = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

/// A cancellation signal shared between a caller and in-flight work.
///
/// Listeners registered with [`CancelToken::on_cancel`] run exactly once,
/// on the thread that calls [`CancelToken::cancel`]. Registering on an
/// already-cancelled token runs the listener immediately.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Signal cancellation and run every registered listener.
    pub fn cancel(&self) {
        let listeners = {
            let mut guard = self.inner.listeners.lock();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *guard)
        };
        for (_, listener) in listeners {
            listener();
        }
    }

    /// Run `listener` when the token is cancelled.
    ///
    /// The listener is unregistered when the returned guard drops.
    pub fn on_cancel<F>(&self, listener: F) -> CancelRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut guard = self.inner.listeners.lock();
            if !self.inner.cancelled.load(Ordering::Acquire) {
                guard.push((id, Box::new(listener)));
                return CancelRegistration {
                    inner: Arc::clone(&self.inner),
                    id,
                };
            }
        }
        listener();
        CancelRegistration {
            inner: Arc::clone(&self.inner),
            id,
        }
    }
}

/// Keeps a cancellation listener registered while alive.
pub struct CancelRegistration {
    inner: Arc<Inner>,
    id: u64,
}

impl std::fmt::Debug for CancelRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelRegistration").field("id", &self.id).finish()
    }
}

impl Drop for CancelRegistration {
    fn drop(&mut self) {
        self.inner.listeners.lock().retain(|(id, _)| *id != self.id);
    }
}
