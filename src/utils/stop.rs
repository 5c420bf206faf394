//! Cancellation signal shared between the player and its playback thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Cloneable one-shot cancellation signal.
///
/// The playback thread checks [`cancelled`](StopSignal::cancelled) once per
/// loop iteration and sleeps through [`wait_timeout`](StopSignal::wait_timeout)
/// while pacing, so a `cancel` from the owning player interrupts both promptly.
#[derive(Debug)]
pub struct StopSignal {
    shared: Arc<SharedState>,
}

#[derive(Debug)]
struct SharedState {
    stopping: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> StopSignal {
        StopSignal {
            shared: Arc::new(SharedState {
                stopping: AtomicBool::new(false),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Request cancellation and wake every thread currently waiting.
    pub fn cancel(&self) {
        self.shared.stopping.store(true, Ordering::Relaxed);

        // Lock briefly so the store is ordered before the wakeup
        let _guard = self.shared.mutex.lock().unwrap();
        self.shared.condvar.notify_all();
    }

    pub fn cancelled(&self) -> bool {
        self.shared.stopping.load(Ordering::Relaxed)
    }

    /// Sleep for up to `timeout`, waking early on cancellation.
    ///
    /// Returns `true` if the signal was cancelled while waiting.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.shared.mutex.lock().unwrap();

        while !self.cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .shared
                .condvar
                .wait_timeout(guard, deadline - now)
                .unwrap();
            guard = next;
        }
        true
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StopSignal {
    fn clone(&self) -> StopSignal {
        StopSignal {
            shared: Arc::clone(&self.shared),
        }
    }
}
