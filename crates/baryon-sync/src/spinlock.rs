//! Single-word test-and-set lock.
//!
//! The lowest-level exclusive lock: one word, `0` = free, nonzero = held.
//! No queue, no owner tracking, no internal spinning. Callers that want a
//! busy-wait loop retry [`RawSpinLock::try_acquire`] themselves.

use crate::loom_compat::{AtomicU32, Ordering, fence};

/// A raw single-word exclusive lock.
///
/// Const-constructable so it can be placed in `static` items. Acquisition
/// is single-shot: [`try_acquire`](Self::try_acquire) performs exactly one
/// compare-and-swap and reports the outcome. Retry, backoff, and yielding
/// are caller policy.
pub struct RawSpinLock {
    word: AtomicU32,
}

impl RawSpinLock {
    /// Creates a new lock in the free state.
    #[cfg(not(any(loom, shuttle)))]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Creates a new lock in the free state.
    #[cfg(any(loom, shuttle))]
    #[must_use]
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Returns `true` if the lock is currently held.
    ///
    /// Plain relaxed load, for diagnostics and assertions only. The answer
    /// may be stale the instant it returns; do not use it to decide an
    /// acquisition.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.word.load(Ordering::Relaxed) != 0
    }

    /// Attempts to acquire the lock with a single compare-and-swap.
    ///
    /// Returns `true` and establishes the caller as holder iff the word
    /// was `0` immediately before the swap, with acquire ordering on
    /// success. Returns `false` with the state unchanged otherwise. Never
    /// spins internally.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.word
            .compare_exchange(0, 1, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    ///
    /// Issues a full fence before clearing the word so every write made
    /// while holding the lock is visible before another CPU can observe
    /// the word as free.
    ///
    /// # Safety
    ///
    /// The caller must be the current holder. Releasing a lock it does not
    /// hold leaves other holders' critical sections unprotected.
    pub unsafe fn release(&self) {
        #[cfg(baryon_lock_debug)]
        assert!(
            self.word.load(Ordering::Relaxed) != 0,
            "release of an unheld RawSpinLock"
        );

        fence(Ordering::SeqCst);
        self.word.store(0, Ordering::Release);
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RawSpinLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawSpinLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}
