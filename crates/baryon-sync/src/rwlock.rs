//! Packed-word reader-writer lock.
//!
//! One 32-bit word holds both fields: bit 31 is the writer flag, the low
//! 31 bits are the reader count. Every mutation is a whole-word atomic, so
//! the two fields can never tear.
//!
//! ## Caveat: writers do not wait for readers
//!
//! [`read_acquire`](RawRwLock::read_acquire) does not look at the writer
//! flag, and [`write_try_acquire`](RawRwLock::write_try_acquire) claims
//! the flag without requiring the reader count to be zero. The primitive
//! guarantees writer-vs-writer exclusion only. Callers needing full
//! reader/writer exclusion must layer it themselves, e.g. by confirming
//! [`reader_count`](RawRwLock::reader_count) drains to zero after the
//! flag is claimed.

use crate::loom_compat::{AtomicU32, Ordering, fence};

/// Decoded snapshot of the packed lock word.
#[derive(Clone, Copy)]
struct Packed(u32);

impl Packed {
    /// Writer flag, the most significant bit of the word.
    const WRITER: u32 = 1 << 31;
    /// The low 31 bits hold the reader count.
    const READERS: u32 = !Self::WRITER;

    fn readers(self) -> u32 {
        self.0 & Self::READERS
    }

    fn write_locked(self) -> bool {
        self.0 & Self::WRITER != 0
    }
}

// The packed layout is a wire-level contract with anything that inspects
// the word directly (debuggers, lock-state dumps).
const _: () = assert!(Packed::WRITER == 0x8000_0000);
const _: () = assert!(Packed::READERS == 0x7FFF_FFFF);

/// A raw busy-wait reader-writer lock.
///
/// Const-constructable and suitable for `static` items. Readers count in
/// and out with whole-word fetch-adds; a writer claims bit 31 with a
/// single compare-and-swap. All acquisition is single-shot or
/// unconditional; spinning is caller policy. See the module docs for the
/// reader/writer exclusion caveat.
pub struct RawRwLock {
    word: AtomicU32,
}

impl RawRwLock {
    /// Creates a new lock with no readers and no writer.
    #[cfg(not(any(loom, shuttle)))]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Creates a new lock with no readers and no writer.
    #[cfg(any(loom, shuttle))]
    #[must_use]
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    fn snapshot(&self) -> Packed {
        Packed(self.word.load(Ordering::Relaxed))
    }

    /// Returns `true` if any reader is present or the writer flag is set.
    ///
    /// Diagnostic only; the answer may be stale the instant it returns.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.word.load(Ordering::Relaxed) != 0
    }

    /// Returns `true` if the writer flag is set. Diagnostic only.
    #[must_use]
    pub fn is_write_locked(&self) -> bool {
        self.snapshot().write_locked()
    }

    /// Returns the current reader count. Diagnostic only.
    #[must_use]
    pub fn reader_count(&self) -> u32 {
        self.snapshot().readers()
    }

    /// Acquires a read reference by incrementing the reader count.
    ///
    /// Whole-word fetch-add with acquire ordering. Always succeeds and
    /// does not inspect the writer flag. The 31-bit count has no overflow
    /// check; more than 2^31 - 1 simultaneous readers is undefined.
    pub fn read_acquire(&self) {
        #[cfg(baryon_lock_debug)]
        assert!(
            self.reader_count() < Packed::READERS,
            "RawRwLock reader count at the 31-bit limit"
        );

        self.word.fetch_add(1, Ordering::Acquire);
    }

    /// Drops a read reference by decrementing the reader count.
    ///
    /// Whole-word fetch-sub with release ordering.
    ///
    /// # Safety
    ///
    /// Must pair 1:1 with a prior [`read_acquire`](Self::read_acquire) by
    /// the same logical reader. An unmatched release corrupts the count,
    /// borrowing from the writer bit.
    pub unsafe fn read_release(&self) {
        #[cfg(baryon_lock_debug)]
        assert!(
            self.reader_count() > 0,
            "read_release of a RawRwLock with no readers"
        );

        self.word.fetch_sub(1, Ordering::Release);
    }

    /// Attempts to claim the writer flag with a single compare-and-swap.
    ///
    /// The expected value is the current word with bit 31 forced clear;
    /// the swapped-in value is the same word with bit 31 set, so the
    /// reader count captured at the compare passes through untouched.
    /// Acquire ordering on success.
    ///
    /// Fails if another writer holds the flag. The reader count is not
    /// required to be zero. A reader incrementing between the snapshot and
    /// the compare also fails the attempt; callers treat that like any
    /// other failed try.
    #[must_use]
    pub fn write_try_acquire(&self) -> bool {
        let clean = self.word.load(Ordering::Relaxed) & !Packed::WRITER;
        self.word
            .compare_exchange(
                clean,
                clean | Packed::WRITER,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Clears the writer flag.
    ///
    /// Issues a full fence, then atomically clears bit 31 with release
    /// ordering, leaving the reader count untouched. The fence makes every
    /// write performed under the write lock visible before the flag can be
    /// observed clear.
    ///
    /// # Safety
    ///
    /// The caller must be the current write holder.
    pub unsafe fn write_release(&self) {
        #[cfg(baryon_lock_debug)]
        assert!(
            self.is_write_locked(),
            "write_release of a RawRwLock with no writer"
        );

        fence(Ordering::SeqCst);
        self.word.fetch_and(!Packed::WRITER, Ordering::Release);
    }
}

impl Default for RawRwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RawRwLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("RawRwLock")
            .field("readers", &state.readers())
            .field("write_locked", &state.write_locked())
            .finish()
    }
}

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests {
    use super::*;

    #[test]
    fn starts_unlocked() {
        let lock = RawRwLock::new();
        assert!(!lock.is_locked());
        assert!(!lock.is_write_locked());
        assert_eq!(lock.reader_count(), 0);
    }

    #[test]
    fn readers_count_in_and_out() {
        let lock = RawRwLock::new();
        lock.read_acquire();
        lock.read_acquire();
        lock.read_acquire();
        assert_eq!(lock.reader_count(), 3);
        assert!(lock.is_locked());
        assert!(!lock.is_write_locked());

        unsafe {
            lock.read_release();
            lock.read_release();
            lock.read_release();
        }
        assert_eq!(lock.reader_count(), 0);
        assert!(!lock.is_locked());
    }

    #[test]
    fn second_writer_is_rejected() {
        // write, write again, release, write.
        let lock = RawRwLock::new();
        assert!(lock.write_try_acquire());
        assert!(!lock.write_try_acquire());
        unsafe { lock.write_release() };
        assert!(lock.write_try_acquire());
    }

    #[test]
    fn writer_claims_flag_over_readers() {
        // Readers present, writer claims, readers drain, writer releases.
        let lock = RawRwLock::new();
        lock.read_acquire();
        lock.read_acquire();
        lock.read_acquire();
        assert_eq!(lock.reader_count(), 3);

        assert!(lock.write_try_acquire());
        assert!(lock.is_write_locked());
        assert_eq!(lock.reader_count(), 3);

        unsafe {
            lock.read_release();
            lock.read_release();
            lock.read_release();
        }
        assert_eq!(lock.reader_count(), 0);
        assert!(lock.is_write_locked());

        unsafe { lock.write_release() };
        assert!(!lock.is_write_locked());
        assert!(!lock.is_locked());
    }

    #[test]
    fn writer_flag_does_not_disturb_reader_bits() {
        let lock = RawRwLock::new();
        for _ in 0..5 {
            lock.read_acquire();
        }
        assert_eq!(lock.reader_count(), 5);

        assert!(lock.write_try_acquire());
        assert_eq!(lock.reader_count(), 5);

        unsafe { lock.write_release() };
        assert_eq!(lock.reader_count(), 5);
        assert!(!lock.is_write_locked());

        for _ in 0..5 {
            unsafe { lock.read_release() };
        }
        assert_eq!(lock.reader_count(), 0);
    }

    #[test]
    fn read_acquire_ignores_writer_flag() {
        let lock = RawRwLock::new();
        assert!(lock.write_try_acquire());

        lock.read_acquire();
        assert_eq!(lock.reader_count(), 1);
        assert!(lock.is_write_locked());

        unsafe {
            lock.read_release();
            lock.write_release();
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn observation_is_idempotent() {
        let lock = RawRwLock::new();
        lock.read_acquire();
        for _ in 0..100 {
            assert!(lock.is_locked());
            assert!(!lock.is_write_locked());
            assert_eq!(lock.reader_count(), 1);
        }
        // Observations changed nothing.
        assert!(lock.write_try_acquire());
        unsafe {
            lock.write_release();
            lock.read_release();
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn default_is_unlocked() {
        let lock = RawRwLock::default();
        assert!(!lock.is_locked());
    }

    #[test]
    fn debug_renders_both_fields() {
        let lock = RawRwLock::new();
        lock.read_acquire();
        assert_eq!(
            format!("{lock:?}"),
            "RawRwLock { readers: 1, write_locked: false }"
        );
        unsafe { lock.read_release() };
    }

    #[test]
    fn reader_round_trip_across_threads() {
        let lock = RawRwLock::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        lock.read_acquire();
                        unsafe { lock.read_release() };
                    }
                });
            }
        });
        assert_eq!(lock.reader_count(), 0);
        assert!(!lock.is_locked());
    }

    #[test]
    fn held_writer_rejects_all_contenders() {
        let lock = RawRwLock::new();
        assert!(lock.write_try_acquire());

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        assert!(!lock.write_try_acquire());
                    }
                });
            }
        });

        unsafe { lock.write_release() };
        assert!(lock.write_try_acquire());
    }

    #[test]
    fn racing_writers_never_overlap() {
        use std::sync::atomic::{AtomicU32, Ordering as StdOrdering};

        let lock = RawRwLock::new();
        let occupancy = AtomicU32::new(0);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        while !lock.write_try_acquire() {
                            std::hint::spin_loop();
                        }
                        let prev = occupancy.fetch_add(1, StdOrdering::SeqCst);
                        assert_eq!(prev, 0, "two writers inside the critical section");
                        occupancy.fetch_sub(1, StdOrdering::SeqCst);
                        unsafe { lock.write_release() };
                    }
                });
            }
        });
        assert!(!lock.is_write_locked());
    }
}
