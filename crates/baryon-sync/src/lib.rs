//! Raw spin lock primitives for the Baryon kernel.
//!
//! This crate contains the lowest synchronization layer: a single-word
//! test-and-set lock ([`RawSpinLock`]) and a packed-word reader-writer
//! lock ([`RawRwLock`]). Both are busy-wait primitives built directly on
//! whole-word atomic operations and explicit fences. Neither blocks,
//! enqueues, or yields: a failed acquisition is reported to the caller,
//! and any spin-retry or backoff policy lives in higher layers.
//!
//! The crate deliberately lives outside the kernel tree so the primitives
//! run under plain `cargo test`, loom, shuttle, and miri on the host, with
//! no kernel target involved.
//!
//! ## Debug assertions
//!
//! Building with `RUSTFLAGS="--cfg baryon_lock_debug"` compiles in
//! word-inspection assertions that catch release of an unheld lock and
//! unmatched read releases. The production build is entirely unchecked.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub(crate) mod loom_compat;

mod rwlock;
mod spinlock;

pub use rwlock::RawRwLock;
pub use spinlock::RawSpinLock;
