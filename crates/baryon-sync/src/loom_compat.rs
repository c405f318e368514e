//! Loom / shuttle compatibility shim.
//!
//! When compiled with `cfg(loom)` or `cfg(shuttle)`, re-exports the model
//! checker's atomic types. Otherwise, re-exports `core::sync::atomic`.
//!
//! This allows the lock primitives to be tested under a deterministic or
//! randomized scheduler without code changes.

// ---------------------------------------------------------------------------
// Loom mode
// ---------------------------------------------------------------------------

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU32, Ordering, fence};

// ---------------------------------------------------------------------------
// Shuttle mode
// ---------------------------------------------------------------------------

#[cfg(shuttle)]
pub(crate) use shuttle::sync::atomic::{AtomicU32, Ordering};

/// Shuttle executes under sequential consistency; fences order nothing
/// beyond what the atomics already guarantee there.
#[cfg(shuttle)]
pub(crate) fn fence(_order: Ordering) {}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

#[cfg(not(any(loom, shuttle)))]
pub(crate) use core::sync::atomic::{AtomicU32, Ordering, fence};
