//! Nullable infrastructure for deterministic testing.
//!
//! The clock and the store sit behind traits. The implementations here return
//! deterministic values, can be steered from a test (advance time, inject
//! commit conflicts) and never touch the filesystem.

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::NullStore;
