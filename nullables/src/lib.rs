//! Nullable infrastructure for deterministic testing.
//!
//! The governance core reaches the outside world through two seams: the clock
//! and the value-transfer primitive. This crate provides implementations that
//! return deterministic values, can be steered programmatically, and never
//! touch a real system clock or move real value.
//!
//! Handles are cheap to clone and share state, so a test can keep one handle
//! while the engine owns another.

pub mod clock;
pub mod transfer;

pub use clock::NullClock;
pub use transfer::NullTransfer;
