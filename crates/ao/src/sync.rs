//! Synchronization primitives used inside the runtime.
//!
//! Locks come from `parking_lot` and never poison; a panicking handler
//! leaves the pool usable for the remaining scheduling contexts.

pub use parking_lot::{Condvar, Mutex};
pub use std::sync::Arc;
