//! # ao
//!
//! A minimal active object (AO) runtime for resource-constrained targets.
//!
//! A fixed pool of [`MAX_OBJECTS`] actors communicates exclusively through
//! small, copied, heap-allocated [`Message`]s. Each actor optionally owns a
//! bounded event queue and a dedicated scheduling context that runs a
//! dispatch loop over that queue. Queueless actors borrow the mailbox of
//! whichever actor sends to them and execute inside the sender's dispatch
//! loop.
//!
//! ## Module Overview
//! - [`config`]  – Runtime sizing and OS resource budget.
//! - [`error`]   – Error kinds returned by every fallible operation.
//! - [`actor`]   – Actor references, creation options and the behavior trait.
//! - [`message`] – Message envelope, ownership token and allocation statistics.
//! - [`queue`]   – Bounded FIFO mailbox with a blocking receive.
//! - [`os`]      – Queue and scheduling-context resources.
//! - [`lock`]    – Binary exclusion lock shared across scheduling contexts.
//! - [`runtime`] – Actor pool, send/dispatch protocol and free delegation.

pub mod actor;
pub mod config;
pub mod error;
pub mod lock;
pub mod message;
pub mod os;
pub mod queue;
pub mod runtime;
mod sync;

pub use actor::{ActorOptions, ActorRef, Behavior};
pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use error::{AoError, AoResult};
pub use lock::{ExclusionGuard, ExclusionLock};
pub use message::{generic_free, Message, MessageStats};
pub use os::OsResources;
pub use queue::MessageQueue;
pub use runtime::{ActorData, Runtime};

/// Maximum number of actors alive at the same time.
pub const MAX_OBJECTS: usize = 4;

/// Capacity of an actor's private data buffer, in bytes.
pub const MAX_DATA_SIZE: usize = 8;

/// Maximum payload carried by a single message, in bytes.
pub const MAX_MSG_SIZE: usize = 4;

/// Default number of messages an actor queue can hold.
pub const MAX_QUEUE_MSG: usize = 3;
