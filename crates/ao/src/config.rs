//! Runtime configuration.
//!
//! Pool geometry is fixed at compile time (see the crate constants); the
//! values here size the per-actor OS resources and bound how many of them
//! may exist at once.

use crate::{MAX_OBJECTS, MAX_QUEUE_MSG};

/// Configuration for an AO [`Runtime`](crate::Runtime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Prefix used to name scheduling contexts.
    pub name: &'static str,
    /// Number of messages each actor queue can hold.
    pub queue_capacity: usize,
    /// Stack size, in bytes, of each scheduling context.
    pub stack_size: usize,
    /// Maximum number of queues that may exist simultaneously.
    pub max_queues: usize,
    /// Maximum number of scheduling contexts that may exist simultaneously.
    pub max_contexts: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "ao",
            queue_capacity: MAX_QUEUE_MSG,
            stack_size: 64 * 1024,
            max_queues: MAX_OBJECTS,
            max_contexts: MAX_OBJECTS,
        }
    }
}

impl RuntimeConfig {
    /// Creates a new runtime configuration builder.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }
}

/// Builder for ergonomic runtime configuration construction.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    /// Sets the name prefix for scheduling contexts.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the capacity of every actor queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Sets the stack size of every scheduling context.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = size;
        self
    }

    /// Sets the OS resource budget.
    ///
    /// # Parameters
    /// - `queues`: Queues that may exist at once
    /// - `contexts`: Scheduling contexts that may exist at once
    pub fn os_budget(mut self, queues: usize, contexts: usize) -> Self {
        self.config.max_queues = queues;
        self.config.max_contexts = contexts;
        self
    }

    /// Builds the runtime configuration.
    pub fn build(self) -> RuntimeConfig {
        self.config
    }
}
