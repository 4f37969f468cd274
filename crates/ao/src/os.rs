//! OS-level resources backing an actor: queues and scheduling contexts.
//!
//! Both are drawn from a fixed budget so that creation can fail the way it
//! does on a target with a small kernel heap. A scheduling context is a
//! named thread running the dispatch loop of one queue.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use log::{debug, warn};

use crate::config::RuntimeConfig;
use crate::error::{AoError, AoResult};
use crate::message::Message;
use crate::queue::MessageQueue;
use crate::sync::Arc;

/// Handle to a running scheduling context.
///
/// Deleting the handle detaches the thread; the thread itself leaves its
/// dispatch loop once its queue is closed.
pub struct Context {
    name: String,
    handle: thread::JoinHandle<()>,
}

impl Context {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Budgeted factory for queues and scheduling contexts.
pub struct OsResources {
    queue_capacity: usize,
    stack_size: usize,
    max_queues: usize,
    max_contexts: usize,
    queues: AtomicUsize,
    contexts: AtomicUsize,
}

impl OsResources {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            stack_size: config.stack_size,
            max_queues: config.max_queues,
            max_contexts: config.max_contexts,
            queues: AtomicUsize::new(0),
            contexts: AtomicUsize::new(0),
        }
    }

    /// Queues currently alive.
    pub fn live_queues(&self) -> usize {
        self.queues.load(Ordering::Acquire)
    }

    /// Scheduling contexts currently alive.
    pub fn live_contexts(&self) -> usize {
        self.contexts.load(Ordering::Acquire)
    }

    pub(crate) fn create_queue(&self) -> AoResult<Arc<MessageQueue>> {
        reserve(&self.queues, self.max_queues)?;
        Ok(Arc::new(MessageQueue::new(self.queue_capacity)))
    }

    pub(crate) fn delete_queue(&self, queue: Arc<MessageQueue>) -> Vec<Message> {
        self.queues.fetch_sub(1, Ordering::AcqRel);
        queue.close()
    }

    pub(crate) fn create_context<F>(&self, name: String, entry: F) -> AoResult<Context>
    where
        F: FnOnce() + Send + 'static,
    {
        reserve(&self.contexts, self.max_contexts)?;
        let spawned = thread::Builder::new()
            .name(name.clone())
            .stack_size(self.stack_size)
            .spawn(entry);
        match spawned {
            Ok(handle) => {
                debug!("context {name} started");
                Ok(Context { name, handle })
            }
            Err(err) => {
                self.contexts.fetch_sub(1, Ordering::AcqRel);
                warn!("context {name} could not be spawned: {err}");
                Err(AoError::OsResourceError)
            }
        }
    }

    pub(crate) fn delete_context(&self, context: Context) {
        self.contexts.fetch_sub(1, Ordering::AcqRel);
        debug!("context {} deleted", context.name);
    }
}

fn reserve(counter: &AtomicUsize, limit: usize) -> AoResult<()> {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
            (live < limit).then_some(live + 1)
        })
        .map(|_| ())
        .map_err(|_| AoError::OsResourceError)
}
