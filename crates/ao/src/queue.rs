//! Bounded FIFO mailbox.
//!
//! Posting never blocks: a full queue hands the message back. Receiving
//! blocks until a message arrives or the queue is closed, which is how a
//! dispatch loop learns that its actor was destroyed.

use std::collections::VecDeque;

use crate::message::Message;
use crate::sync::{Condvar, Mutex};

struct QueueInner {
    messages: VecDeque<Message>,
    capacity: usize,
    closed: bool,
}

/// Bounded message queue owned by one actor.
pub struct MessageQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
}

impl MessageQueue {
    /// Creates an empty queue holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                messages: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Appends a message without blocking.
    ///
    /// Returns the message back when the queue is full or closed.
    pub fn try_post(&self, msg: Message) -> Result<(), Message> {
        let mut inner = self.inner.lock();
        if inner.closed || inner.messages.len() >= inner.capacity {
            return Err(msg);
        }
        inner.messages.push_back(msg);
        drop(inner);
        self.ready.notify_one();
        Ok(())
    }

    /// Takes the oldest message without blocking.
    pub fn try_get(&self) -> Option<Message> {
        self.inner.lock().messages.pop_front()
    }

    /// Takes the oldest message, waiting for one to arrive.
    ///
    /// Returns `None` once the queue has been closed.
    pub fn get(&self) -> Option<Message> {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return None;
            }
            if let Some(msg) = inner.messages.pop_front() {
                return Some(msg);
            }
            self.ready.wait(&mut inner);
        }
    }

    /// Closes the queue and wakes any waiting receiver.
    ///
    /// Messages still queued are handed back undelivered.
    pub fn close(&self) -> Vec<Message> {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let pending = inner.messages.drain(..).collect();
        drop(inner);
        self.ready.notify_all();
        pending
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock();
        inner.messages.len() >= inner.capacity
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
