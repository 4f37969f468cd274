//! Message envelope and allocation accounting.
//!
//! A [`Message`] is allocated by [`Runtime::send`](crate::Runtime::send),
//! owned by exactly one queue, then by the dispatch loop that dequeued it,
//! and finally consumed by a free handler. Every step moves the value, so a
//! released message cannot be touched again.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use heapless::Vec;
use log::trace;

use crate::actor::ActorRef;
use crate::error::{AoError, AoResult};
use crate::sync::Arc;
use crate::MAX_MSG_SIZE;

struct Envelope {
    sender: Option<ActorRef>,
    receiver: ActorRef,
    payload: Vec<u8, MAX_MSG_SIZE>,
}

/// Heap-allocated message travelling between actors.
pub struct Message {
    envelope: Box<Envelope>,
    stats: Arc<MessageStats>,
}

impl Message {
    pub(crate) fn new(
        sender: Option<ActorRef>,
        receiver: ActorRef,
        payload: &[u8],
        stats: &Arc<MessageStats>,
    ) -> AoResult<Self> {
        if payload.is_empty() {
            return Err(AoError::InvalidArgument);
        }
        let payload = Vec::from_slice(payload).map_err(|_| AoError::SizeExceeded)?;
        stats.on_alloc();
        Ok(Self {
            envelope: Box::new(Envelope {
                sender,
                receiver,
                payload,
            }),
            stats: Arc::clone(stats),
        })
    }

    /// Actor that produced the message, if any.
    pub fn sender(&self) -> Option<&ActorRef> {
        self.envelope.sender.as_ref()
    }

    /// Actor whose handler runs for this message.
    pub fn receiver(&self) -> &ActorRef {
        &self.envelope.receiver
    }

    /// Payload bytes, exactly as passed to `send`.
    pub fn payload(&self) -> &[u8] {
        &self.envelope.payload
    }

    pub fn len(&self) -> u8 {
        self.envelope.payload.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.envelope.payload.is_empty()
    }

    pub(crate) fn discard(self) {
        self.stats.on_discard();
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        self.stats.on_release();
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("sender", &self.envelope.sender)
            .field("receiver", &self.envelope.receiver)
            .field("payload", &self.payload())
            .finish()
    }
}

/// Releases a message's backing allocation.
///
/// This is the stock free handler; [`Behavior::on_free`](crate::Behavior::on_free)
/// uses it unless an actor overrides it.
pub fn generic_free(msg: Message) {
    trace!("free message for {}", msg.receiver());
    drop(msg);
}

/// Message allocation counters for one runtime.
#[derive(Debug, Default)]
pub struct MessageStats {
    allocated: AtomicUsize,
    released: AtomicUsize,
    discarded: AtomicUsize,
}

impl MessageStats {
    /// Messages created by `send`.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    /// Messages whose allocation has been returned.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }

    /// Messages dropped undelivered because their queue was destroyed.
    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Acquire)
    }

    /// Messages still held by a queue or a handler.
    pub fn outstanding(&self) -> usize {
        self.allocated().saturating_sub(self.released())
    }

    fn on_alloc(&self) {
        self.allocated.fetch_add(1, Ordering::AcqRel);
    }

    fn on_release(&self) {
        self.released.fetch_add(1, Ordering::AcqRel);
    }

    fn on_discard(&self) {
        self.discarded.fetch_add(1, Ordering::AcqRel);
    }
}
