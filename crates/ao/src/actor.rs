//! Actor identity, creation options and behavior.

use core::fmt;
use core::ops::BitOr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::message::{generic_free, Message};
use crate::runtime::Runtime;

/// Opaque reference to an actor in the pool.
///
/// A reference names a slot *and* the generation of the actor that occupied
/// it when the reference was handed out. Once the actor is destroyed the
/// slot's generation moves on and every older reference stops resolving,
/// even after the slot is reused.
///
/// The type is deliberately not `Copy`: [`Runtime::destroy`] takes a
/// reference by value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorRef {
    index: u8,
    generation: u32,
}

impl ActorRef {
    pub(crate) const fn new(index: u8, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the pool.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ao#{}.{}", self.index, self.generation)
    }
}

/// Flags controlling which OS resources an actor gets.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorOptions(u8);

impl ActorOptions {
    /// Queue and scheduling context are both created.
    pub const NONE: Self = Self(0);
    /// No private queue; the actor is only reachable through a sender's queue.
    pub const QUEUELESS: Self = Self(1 << 0);
    /// No private scheduling context; the queue is drained by the caller.
    pub const CONTEXTLESS: Self = Self(1 << 1);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn wants_queue(self) -> bool {
        !self.contains(Self::QUEUELESS)
    }

    pub const fn wants_context(self) -> bool {
        !self.contains(Self::CONTEXTLESS)
    }
}

impl BitOr for ActorOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Behavior attached to an actor at creation time.
///
/// The runtime calls [`on_event`](Behavior::on_event) from the dispatch loop
/// that dequeued the message. That loop belongs to the receiver when it has
/// its own queue, and to the sender otherwise.
pub trait Behavior: Send + Sync + 'static {
    /// Handles one message addressed to this actor.
    ///
    /// The handler owns `msg` and is expected to close its lifecycle, usually
    /// with [`Runtime::free_via_sender`].
    fn on_event(&self, rt: &Runtime, msg: Message);

    /// Releases a message this actor sent.
    ///
    /// Invoked through [`Runtime::free_via_sender`] by whichever handler
    /// consumed the message.
    fn on_free(&self, msg: Message) {
        generic_free(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_combine() {
        let options = ActorOptions::QUEUELESS | ActorOptions::CONTEXTLESS;
        assert!(!options.wants_queue());
        assert!(!options.wants_context());

        let contextless = ActorOptions::CONTEXTLESS;
        assert!(contextless.wants_queue());
        assert!(!contextless.wants_context());

        assert!(ActorOptions::NONE.wants_queue());
        assert!(ActorOptions::NONE.wants_context());
    }

    #[test]
    fn references_compare_generation() {
        assert_eq!(ActorRef::new(1, 0), ActorRef::new(1, 0));
        assert_ne!(ActorRef::new(1, 0), ActorRef::new(1, 1));
        assert_eq!(ActorRef::new(2, 7).to_string(), "ao#2.7");
    }
}
