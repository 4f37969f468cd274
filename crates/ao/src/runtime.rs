//! Actor pool and message send/dispatch protocol.
//!
//! The pool is a fixed array of [`MAX_OBJECTS`] slots guarded by a single
//! mutex. The mutex is only held for bookkeeping; handlers always run with
//! it released so that they can send, create and destroy freely, including
//! destroying the very actor whose handler is running.

use core::fmt;

use log::{debug, trace, warn};

use crate::actor::{ActorOptions, ActorRef, Behavior};
use crate::config::RuntimeConfig;
use crate::error::{AoError, AoResult};
use crate::message::{Message, MessageStats};
use crate::os::{Context, OsResources};
use crate::queue::MessageQueue;
use crate::sync::{Arc, Mutex};
use crate::{MAX_DATA_SIZE, MAX_OBJECTS};

/// Private configuration bytes stored with an actor.
pub type ActorData = heapless::Vec<u8, MAX_DATA_SIZE>;

#[derive(Default)]
struct Slot {
    in_use: bool,
    generation: u32,
    queue: Option<Arc<MessageQueue>>,
    context: Option<Context>,
    behavior: Option<Arc<dyn Behavior>>,
    data: ActorData,
}

struct Pool {
    slots: [Slot; MAX_OBJECTS],
}

impl Pool {
    fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot::default()),
        }
    }

    fn get(&self, actor: &ActorRef) -> Option<&Slot> {
        self.slots
            .get(actor.index())
            .filter(|slot| slot.in_use && slot.generation == actor.generation())
    }

    fn get_mut(&mut self, actor: &ActorRef) -> Option<&mut Slot> {
        self.slots
            .get_mut(actor.index())
            .filter(|slot| slot.in_use && slot.generation == actor.generation())
    }

    fn behavior(&self, actor: &ActorRef) -> Option<Arc<dyn Behavior>> {
        self.get(actor).and_then(|slot| slot.behavior.clone())
    }
}

struct Shared {
    config: RuntimeConfig,
    pool: Mutex<Pool>,
    os: OsResources,
    stats: Arc<MessageStats>,
}

/// Handle to the AO runtime.
///
/// Cloning is cheap and every clone refers to the same pool. Scheduling
/// contexts keep a clone for the lifetime of their dispatch loop.
#[derive(Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

impl Runtime {
    /// Initializes an empty actor pool.
    ///
    /// Called once at boot, before any scheduling context starts.
    pub fn new(config: RuntimeConfig) -> Self {
        let os = OsResources::new(&config);
        Self {
            shared: Arc::new(Shared {
                config,
                pool: Mutex::new(Pool::new()),
                os,
                stats: Arc::new(MessageStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// Message allocation counters.
    pub fn stats(&self) -> &MessageStats {
        &self.shared.stats
    }

    /// Queue and scheduling-context counters.
    pub fn resources(&self) -> &OsResources {
        &self.shared.os
    }

    /// Number of slots currently in use.
    pub fn live_actors(&self) -> usize {
        let pool = self.shared.pool.lock();
        pool.slots.iter().filter(|slot| slot.in_use).count()
    }

    /// Returns true while `actor` still names a live actor.
    pub fn is_alive(&self, actor: &ActorRef) -> bool {
        self.shared.pool.lock().get(actor).is_some()
    }

    pub fn has_queue(&self, actor: &ActorRef) -> bool {
        let pool = self.shared.pool.lock();
        pool.get(actor).is_some_and(|slot| slot.queue.is_some())
    }

    pub fn has_context(&self, actor: &ActorRef) -> bool {
        let pool = self.shared.pool.lock();
        pool.get(actor).is_some_and(|slot| slot.context.is_some())
    }

    /// Allocates an actor from the pool.
    ///
    /// `data` is copied into the actor's private buffer. A queue is created
    /// unless [`ActorOptions::QUEUELESS`] is set, and a scheduling context
    /// running the dispatch loop unless [`ActorOptions::CONTEXTLESS`] is set.
    /// If the context cannot be created the queue is deleted again, so a
    /// failed call never leaves a partial actor behind.
    pub fn create<B: Behavior>(
        &self,
        data: &[u8],
        behavior: B,
        options: ActorOptions,
    ) -> AoResult<ActorRef> {
        if !options.wants_queue() && options.wants_context() {
            return Err(AoError::InvalidArgument);
        }

        let mut pool = self.shared.pool.lock();
        let index = pool
            .slots
            .iter()
            .position(|slot| !slot.in_use)
            .ok_or(AoError::NoCapacity)?;
        let data = ActorData::from_slice(data).map_err(|_| AoError::SizeExceeded)?;
        let actor = ActorRef::new(index as u8, pool.slots[index].generation);

        let queue = if options.wants_queue() {
            Some(self.shared.os.create_queue()?)
        } else {
            None
        };

        let context = if options.wants_context() {
            let dispatch_queue = queue.clone().ok_or(AoError::InvalidArgument)?;
            match self.spawn_dispatch(index, dispatch_queue) {
                Ok(context) => Some(context),
                Err(err) => {
                    if let Some(queue) = queue {
                        self.shared.os.delete_queue(queue);
                    }
                    debug!("rolled back queue of slot {index}: {err}");
                    return Err(err);
                }
            }
        } else {
            None
        };

        let slot = &mut pool.slots[index];
        slot.queue = queue;
        slot.context = context;
        slot.behavior = Some(Arc::new(behavior));
        slot.data = data;
        slot.in_use = true;
        debug!("created {actor} ({options:?})");
        Ok(actor)
    }

    /// Returns an actor's resources to the pool.
    ///
    /// Deletes the queue and the scheduling context, clears the data buffer
    /// and frees the slot. May be called from the actor's own handler, as
    /// the last thing that handler does: the running dispatch loop finishes
    /// the current message and then exits without touching the slot again.
    ///
    /// Messages still waiting in the deleted queue are never delivered and
    /// never reach a free handler; they are counted as discarded. Their
    /// allocation is still returned, so a destroyed queue leaks no memory
    /// and [`MessageStats::outstanding`] drops back accordingly.
    pub fn destroy(&self, actor: ActorRef) {
        let (queue, context, behavior) = {
            let mut pool = self.shared.pool.lock();
            let Some(slot) = pool.get_mut(&actor) else {
                warn!("destroy of stale actor {actor} ignored");
                return;
            };
            slot.in_use = false;
            slot.generation = slot.generation.wrapping_add(1);
            slot.data = ActorData::new();
            (slot.queue.take(), slot.context.take(), slot.behavior.take())
        };

        if let Some(queue) = queue {
            let pending = self.shared.os.delete_queue(queue);
            if !pending.is_empty() {
                warn!(
                    "{actor} destroyed with {} undelivered message(s)",
                    pending.len()
                );
            }
            pending.into_iter().for_each(Message::discard);
        }
        if let Some(context) = context {
            self.shared.os.delete_context(context);
        }
        drop(behavior);
        debug!("destroyed {actor}");
    }

    /// Destroys every live actor.
    pub fn shutdown(&self) {
        let live: Vec<ActorRef> = {
            let pool = self.shared.pool.lock();
            pool.slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.in_use)
                .map(|(index, slot)| ActorRef::new(index as u8, slot.generation))
                .collect()
        };
        live.into_iter().for_each(|actor| self.destroy(actor));
    }

    /// Copy of an actor's private data.
    ///
    /// `None` for a missing or stale reference, or when the actor was created
    /// without data.
    pub fn data(&self, actor: Option<&ActorRef>) -> Option<ActorData> {
        let actor = actor?;
        let pool = self.shared.pool.lock();
        pool.get(actor)
            .filter(|slot| !slot.data.is_empty())
            .map(|slot| slot.data.clone())
    }

    /// Length of an actor's private data, `0` for a missing or stale reference.
    pub fn data_len(&self, actor: Option<&ActorRef>) -> u8 {
        let Some(actor) = actor else {
            return 0;
        };
        let pool = self.shared.pool.lock();
        pool.get(actor).map_or(0, |slot| slot.data.len() as u8)
    }

    /// Sends a copy of `payload` to `receiver`.
    ///
    /// The message goes to the receiver's own queue, or to the sender's queue
    /// when the receiver is queueless. Never blocks: a full queue fails with
    /// [`AoError::OsResourceError`]. Success means the message is queued, not
    /// that it has been handled.
    pub fn send(
        &self,
        receiver: Option<&ActorRef>,
        sender: Option<&ActorRef>,
        payload: &[u8],
    ) -> AoResult<()> {
        let receiver = receiver.ok_or(AoError::InvalidReceiver)?;
        let queue = {
            let pool = self.shared.pool.lock();
            let target = pool.get(receiver).ok_or(AoError::InvalidReceiver)?;
            match &target.queue {
                Some(queue) => Arc::clone(queue),
                None => sender
                    .and_then(|sender| pool.get(sender))
                    .and_then(|slot| slot.queue.clone())
                    .ok_or(AoError::NoMailbox)?,
            }
        };

        let msg = Message::new(sender.cloned(), receiver.clone(), payload, &self.shared.stats)?;
        queue.try_post(msg).map_err(|msg| {
            debug!("queue full, message for {} dropped", msg.receiver());
            AoError::OsResourceError
        })?;
        trace!("queued {} byte(s) for {receiver}", payload.len());
        Ok(())
    }

    /// Delivers the oldest message in `owner`'s queue, if any.
    ///
    /// Drives actors created with a queue but [`ActorOptions::CONTEXTLESS`];
    /// actors with their own scheduling context are drained by it instead.
    pub fn dispatch_one(&self, owner: &ActorRef) -> AoResult<bool> {
        let queue = {
            let pool = self.shared.pool.lock();
            let slot = pool.get(owner).ok_or(AoError::InvalidReceiver)?;
            slot.queue.clone().ok_or(AoError::NoMailbox)?
        };
        match queue.try_get() {
            Some(msg) => {
                self.deliver(msg);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dispatches until `owner`'s queue is empty or `owner` is destroyed.
    ///
    /// Returns the number of messages delivered.
    pub fn run_until_idle(&self, owner: &ActorRef) -> usize {
        let mut delivered = 0;
        while let Ok(true) = self.dispatch_one(owner) {
            delivered += 1;
        }
        delivered
    }

    /// Hands a consumed message to the free handler of its sender.
    ///
    /// Without a live sender the message is simply dropped.
    pub fn free_via_sender(&self, msg: Message) {
        let behavior = msg
            .sender()
            .and_then(|sender| self.shared.pool.lock().behavior(sender));
        match behavior {
            Some(behavior) => behavior.on_free(msg),
            None => trace!("no free handler for message to {}", msg.receiver()),
        }
    }

    fn deliver(&self, msg: Message) {
        let behavior = self.shared.pool.lock().behavior(msg.receiver());
        match behavior {
            Some(behavior) => {
                trace!("dispatch to {}", msg.receiver());
                behavior.on_event(self, msg);
            }
            None => warn!("message for stale receiver {} dropped", msg.receiver()),
        }
    }

    fn spawn_dispatch(&self, index: usize, queue: Arc<MessageQueue>) -> AoResult<Context> {
        let name = format!("{}_task{}", self.shared.config.name, index);
        let runtime = self.clone();
        self.shared.os.create_context(name, move || {
            while let Some(msg) = queue.get() {
                runtime.deliver(msg);
            }
            trace!("dispatch loop of slot {index} finished");
        })
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("name", &self.shared.config.name)
            .field("live_actors", &self.live_actors())
            .field("live_queues", &self.shared.os.live_queues())
            .field("live_contexts", &self.shared.os.live_contexts())
            .finish()
    }
}
