//! User interface active object.
//!
//! The UI actor owns the three LED actors and maps press classifications to
//! the LED that should be lit. LED messages are queued on the UI actor's own
//! queue, so they run in its dispatch loop in strict order with everything
//! else the UI sends to itself.
//!
//! When the button producer reports a long idle period the UI tears itself
//! down to give the queues and scheduling contexts back:
//!
//! 1. `Idle` takes the [`ExclusionLock`], turns off the lit LED and queues a
//!    `Destroy` event to itself, behind the LED-off message.
//! 2. `Destroy` destroys the LED actors, records [`UiState::Idle`], destroys
//!    the UI actor and finally releases the lock.
//!
//! While the lock is held the button producer cannot run a polling cycle,
//! so it never observes a half torn-down UI.

use std::mem;
use std::sync::Arc;

use ao::{
    generic_free, ActorOptions, ActorRef, AoResult, Behavior, ExclusionLock, Message, Runtime,
};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::board::{BoardPins, Gpio};
use crate::led::{create_led, LedCommand};

/// Events understood by the UI actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UiEvent {
    Pulse = 1,
    Short = 2,
    Long = 3,
    /// No activity for the configured idle period.
    Idle = 4,
    /// Sent by the UI to itself to finish a teardown.
    Destroy = 5,
}

impl TryFrom<u8> for UiEvent {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pulse),
            2 => Ok(Self::Short),
            3 => Ok(Self::Long),
            4 => Ok(Self::Idle),
            5 => Ok(Self::Destroy),
            other => Err(other),
        }
    }
}

/// State of the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    /// UI and LED actors do not exist.
    #[default]
    Idle,
    /// Actors exist, no LED lit.
    Ready,
    RedOn,
    GreenOn,
    BlueOn,
}

impl UiState {
    fn for_press(event: UiEvent) -> Option<Self> {
        match event {
            UiEvent::Pulse => Some(Self::RedOn),
            UiEvent::Short => Some(Self::GreenOn),
            UiEvent::Long => Some(Self::BlueOn),
            UiEvent::Idle | UiEvent::Destroy => None,
        }
    }
}

#[derive(Debug)]
struct Leds {
    red: ActorRef,
    green: ActorRef,
    blue: ActorRef,
}

impl Leds {
    fn for_state(&self, state: UiState) -> Option<&ActorRef> {
        match state {
            UiState::RedOn => Some(&self.red),
            UiState::GreenOn => Some(&self.green),
            UiState::BlueOn => Some(&self.blue),
            UiState::Idle | UiState::Ready => None,
        }
    }

    fn into_array(self) -> [ActorRef; 3] {
        [self.red, self.green, self.blue]
    }
}

#[derive(Debug, Default)]
struct UiInner {
    state: UiState,
    teardown_pending: bool,
    actor: Option<ActorRef>,
    leds: Option<Leds>,
}

struct UiCore {
    inner: Mutex<UiInner>,
    lock: ExclusionLock,
}

/// Handle used to create, observe and feed the UI actor.
#[derive(Clone)]
pub struct Ui {
    rt: Runtime,
    gpio: Arc<dyn Gpio>,
    pins: BoardPins,
    options: ActorOptions,
    core: Arc<UiCore>,
}

impl Ui {
    /// Prepares a UI in the [`UiState::Idle`] state; no actor is created yet.
    ///
    /// `lock` is the exclusion lock shared with the button producer. The UI
    /// actor is created with `options`; pass [`ActorOptions::CONTEXTLESS`] to
    /// drive it with [`Runtime::run_until_idle`].
    pub fn new(
        rt: Runtime,
        gpio: Arc<dyn Gpio>,
        pins: BoardPins,
        lock: ExclusionLock,
        options: ActorOptions,
    ) -> Self {
        Self {
            rt,
            gpio,
            pins,
            options,
            core: Arc::new(UiCore {
                inner: Mutex::new(UiInner::default()),
                lock,
            }),
        }
    }

    /// Creates the UI actor together with its three LED actors.
    ///
    /// On success the state is [`UiState::Ready`]. If any actor cannot be
    /// created, the ones already created are destroyed again and the state
    /// stays [`UiState::Idle`]. Calling this while the UI exists returns the
    /// existing actor.
    pub fn create(&self) -> AoResult<ActorRef> {
        if let Some(actor) = self.core.inner.lock().actor.clone() {
            debug!("ui already running as {actor}");
            return Ok(actor);
        }

        let actor = self.rt.create(
            &[],
            UiActor {
                core: Arc::clone(&self.core),
            },
            self.options,
        )?;
        let leds = match self.create_leds() {
            Ok(leds) => leds,
            Err(err) => {
                self.rt.destroy(actor);
                return Err(err);
            }
        };

        let mut inner = self.core.inner.lock();
        inner.actor = Some(actor.clone());
        inner.leds = Some(leds);
        inner.teardown_pending = false;
        inner.state = UiState::Ready;
        debug!("ui ready as {actor}");
        Ok(actor)
    }

    fn create_leds(&self) -> AoResult<Leds> {
        let led = |pin| create_led(&self.rt, Arc::clone(&self.gpio), pin);

        let red = led(self.pins.led_red)?;
        let green = led(self.pins.led_green).inspect_err(|_| self.rt.destroy(red.clone()))?;
        let blue = led(self.pins.led_blue).inspect_err(|_| {
            self.rt.destroy(red.clone());
            self.rt.destroy(green.clone());
        })?;
        Ok(Leds { red, green, blue })
    }

    /// Queues `event` for the UI actor.
    ///
    /// Fails with [`ao::AoError::InvalidReceiver`] when the UI does not exist.
    pub fn post(&self, event: UiEvent) -> AoResult<()> {
        let actor = self.actor();
        self.rt.send(actor.as_ref(), None, &[event as u8])
    }

    pub fn state(&self) -> UiState {
        self.core.inner.lock().state
    }

    /// The live UI actor, if any.
    pub fn actor(&self) -> Option<ActorRef> {
        self.core.inner.lock().actor.clone()
    }

    /// True between an accepted `Idle` event and the end of teardown.
    pub fn is_tearing_down(&self) -> bool {
        self.core.inner.lock().teardown_pending
    }

    /// Forgets the UI and LED actors after the runtime destroyed them
    /// behind the UI's back, leaving the state [`UiState::Idle`].
    ///
    /// A teardown cut short this way gives the exclusion lock back.
    pub fn mark_shut_down(&self) {
        let previous = mem::take(&mut *self.core.inner.lock());
        if previous.teardown_pending {
            self.core.lock.release();
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    pub fn exclusion_lock(&self) -> &ExclusionLock {
        &self.core.lock
    }
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui")
            .field("pins", &self.pins)
            .field("options", &self.options)
            .field("inner", &*self.core.inner.lock())
            .finish()
    }
}

struct UiActor {
    core: Arc<UiCore>,
}

impl UiActor {
    fn on_press(&self, rt: &Runtime, me: &ActorRef, target: UiState, msg: Message) {
        let transition = {
            let mut inner = self.core.inner.lock();
            if inner.teardown_pending || inner.state == target {
                None
            } else {
                let previous = mem::replace(&mut inner.state, target);
                inner.leds.as_ref().map(|leds| {
                    (
                        leds.for_state(previous).cloned(),
                        leds.for_state(target).cloned(),
                    )
                })
            }
        };
        rt.free_via_sender(msg);

        let Some((off, on)) = transition else {
            debug!("ui stays {target:?}");
            return;
        };
        send_led(rt, me, off.as_ref(), LedCommand::Off);
        send_led(rt, me, on.as_ref(), LedCommand::On);
    }

    fn on_idle(&self, rt: &Runtime, me: &ActorRef, msg: Message) {
        rt.free_via_sender(msg);
        if self.core.inner.lock().teardown_pending {
            debug!("teardown already pending");
            return;
        }

        self.core.lock.acquire();
        info!("User interface idle. Start destruction");
        let lit = {
            let mut inner = self.core.inner.lock();
            inner.teardown_pending = true;
            inner
                .leds
                .as_ref()
                .and_then(|leds| leds.for_state(inner.state).cloned())
        };
        let dimmed = send_led(rt, me, lit.as_ref(), LedCommand::Off);

        if let Err(err) = rt.send(Some(me), None, &[UiEvent::Destroy as u8]) {
            warn!("ui teardown aborted: {err}");
            let mut inner = self.core.inner.lock();
            inner.teardown_pending = false;
            if dimmed {
                inner.state = UiState::Ready;
            }
            drop(inner);
            self.core.lock.release();
        }
    }

    fn on_destroy(&self, rt: &Runtime, me: ActorRef, msg: Message) {
        let leds = {
            let mut inner = self.core.inner.lock();
            if !inner.teardown_pending {
                None
            } else {
                Some(inner.leds.take())
            }
        };
        let Some(leds) = leds else {
            warn!("destroy without pending teardown ignored");
            rt.free_via_sender(msg);
            return;
        };

        for led in leds.into_iter().flat_map(Leds::into_array) {
            rt.destroy(led);
        }
        generic_free(msg);

        {
            let mut inner = self.core.inner.lock();
            inner.state = UiState::Idle;
            inner.teardown_pending = false;
            inner.actor = None;
        }
        info!("Finish destroying User Interface");

        rt.destroy(me);
        self.core.lock.release();
    }
}

impl Behavior for UiActor {
    fn on_event(&self, rt: &Runtime, msg: Message) {
        let me = msg.receiver().clone();
        let event = msg.payload().first().copied().map(UiEvent::try_from);

        match event {
            Some(Ok(UiEvent::Idle)) => self.on_idle(rt, &me, msg),
            Some(Ok(UiEvent::Destroy)) => self.on_destroy(rt, me, msg),
            Some(Ok(press)) => match UiState::for_press(press) {
                Some(target) => self.on_press(rt, &me, target, msg),
                None => rt.free_via_sender(msg),
            },
            _ => {
                info!("Unknown event for UI object");
                rt.free_via_sender(msg);
            }
        }
    }

    fn on_free(&self, msg: Message) {
        generic_free(msg);
    }
}

/// Returns true when a command was queued.
fn send_led(rt: &Runtime, ui: &ActorRef, led: Option<&ActorRef>, command: LedCommand) -> bool {
    let Some(led) = led else {
        return false;
    };
    match rt.send(Some(led), Some(ui), &[command as u8]) {
        Ok(()) => true,
        Err(err) => {
            debug!("led {command:?} for {led} not queued: {err}");
            false
        }
    }
}
