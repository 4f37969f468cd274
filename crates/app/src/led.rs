//! LED active object.
//!
//! LEDs own neither a queue nor a scheduling context. Their messages travel
//! on the sender's queue and run inside the sender's dispatch loop. The pin
//! to drive is kept in the actor's data buffer.

use std::sync::Arc;

use ao::{ActorOptions, ActorRef, AoResult, Behavior, Message, Runtime};
use log::{info, warn};

use crate::board::{Gpio, Pin};

/// Command carried by an LED message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedCommand {
    Off = 0,
    On = 1,
}

impl TryFrom<u8> for LedCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(other),
        }
    }
}

struct LedActor {
    gpio: Arc<dyn Gpio>,
}

impl Behavior for LedActor {
    fn on_event(&self, rt: &Runtime, msg: Message) {
        let pin = rt
            .data(Some(msg.receiver()))
            .and_then(|data| Pin::from_bytes(&data));
        let command = msg.payload().first().copied().map(LedCommand::try_from);

        match (pin, command) {
            (Some(pin), Some(Ok(LedCommand::On))) => {
                info!("Turning on AO led [{pin}]");
                self.gpio.write_pin(pin, true);
            }
            (Some(pin), Some(Ok(LedCommand::Off))) => {
                info!("Turning off AO led [{pin}]");
                self.gpio.write_pin(pin, false);
            }
            (None, _) => warn!("led {} has no pin configured", msg.receiver()),
            (_, command) => warn!("unknown led command {command:?}"),
        }

        rt.free_via_sender(msg);
    }
}

/// Creates a queueless, contextless LED actor driving `pin`.
pub fn create_led(rt: &Runtime, gpio: Arc<dyn Gpio>, pin: Pin) -> AoResult<ActorRef> {
    rt.create(
        &pin.to_bytes(),
        LedActor { gpio },
        ActorOptions::QUEUELESS | ActorOptions::CONTEXTLESS,
    )
}
