//! Board pin map and the GPIO collaborator interface.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

/// GPIO pin identifier: port index plus pin number within the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin {
    pub port: u8,
    pub pin: u16,
}

impl Pin {
    /// Encoded size, as stored in an actor's data buffer.
    pub const ENCODED_LEN: usize = 3;

    pub const fn new(port: u8, pin: u16) -> Self {
        Self { port, pin }
    }

    pub fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        let [lo, hi] = self.pin.to_le_bytes();
        [self.port, lo, hi]
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [port, lo, hi] => Some(Self::new(port, u16::from_le_bytes([lo, hi]))),
            _ => None,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            port @ 0..=25 => write!(f, "P{}{}", (b'A' + port) as char, self.pin),
            port => write!(f, "P{port}:{}", self.pin),
        }
    }
}

/// Digital I/O used by the application.
pub trait Gpio: Send + Sync + 'static {
    /// Reads the input level; `true` means asserted.
    fn read_pin(&self, pin: Pin) -> bool;

    /// Drives an output level.
    fn write_pin(&self, pin: Pin, level: bool);
}

/// Pins wired to the button and the three LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub button: Pin,
    pub led_red: Pin,
    pub led_green: Pin,
    pub led_blue: Pin,
}

impl Default for BoardPins {
    fn default() -> Self {
        Self {
            button: Pin::new(2, 13),
            led_red: Pin::new(1, 14),
            led_green: Pin::new(1, 0),
            led_blue: Pin::new(1, 7),
        }
    }
}

/// In-memory GPIO for host runs and tests.
///
/// Inputs are set with [`set_level`](SimulatedGpio::set_level); every output
/// write is recorded in order.
#[derive(Default)]
pub struct SimulatedGpio {
    levels: Mutex<HashMap<Pin, bool>>,
    writes: Mutex<Vec<(Pin, bool)>>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&self, pin: Pin, level: bool) {
        self.levels.lock().insert(pin, level);
    }

    pub fn level(&self, pin: Pin) -> bool {
        self.levels.lock().get(&pin).copied().unwrap_or(false)
    }

    /// Output writes so far, oldest first.
    pub fn writes(&self) -> Vec<(Pin, bool)> {
        self.writes.lock().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }
}

impl Gpio for SimulatedGpio {
    fn read_pin(&self, pin: Pin) -> bool {
        self.level(pin)
    }

    fn write_pin(&self, pin: Pin, level: bool) {
        self.levels.lock().insert(pin, level);
        self.writes.lock().push((pin, level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_encoding_fits_actor_data() {
        let pin = Pin::new(1, 0x1234);
        let bytes = pin.to_bytes();
        assert!(bytes.len() <= ao::MAX_DATA_SIZE);
        assert_eq!(Pin::from_bytes(&bytes), Some(pin));
        assert_eq!(Pin::from_bytes(&bytes[..2]), None);
    }

    #[test]
    fn pin_display_uses_port_letter() {
        assert_eq!(BoardPins::default().button.to_string(), "PC13");
        assert_eq!(BoardPins::default().led_red.to_string(), "PB14");
        assert_eq!(Pin::new(25, 3).to_string(), "PZ3");
    }

    #[test]
    fn pin_display_falls_back_to_port_number() {
        assert_eq!(Pin::new(26, 1).to_string(), "P26:1");
        assert_eq!(Pin::new(200, 1).to_string(), "P200:1");
        assert_eq!(Pin::new(u8::MAX, u16::MAX).to_string(), "P255:65535");
    }

    #[test]
    fn simulated_gpio_tracks_levels_and_writes() {
        let gpio = SimulatedGpio::new();
        let pin = Pin::new(0, 5);
        assert!(!gpio.read_pin(pin));

        gpio.write_pin(pin, true);
        assert!(gpio.read_pin(pin));
        assert_eq!(gpio.writes(), vec![(pin, true)]);
    }
}
