//! Button producer.
//!
//! Samples the button input at a fixed period, classifies each press by how
//! long it was held and forwards the result to the UI actor. It is also the
//! only component that brings the UI back after an idle teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::board::{Gpio, Pin};
use crate::ui::{Ui, UiEvent, UiState};

/// Classification of a completed press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// Released too early to count, or not released yet.
    None,
    Pulse,
    Short,
    Long,
}

impl Press {
    /// UI event for this press, if it is a real one.
    pub fn event(self) -> Option<UiEvent> {
        match self {
            Press::None => None,
            Press::Pulse => Some(UiEvent::Pulse),
            Press::Short => Some(UiEvent::Short),
            Press::Long => Some(UiEvent::Long),
        }
    }
}

/// Button timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Sampling period.
    pub period_ms: u32,
    /// Minimum hold for a pulse.
    pub pulse_ms: u32,
    /// Minimum hold for a short press.
    pub short_ms: u32,
    /// Minimum hold for a long press.
    pub long_ms: u32,
    /// Inactivity before the UI is asked to shut down.
    pub idle_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            period_ms: 50,
            pulse_ms: 200,
            short_ms: 1000,
            long_ms: 2000,
            idle_ms: 10_000,
        }
    }
}

impl ButtonConfig {
    pub fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    pub fn with_thresholds_ms(mut self, pulse_ms: u32, short_ms: u32, long_ms: u32) -> Self {
        self.pulse_ms = pulse_ms;
        self.short_ms = short_ms;
        self.long_ms = long_ms;
        self
    }

    pub fn with_idle_ms(mut self, idle_ms: u32) -> Self {
        self.idle_ms = idle_ms;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms))
    }

    /// Classifies a press held for `held_ms`, longest threshold first.
    pub fn classify(&self, held_ms: u32) -> Press {
        if held_ms >= self.long_ms {
            Press::Long
        } else if held_ms >= self.short_ms {
            Press::Short
        } else if held_ms >= self.pulse_ms {
            Press::Pulse
        } else {
            Press::None
        }
    }
}

/// Outcome of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Nothing,
    Pressed(Press),
    /// The idle period elapsed; reported once until the next press.
    IdleTimeout,
}

/// Hold and idle counters driven one sample at a time.
#[derive(Debug, Clone)]
pub struct ButtonClassifier {
    config: ButtonConfig,
    held_ms: u32,
    idle_ms: u32,
    idle_reported: bool,
}

impl ButtonClassifier {
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            held_ms: 0,
            idle_ms: 0,
            idle_reported: false,
        }
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    /// Milliseconds the button has been held so far.
    pub fn held_ms(&self) -> u32 {
        self.held_ms
    }

    pub fn idle_ms(&self) -> u32 {
        self.idle_ms
    }

    /// Feeds one sample of the input.
    ///
    /// `ui_idle` tells whether the UI is already shut down, in which case no
    /// idle timeout is reported.
    pub fn sample(&mut self, pressed: bool, ui_idle: bool) -> ButtonEvent {
        let period = self.config.period_ms;
        if pressed {
            self.held_ms = self.held_ms.saturating_add(period);
            return ButtonEvent::Nothing;
        }

        let press = self.config.classify(self.held_ms);
        self.held_ms = 0;
        if press != Press::None {
            self.idle_ms = 0;
            self.idle_reported = false;
            return ButtonEvent::Pressed(press);
        }

        self.idle_ms = self.idle_ms.saturating_add(period);
        if self.idle_ms >= self.config.idle_ms && !ui_idle && !self.idle_reported {
            self.idle_reported = true;
            return ButtonEvent::IdleTimeout;
        }
        ButtonEvent::Nothing
    }
}

/// Polling loop feeding the UI from a GPIO input.
pub struct ButtonTask {
    gpio: Arc<dyn Gpio>,
    pin: Pin,
    ui: Ui,
    classifier: ButtonClassifier,
}

impl ButtonTask {
    pub fn new(gpio: Arc<dyn Gpio>, pin: Pin, ui: Ui, config: ButtonConfig) -> Self {
        Self {
            gpio,
            pin,
            ui,
            classifier: ButtonClassifier::new(config),
        }
    }

    pub fn classifier(&self) -> &ButtonClassifier {
        &self.classifier
    }

    /// Runs one polling cycle with the exclusion lock held.
    ///
    /// A real press recreates the UI first if it is shut down. Send failures
    /// are logged and otherwise ignored.
    pub fn poll_once(&mut self) -> ButtonEvent {
        let _guard = self.ui.exclusion_lock().guard();

        let pressed = self.gpio.read_pin(self.pin);
        let event = self
            .classifier
            .sample(pressed, self.ui.state() == UiState::Idle);

        let ui_event = match event {
            ButtonEvent::Nothing => None,
            ButtonEvent::IdleTimeout => {
                info!("Button idle. Starting shutdown to save resources");
                Some(UiEvent::Idle)
            }
            ButtonEvent::Pressed(press) => {
                match press {
                    Press::Pulse => info!("Button pulse"),
                    Press::Short => info!("Button short"),
                    Press::Long => info!("Button long"),
                    Press::None => {}
                }
                if self.ui.state() == UiState::Idle {
                    info!("Creating OS resources as external event happened");
                    if let Err(err) = self.ui.create() {
                        info!("User interface could not be created: {err}");
                    }
                }
                press.event()
            }
        };

        if let Some(ui_event) = ui_event {
            if let Err(err) = self.ui.post(ui_event) {
                debug!("{ui_event:?} not delivered to ui: {err}");
            }
        }
        event
    }

    /// Polls every period until `stop` is set.
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        let period = self.classifier.config().period();
        while !stop.load(Ordering::Acquire) {
            self.poll_once();
            thread::sleep(period);
        }
        debug!("button task stopped");
    }
}
