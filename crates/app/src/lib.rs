//! # ao-app
//!
//! Button, UI and LED active objects running on the [`ao`] runtime.
//!
//! A polling [`ButtonTask`] classifies presses and feeds them to the UI
//! actor, which lights one of three LEDs. After a long idle period the UI
//! and its LEDs are destroyed to free their OS resources; the next press
//! brings them back.
//!
//! ## Module Overview
//! - [`board`]  – Pin map, GPIO interface and a simulated GPIO.
//! - [`led`]    – Queueless LED actor.
//! - [`ui`]     – UI actor state machine and idle teardown.
//! - [`button`] – Press classifier and polling task.
//! - [`app`]    – Boot sequence and task lifecycle.

pub mod app;
pub mod board;
pub mod button;
pub mod led;
pub mod ui;

pub use app::{App, AppConfig};
pub use board::{BoardPins, Gpio, Pin, SimulatedGpio};
pub use button::{ButtonClassifier, ButtonConfig, ButtonEvent, ButtonTask, Press};
pub use led::{create_led, LedCommand};
pub use ui::{Ui, UiEvent, UiState};
