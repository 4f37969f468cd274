//! UI state machine driven deterministically through a contextless UI actor.

use std::sync::Arc;

use ao::{ActorOptions, ActorRef, ExclusionLock, Runtime, RuntimeConfig};
use ao_app::{BoardPins, SimulatedGpio, Ui, UiEvent, UiState};

struct Fixture {
    rt: Runtime,
    gpio: Arc<SimulatedGpio>,
    pins: BoardPins,
    ui: Ui,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    fn with_config(config: RuntimeConfig) -> Self {
        let rt = Runtime::new(config);
        let gpio = Arc::new(SimulatedGpio::new());
        let pins = BoardPins::default();
        let ui = Ui::new(
            rt.clone(),
            gpio.clone(),
            pins,
            ExclusionLock::new(),
            ActorOptions::CONTEXTLESS,
        );
        Self { rt, gpio, pins, ui }
    }

    fn create(&self) -> ActorRef {
        self.ui.create().expect("ui created")
    }

    /// Posts `event` and drains the UI queue.
    fn feed(&self, actor: &ActorRef, event: UiEvent) {
        self.ui.post(event).expect("event queued");
        self.rt.run_until_idle(actor);
    }
}

#[test]
fn repeated_press_is_a_no_op() {
    let fx = Fixture::new();
    let actor = fx.create();
    assert_eq!(fx.ui.state(), UiState::Ready);

    fx.feed(&actor, UiEvent::Pulse);
    assert_eq!(fx.ui.state(), UiState::RedOn);
    assert_eq!(fx.gpio.writes(), vec![(fx.pins.led_red, true)]);
    // The press itself plus one LED-on command.
    assert_eq!(fx.rt.stats().allocated(), 2);

    fx.feed(&actor, UiEvent::Pulse);
    assert_eq!(fx.ui.state(), UiState::RedOn);
    assert_eq!(fx.gpio.writes(), vec![(fx.pins.led_red, true)]);
    assert_eq!(fx.rt.stats().allocated(), 3);
    assert_eq!(fx.rt.stats().outstanding(), 0);
}

#[test]
fn switching_color_turns_previous_led_off_first() {
    let fx = Fixture::new();
    let actor = fx.create();

    fx.feed(&actor, UiEvent::Pulse);
    fx.feed(&actor, UiEvent::Short);
    fx.feed(&actor, UiEvent::Long);

    assert_eq!(fx.ui.state(), UiState::BlueOn);
    assert_eq!(
        fx.gpio.writes(),
        vec![
            (fx.pins.led_red, true),
            (fx.pins.led_red, false),
            (fx.pins.led_green, true),
            (fx.pins.led_green, false),
            (fx.pins.led_blue, true),
        ]
    );
}

#[test]
fn idle_teardown_round_trip() {
    let fx = Fixture::new();
    let actor = fx.create();
    fx.feed(&actor, UiEvent::Pulse);
    fx.gpio.clear_writes();

    fx.feed(&actor, UiEvent::Idle);

    assert_eq!(fx.ui.state(), UiState::Idle);
    assert!(!fx.ui.is_tearing_down());
    assert!(fx.ui.actor().is_none());
    assert!(!fx.rt.is_alive(&actor));
    assert_eq!(fx.rt.live_actors(), 0);
    assert_eq!(fx.rt.resources().live_queues(), 0);
    assert!(!fx.ui.exclusion_lock().is_locked());
    assert_eq!(fx.gpio.writes(), vec![(fx.pins.led_red, false)]);
    assert_eq!(fx.rt.stats().outstanding(), 0);
    assert_eq!(fx.rt.stats().discarded(), 0);

    // The next press brings the whole UI back.
    let actor = fx.create();
    assert_eq!(fx.ui.state(), UiState::Ready);
    assert_eq!(fx.rt.live_actors(), 4);
    fx.feed(&actor, UiEvent::Pulse);
    assert_eq!(fx.ui.state(), UiState::RedOn);
}

#[test]
fn idle_from_ready_touches_no_led() {
    let fx = Fixture::new();
    let actor = fx.create();

    fx.feed(&actor, UiEvent::Idle);
    assert_eq!(fx.ui.state(), UiState::Idle);
    assert!(fx.gpio.writes().is_empty());
}

#[test]
fn events_queued_during_teardown_are_ignored() {
    let fx = Fixture::new();
    let actor = fx.create();
    fx.feed(&actor, UiEvent::Pulse);

    // Short lands between Idle and the Destroy that Idle queues.
    fx.ui.post(UiEvent::Idle).unwrap();
    fx.ui.post(UiEvent::Short).unwrap();
    fx.rt.run_until_idle(&actor);

    assert_eq!(fx.ui.state(), UiState::Idle);
    assert!(!fx.ui.exclusion_lock().is_locked());
    assert_eq!(
        fx.gpio.writes(),
        vec![(fx.pins.led_red, true), (fx.pins.led_red, false)]
    );
}

#[test]
fn second_idle_does_not_restart_teardown() {
    let fx = Fixture::new();
    let actor = fx.create();

    fx.ui.post(UiEvent::Idle).unwrap();
    fx.ui.post(UiEvent::Idle).unwrap();
    fx.rt.run_until_idle(&actor);

    assert_eq!(fx.ui.state(), UiState::Idle);
    assert!(!fx.ui.exclusion_lock().is_locked());
    assert_eq!(fx.rt.live_actors(), 0);
    assert_eq!(fx.rt.stats().outstanding(), 0);
}

#[test]
fn teardown_is_abandoned_when_destroy_cannot_be_queued() {
    let fx = Fixture::with_config(RuntimeConfig::builder().queue_capacity(1).build());
    let actor = fx.create();
    fx.feed(&actor, UiEvent::Pulse);

    // The LED-off command takes the only queue slot, so Destroy is refused.
    fx.feed(&actor, UiEvent::Idle);

    assert!(!fx.ui.is_tearing_down());
    assert!(!fx.ui.exclusion_lock().is_locked());
    assert!(fx.rt.is_alive(&actor));
    assert_eq!(fx.rt.live_actors(), 4);
}

#[test]
fn abandoned_teardown_keeps_state_and_led_in_step() {
    let fx = Fixture::with_config(RuntimeConfig::builder().queue_capacity(1).build());
    let actor = fx.create();
    fx.feed(&actor, UiEvent::Pulse);
    fx.feed(&actor, UiEvent::Idle);

    // The red LED went dark, so the UI no longer claims it is lit.
    assert!(!fx.gpio.level(fx.pins.led_red));
    assert_eq!(fx.ui.state(), UiState::Ready);

    // The same press lights it again instead of being swallowed.
    fx.feed(&actor, UiEvent::Pulse);
    assert_eq!(fx.ui.state(), UiState::RedOn);
    assert!(fx.gpio.level(fx.pins.led_red));
}

#[test]
fn exclusion_lock_is_held_until_teardown_completes() {
    let fx = Fixture::new();
    let actor = fx.create();
    fx.feed(&actor, UiEvent::Pulse);

    fx.ui.post(UiEvent::Idle).unwrap();
    assert_eq!(fx.rt.dispatch_one(&actor), Ok(true));

    // A button cycle would block here.
    assert!(fx.ui.is_tearing_down());
    assert!(fx.ui.exclusion_lock().is_locked());
    assert!(!fx.ui.exclusion_lock().try_acquire());
    assert_eq!(fx.ui.state(), UiState::RedOn);

    // LED-off, then Destroy.
    assert_eq!(fx.rt.dispatch_one(&actor), Ok(true));
    assert!(fx.ui.exclusion_lock().is_locked());
    assert_eq!(fx.rt.dispatch_one(&actor), Ok(true));

    assert!(!fx.ui.exclusion_lock().is_locked());
    assert!(!fx.ui.is_tearing_down());
    assert_eq!(fx.ui.state(), UiState::Idle);
    assert!(fx.ui.exclusion_lock().try_acquire());
}

#[test]
fn stray_destroy_is_ignored() {
    let fx = Fixture::new();
    let actor = fx.create();

    fx.feed(&actor, UiEvent::Destroy);
    assert_eq!(fx.ui.state(), UiState::Ready);
    assert!(fx.rt.is_alive(&actor));
    assert_eq!(fx.rt.live_actors(), 4);
}
