use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ao_app::{App, AppConfig, BoardPins, ButtonConfig, SimulatedGpio};
use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Host simulation of the button/LED active objects")]
struct Opts {
    /// Hold durations of the simulated presses, in milliseconds.
    #[arg(long = "press", value_delimiter = ',', default_values_t = [250u32, 1200, 2500, 300])]
    presses: Vec<u32>,

    /// Pause between presses, in milliseconds.
    #[arg(long = "gap-ms", default_value_t = 500)]
    gap_ms: u64,

    /// Inactivity before the UI shuts itself down, in milliseconds.
    #[arg(long = "idle-ms", default_value_t = 3_000)]
    idle_ms: u32,

    /// How long to keep running after the last press, in milliseconds.
    #[arg(long = "linger-ms", default_value_t = 4_000)]
    linger_ms: u64,

    #[arg(long = "log", default_value = "info", value_name = "LEVEL")]
    log_level: LevelFilter,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();
    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .parse_default_env()
        .init();

    let pins = BoardPins::default();
    let config = AppConfig {
        button: ButtonConfig::default().with_idle_ms(opts.idle_ms),
        pins,
        ..AppConfig::default()
    };
    let gpio = Arc::new(SimulatedGpio::new());
    let mut app = App::boot(config, gpio.clone())?;
    app.start()?;

    for hold_ms in &opts.presses {
        gpio.set_level(pins.button, true);
        thread::sleep(Duration::from_millis(u64::from(*hold_ms)));
        gpio.set_level(pins.button, false);
        thread::sleep(Duration::from_millis(opts.gap_ms));
        println!("after {hold_ms} ms press: {:?}", app.ui().state());
    }
    thread::sleep(Duration::from_millis(opts.linger_ms));

    let rt = app.runtime();
    println!(
        "ui {:?}, {} actor(s), {} queue(s), {} context(s), messages {} allocated / {} released / {} discarded",
        app.ui().state(),
        rt.live_actors(),
        rt.resources().live_queues(),
        rt.resources().live_contexts(),
        rt.stats().allocated(),
        rt.stats().released(),
        rt.stats().discarded(),
    );

    app.shutdown();
    Ok(())
}
