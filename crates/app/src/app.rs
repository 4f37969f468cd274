//! Application wiring: boot sequence and button task lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ao::{ActorOptions, AoError, AoResult, ExclusionLock, Runtime, RuntimeConfig};
use log::{info, warn};

use crate::board::{BoardPins, Gpio};
use crate::button::{ButtonConfig, ButtonTask};
use crate::ui::Ui;

/// Everything needed to bring the application up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub button: ButtonConfig,
    pub pins: BoardPins,
    /// Options for the UI actor. LEDs are always queueless and contextless.
    pub ui_options: ActorOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            button: ButtonConfig::default(),
            pins: BoardPins::default(),
            ui_options: ActorOptions::NONE,
        }
    }
}

/// Running application.
pub struct App {
    config: AppConfig,
    rt: Runtime,
    gpio: Arc<dyn Gpio>,
    ui: Ui,
    stop: Arc<AtomicBool>,
    button: Option<thread::JoinHandle<()>>,
}

impl App {
    /// Initializes the actor pool and creates the UI with its LEDs.
    ///
    /// The button task is not started; see [`App::start`].
    pub fn boot(config: AppConfig, gpio: Arc<dyn Gpio>) -> AoResult<Self> {
        let rt = Runtime::new(config.runtime.clone());
        let ui = Ui::new(
            rt.clone(),
            Arc::clone(&gpio),
            config.pins,
            ExclusionLock::new(),
            config.ui_options,
        );
        ui.create()?;
        info!("Application initialized");

        Ok(Self {
            config,
            rt,
            gpio,
            ui,
            stop: Arc::new(AtomicBool::new(false)),
            button: None,
        })
    }

    /// Builds the button task without spawning it.
    pub fn button_task(&self) -> ButtonTask {
        ButtonTask::new(
            Arc::clone(&self.gpio),
            self.config.pins.button,
            self.ui.clone(),
            self.config.button,
        )
    }

    /// Spawns the button polling task.
    pub fn start(&mut self) -> AoResult<()> {
        if self.button.is_some() {
            return Ok(());
        }
        let task = self.button_task();
        let stop = Arc::clone(&self.stop);
        let handle = thread::Builder::new()
            .name("task_button".into())
            .spawn(move || task.run(stop))
            .map_err(|err| {
                warn!("button task could not be spawned: {err}");
                AoError::OsResourceError
            })?;
        self.button = Some(handle);
        Ok(())
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stops the button task and destroys every actor.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.button.take() {
            if handle.join().is_err() {
                warn!("button task panicked");
            }
        }
        self.rt.shutdown();
        self.ui.mark_shut_down();
        info!("Application stopped");
    }
}
