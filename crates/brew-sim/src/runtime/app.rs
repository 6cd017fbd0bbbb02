use crate::infra::journal::{Journal, JournalEventType, JournalListener};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use brew_core::tags;
use brew_core::{
    spawn_microcontroller, BrewConfig, BrewStats, CoffeeMakerIO, ComponentState, HardwareState,
    Microcontroller, SimulatedCoffeeMaker, StateListener, TimeBase,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to open journal {}: {source}", .path.display())]
    Journal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn microcontroller thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("microcontroller thread panicked")]
    BrewThreadPanicked,
}

/// Stand-in for the coffee maker window: logs every state change.
struct ConsoleDisplay;

impl StateListener for ConsoleDisplay {
    fn on_state_changed(&self, state: &HardwareState) {
        debug!(
            revision = state.revision,
            water_level = state.water_level,
            coffee_level = state.coffee_level,
            heater_plate = ?state.heater_plate,
            boiler = ?state.boiler,
            boiler_element = ?state.boiler_element,
            heater_element = ?state.heater_element,
            indicator_light = ?state.indicator_light,
            pressure_valve = ?state.pressure_valve,
            "Hardware state changed"
        );
    }
}

pub fn run_from_args() -> Result<(), RuntimeError> {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return Ok(());
    }
    run(config)
}

pub fn run(config: RuntimeConfig) -> Result<(), RuntimeError> {
    // Flushes the log file on drop
    let _log_guard = init_tracing(config.json_logs, config.log_file.as_deref());

    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let timebase = TimeBase::new();
    let hardware = Arc::new(SimulatedCoffeeMaker::new());
    hardware.subscribe(Arc::new(ConsoleDisplay));
    let metrics = Arc::new(telemetry::MetricsListener::new());
    hardware.subscribe(Arc::clone(&metrics) as Arc<dyn StateListener>);

    let journal = open_journal(config.journal_path.as_deref(), timebase)?;
    if let Some(ref journal) = journal {
        let details = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "tick_ms": config.tick_ms,
            "initial_state": hardware.snapshot(),
        });
        if let Err(e) = journal.record(JournalEventType::SimulatorStart, details) {
            warn!(error = %e, "Failed to journal simulator start");
        }
        hardware.subscribe(Arc::new(JournalListener::new(Arc::clone(journal))));
    }

    apply_initial_conditions(&hardware, &config);

    info!(tick_ms = config.tick_ms, "Starting microcontroller");
    let brew_config = BrewConfig {
        tick_period: config.tick_period(),
    };
    let mut micro = Microcontroller::new(Arc::clone(&hardware), brew_config);
    micro.observe(metrics);
    let brew = spawn_microcontroller(micro).map_err(RuntimeError::Spawn)?;

    info!("Simulator running. Control software drives it through CoffeeMakerIO.");

    let Some(seconds) = config.run_seconds else {
        // No stop signal: the microcontroller runs for the life of the process.
        brew.join().map_err(|_| RuntimeError::BrewThreadPanicked)?;
        return Ok(());
    };

    info!(seconds, "Running for limited duration");
    thread::sleep(Duration::from_secs(seconds));

    let stats = brew
        .shutdown()
        .map_err(|_| RuntimeError::BrewThreadPanicked)?;

    let final_state = hardware.snapshot();
    info!(
        ticks_executed = stats.ticks_executed,
        transfers = stats.transfers,
        idle_ticks = stats.idle_ticks,
        water_level = final_state.water_level,
        coffee_level = final_state.coffee_level,
        "Run complete"
    );

    if let Some(ref journal) = journal {
        let details = shutdown_details(&stats, &final_state);
        if let Err(e) = journal.record(JournalEventType::SimulatorShutdown, details) {
            warn!(error = %e, "Failed to journal simulator shutdown");
        }
    }

    Ok(())
}

fn open_journal(
    path: Option<&Path>,
    timebase: TimeBase,
) -> Result<Option<Arc<Journal>>, RuntimeError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let journal = Journal::open(path, timebase).map_err(|source| RuntimeError::Journal {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "State journal enabled");
    Ok(Some(Arc::new(journal)))
}

fn apply_initial_conditions(hardware: &SimulatedCoffeeMaker, config: &RuntimeConfig) {
    if let Some(level) = config.initial_water {
        if let Err(e) = hardware.try_set_water_level(level) {
            warn!(error = %e, "Ignoring initial water level");
        }
    }
    if let Some(level) = config.initial_coffee {
        if let Err(e) = hardware.try_set_coffee_level(level) {
            warn!(error = %e, "Ignoring initial coffee level");
        }
    }
    if config.carafe_removed {
        hardware.remove_carafe();
    }
    if config.boiler_on {
        hardware.set_boiler_element(ComponentState::BoilerElementOn);
    }
    if config.valve_open {
        hardware.set_pressure_valve(ComponentState::ValveOpen);
    }
}

fn shutdown_details(stats: &BrewStats, state: &HardwareState) -> serde_json::Value {
    let mut details = serde_json::Map::new();
    details.insert(tags::BREW_TICKS.key.into(), stats.ticks_executed.into());
    details.insert(tags::BREW_TRANSFERS.key.into(), stats.transfers.into());
    details.insert("idle_ticks".into(), stats.idle_ticks.into());
    details.insert(tags::WATER_LEVEL.key.into(), state.water_level.into());
    details.insert(tags::COFFEE_LEVEL.key.into(), state.coffee_level.into());
    serde_json::Value::Object(details)
}
