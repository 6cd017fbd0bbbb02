use crate::component::{Boiler, BoilerElement, PressureValve};
use crate::hal_sim::{HardwareState, SimulatedCoffeeMaker};
use crate::validation::{Level, Reservoir};
use log::{debug, info};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct BrewConfig {
    pub tick_period: Duration,
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(500),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct BrewStats {
    pub ticks_executed: u64,
    pub transfers: u64,
    pub idle_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One unit of water became one unit of coffee.
    Transferred,
    Idle,
}

/// Water boils into the carafe only with a full boiler, the element on and
/// the valve closed.
pub fn brew_guard(state: &HardwareState) -> bool {
    state.boiler == Boiler::NonEmpty
        && state.boiler_element == BoilerElement::On
        && state.pressure_valve == PressureValve::Closed
}

/// Moves one unit and returns the resulting (water, coffee) levels.
fn transfer_unit(state: &mut HardwareState) -> Option<(u8, u8)> {
    if !brew_guard(state) {
        return None;
    }
    // Both levels are validated before either is written.
    let water = Level::new(i32::from(state.water_level) - 1)
        .validate(Reservoir::Water)
        .ok()?;
    let coffee = Level::new(i32::from(state.coffee_level) + 1)
        .validate(Reservoir::Coffee)
        .ok()?;
    state.apply_water(water);
    state.apply_coffee(coffee);
    Some((state.water_level, state.coffee_level))
}

/// Told the outcome of every tick, on the ticking thread.
pub trait TickObserver: Send + Sync {
    fn on_tick(&self, outcome: TickOutcome);
}

impl<F> TickObserver for F
where
    F: Fn(TickOutcome) + Send + Sync,
{
    fn on_tick(&self, outcome: TickOutcome) {
        self(outcome)
    }
}

/// Periodic process that brews while the guard holds.
pub struct Microcontroller {
    hardware: Arc<SimulatedCoffeeMaker>,
    config: BrewConfig,
    stats: BrewStats,
    observers: Vec<Arc<dyn TickObserver>>,
}

impl Microcontroller {
    pub fn new(hardware: Arc<SimulatedCoffeeMaker>, config: BrewConfig) -> Self {
        Self {
            hardware,
            config,
            stats: BrewStats::default(),
            observers: Vec::new(),
        }
    }

    pub fn observe(&mut self, observer: Arc<dyn TickObserver>) {
        self.observers.push(observer);
    }

    /// Evaluates the guard once and transfers one unit if it holds.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks_executed += 1;
        let outcome = match self.hardware.mutate(transfer_unit) {
            Some((water, coffee)) => {
                self.stats.transfers += 1;
                debug!(
                    "brew transfer #{}: water={} coffee={}",
                    self.stats.transfers, water, coffee
                );
                TickOutcome::Transferred
            }
            None => {
                self.stats.idle_ticks += 1;
                TickOutcome::Idle
            }
        };
        for observer in &self.observers {
            observer.on_tick(outcome);
        }
        outcome
    }

    /// Sleeps one period, ticks, and repeats until `stop` is raised.
    ///
    /// Raising `stop` and unparking this thread ends the wait early.
    pub fn run(&mut self, stop: &AtomicBool) {
        info!(
            "microcontroller started, tick period {} ms",
            self.config.tick_period.as_millis()
        );
        while self.wait_for_tick(stop) {
            self.tick();
        }
        info!(
            "microcontroller stopped after {} ticks ({} transfers)",
            self.stats.ticks_executed, self.stats.transfers
        );
    }

    fn wait_for_tick(&self, stop: &AtomicBool) -> bool {
        let deadline = Instant::now() + self.config.tick_period;
        loop {
            if stop.load(Ordering::Acquire) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }

    pub fn stats(&self) -> &BrewStats {
        &self.stats
    }
}

/// Handle to a brew process running on its own thread.
pub struct BrewHandle {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<BrewStats>,
}

impl BrewHandle {
    /// Asks the thread to finish; it exits before its next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.thread.thread().unpark();
    }

    /// Waits for the thread. Blocks forever unless `stop` was called.
    pub fn join(self) -> thread::Result<BrewStats> {
        self.thread.join()
    }

    pub fn shutdown(self) -> thread::Result<BrewStats> {
        self.stop();
        self.join()
    }
}

pub fn spawn_brew_thread(
    hardware: Arc<SimulatedCoffeeMaker>,
    config: BrewConfig,
) -> io::Result<BrewHandle> {
    spawn_microcontroller(Microcontroller::new(hardware, config))
}

/// Runs an already configured microcontroller on its own thread.
pub fn spawn_microcontroller(mut micro: Microcontroller) -> io::Result<BrewHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_thread = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name("microcontroller".to_string())
        .spawn(move || {
            micro.run(&stop_thread);
            micro.stats().clone()
        })?;
    Ok(BrewHandle { stop, thread })
}
