pub mod brew_loop;
pub mod component;
pub mod hal;
pub mod hal_sim;
pub mod listener;
pub mod tags;
pub mod timebase;
pub mod validation;

pub use brew_loop::{
    brew_guard, spawn_brew_thread, spawn_microcontroller, BrewConfig, BrewHandle, BrewStats,
    Microcontroller, TickObserver, TickOutcome,
};
pub use component::{
    Boiler, BoilerElement, BrewSwitch, Component, ComponentState, HeaterElement, HeaterPlate,
    IndicatorLight, PressureValve,
};
pub use hal::CoffeeMakerIO;
pub use hal_sim::{HardwareState, SimulatedCoffeeMaker};
pub use listener::StateListener;
pub use timebase::{Stamp, TimeBase};
pub use validation::{Level, Rejection, Reservoir, Unvalidated, Validated};
