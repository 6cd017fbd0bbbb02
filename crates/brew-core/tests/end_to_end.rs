use brew_core::{
    spawn_brew_thread, BrewConfig, CoffeeMakerIO, ComponentState, HardwareState,
    Microcontroller, SimulatedCoffeeMaker, TickOutcome,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn ten_ticks_empty_the_boiler_into_the_carafe() {
    let hw = Arc::new(SimulatedCoffeeMaker::new());
    assert_eq!(hw.read_water_level(), 0);
    assert_eq!(hw.read_coffee_level(), 0);
    assert_eq!(hw.read_boiler_state(), ComponentState::BoilerEmpty);

    hw.set_water_level(10);
    assert_eq!(hw.read_boiler_state(), ComponentState::BoilerNotEmpty);
    assert_eq!(hw.read_water_level(), 10);

    hw.set_boiler_element(ComponentState::BoilerElementOn);
    hw.set_pressure_valve(ComponentState::ValveClosed);

    let mut micro = Microcontroller::new(Arc::clone(&hw), BrewConfig::default());
    for _ in 0..10 {
        assert_eq!(micro.tick(), TickOutcome::Transferred);
    }
    assert_eq!(hw.read_water_level(), 0);
    assert_eq!(hw.read_coffee_level(), 10);
    assert_eq!(hw.read_boiler_state(), ComponentState::BoilerEmpty);

    let before = hw.snapshot();
    assert_eq!(micro.tick(), TickOutcome::Idle);
    assert_eq!(hw.snapshot(), before);
}

#[test]
fn control_software_reacts_to_button_through_the_trait() {
    fn brew_on_press(io: &dyn CoffeeMakerIO) {
        if io.read_switch_state() == ComponentState::SwitchPressed
            && io.read_boiler_state() == ComponentState::BoilerNotEmpty
        {
            io.set_boiler_element(ComponentState::BoilerElementOn);
            io.set_indicator_light(ComponentState::IndicatorOff);
        }
    }

    let hw = SimulatedCoffeeMaker::new();
    hw.set_water_level(4);
    brew_on_press(&hw);
    assert_eq!(hw.read_boiler_element(), ComponentState::BoilerElementOff);

    hw.press_button();
    brew_on_press(&hw);
    assert_eq!(hw.read_boiler_element(), ComponentState::BoilerElementOn);
    assert_eq!(hw.read_indicator_light(), ComponentState::IndicatorOff);
    assert_eq!(hw.read_switch_state(), ComponentState::SwitchReleased);
}

#[test]
fn readers_never_see_half_a_transfer() {
    let hw = Arc::new(SimulatedCoffeeMaker::new());
    let totals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&totals);
    hw.subscribe(Arc::new(move |state: &HardwareState| {
        sink.lock()
            .unwrap()
            .push(u16::from(state.water_level) + u16::from(state.coffee_level));
    }));

    hw.set_water_level(50);
    hw.set_boiler_element(ComponentState::BoilerElementOn);
    let mut micro = Microcontroller::new(Arc::clone(&hw), BrewConfig::default());
    while micro.tick() == TickOutcome::Transferred {}

    let totals = totals.lock().unwrap();
    assert!(totals.iter().all(|&total| total == 50));
    assert_eq!(micro.stats().transfers, 50);
}

#[test]
fn other_threads_see_levels_summing_to_the_start_while_brewing() {
    let hw = Arc::new(SimulatedCoffeeMaker::new());
    hw.set_water_level(100);
    hw.set_boiler_element(ComponentState::BoilerElementOn);
    let config = BrewConfig {
        tick_period: Duration::from_millis(1),
    };
    let brew = spawn_brew_thread(Arc::clone(&hw), config).unwrap();

    let start = Instant::now();
    let mut reads = 0u64;
    loop {
        let state = hw.snapshot();
        reads += 1;
        assert_eq!(
            u32::from(state.water_level) + u32::from(state.coffee_level),
            100,
            "torn read at revision {}",
            state.revision
        );
        if state.coffee_level == 100 || start.elapsed() > Duration::from_secs(10) {
            break;
        }
    }
    let stats = brew.shutdown().unwrap();

    assert!(reads > 1);
    assert!(stats.transfers > 0);
    assert_eq!(
        u32::from(hw.read_water_level()) + u32::from(hw.read_coffee_level()),
        100
    );
}

#[test]
fn snapshot_serializes_with_snake_case_states() {
    let hw = SimulatedCoffeeMaker::new();
    hw.remove_carafe();
    let json = serde_json::to_value(hw.snapshot()).unwrap();
    assert_eq!(json["heater_plate"], "empty_plate");
    assert_eq!(json["pressure_valve"], "closed");
    assert_eq!(json["water_level"], 0);
    assert_eq!(json["revision"], 1);
}
