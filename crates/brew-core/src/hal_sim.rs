use crate::component::{
    boiler_for_water, heater_plate_for, Boiler, BoilerElement, BrewSwitch, ComponentState,
    HeaterElement, HeaterPlate, IndicatorLight, PressureValve,
};
use crate::hal::CoffeeMakerIO;
use crate::listener::StateListener;
use crate::validation::{Level, Rejection, Reservoir, Validated};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Every hardware field at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareState {
    /// Number of accepted mutations so far.
    pub revision: u64,
    pub heater_plate: HeaterPlate,
    pub boiler: Boiler,
    pub brew_switch: BrewSwitch,
    pub boiler_element: BoilerElement,
    pub heater_element: HeaterElement,
    pub indicator_light: IndicatorLight,
    pub pressure_valve: PressureValve,
    pub water_level: u8,
    pub coffee_level: u8,
    pub carafe_present: bool,
}

impl HardwareState {
    /// Power-on configuration.
    pub fn new() -> Self {
        Self {
            revision: 0,
            heater_plate: HeaterPlate::EmptyCarafe,
            boiler: Boiler::Empty,
            brew_switch: BrewSwitch::Released,
            boiler_element: BoilerElement::Off,
            heater_element: HeaterElement::Off,
            indicator_light: IndicatorLight::On,
            pressure_valve: PressureValve::Closed,
            water_level: 0,
            coffee_level: 0,
            carafe_present: true,
        }
    }

    pub(crate) fn apply_water(&mut self, level: Level<Validated>) {
        self.water_level = level.value();
        self.boiler = boiler_for_water(self.water_level);
    }

    pub(crate) fn apply_coffee(&mut self, level: Level<Validated>) {
        self.coffee_level = level.value();
        self.heater_plate = heater_plate_for(self.coffee_level, self.carafe_present);
    }

    fn set_carafe_present(&mut self, present: bool) {
        self.carafe_present = present;
        self.heater_plate = heater_plate_for(self.coffee_level, self.carafe_present);
    }
}

impl Default for HardwareState {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated coffee maker shared by the control software, the display and
/// the brew thread.
pub struct SimulatedCoffeeMaker {
    state: Mutex<HardwareState>,
    listeners: RwLock<Vec<Arc<dyn StateListener>>>,
}

impl SimulatedCoffeeMaker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HardwareState::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a listener for every accepted mutation from now on.
    pub fn subscribe(&self, listener: Arc<dyn StateListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn snapshot(&self) -> HardwareState {
        *self.lock_state()
    }

    pub fn read_indicator_light(&self) -> ComponentState {
        self.lock_state().indicator_light.into()
    }

    pub fn read_boiler_element(&self) -> ComponentState {
        self.lock_state().boiler_element.into()
    }

    pub fn read_pressure_valve(&self) -> ComponentState {
        self.lock_state().pressure_valve.into()
    }

    pub fn read_heater_element(&self) -> ComponentState {
        self.lock_state().heater_element.into()
    }

    pub fn read_water_level(&self) -> u8 {
        self.lock_state().water_level
    }

    pub fn read_coffee_level(&self) -> u8 {
        self.lock_state().coffee_level
    }

    pub fn try_set_heater_element(&self, target: ComponentState) -> Result<(), Rejection> {
        self.actuate(target, |state, element: HeaterElement| {
            state.heater_element = element
        })
    }

    pub fn try_set_boiler_element(&self, target: ComponentState) -> Result<(), Rejection> {
        self.actuate(target, |state, element: BoilerElement| {
            state.boiler_element = element
        })
    }

    pub fn try_set_indicator_light(&self, target: ComponentState) -> Result<(), Rejection> {
        self.actuate(target, |state, light: IndicatorLight| {
            state.indicator_light = light
        })
    }

    pub fn try_set_pressure_valve(&self, target: ComponentState) -> Result<(), Rejection> {
        self.actuate(target, |state, valve: PressureValve| {
            state.pressure_valve = valve
        })
    }

    /// Manual refill; levels outside 0..=100 are ignored.
    pub fn set_water_level(&self, level: i32) {
        let _ = self.try_set_water_level(level);
    }

    pub fn try_set_water_level(&self, level: i32) -> Result<(), Rejection> {
        let level = Level::new(level).validate(Reservoir::Water)?;
        self.mutate(|state| {
            state.apply_water(level);
            Some(())
        });
        Ok(())
    }

    /// Levels outside 0..=100 are ignored.
    pub fn set_coffee_level(&self, level: i32) {
        let _ = self.try_set_coffee_level(level);
    }

    pub fn try_set_coffee_level(&self, level: i32) -> Result<(), Rejection> {
        let level = Level::new(level).validate(Reservoir::Coffee)?;
        self.mutate(|state| {
            state.apply_coffee(level);
            Some(())
        });
        Ok(())
    }

    pub fn insert_carafe(&self) {
        self.mutate(|state| {
            state.set_carafe_present(true);
            Some(())
        });
    }

    /// The plate reads empty until the carafe is inserted again.
    pub fn remove_carafe(&self) {
        self.mutate(|state| {
            state.set_carafe_present(false);
            Some(())
        });
    }

    pub fn press_button(&self) {
        self.mutate(|state| {
            state.brew_switch = BrewSwitch::Pressed;
            Some(())
        });
    }

    /// Applies `change` under the hardware lock. `None` means nothing
    /// changed; `change` must leave the state untouched in that case.
    /// Otherwise the revision advances and listeners see the new state.
    pub(crate) fn mutate<T>(
        &self,
        change: impl FnOnce(&mut HardwareState) -> Option<T>,
    ) -> Option<T> {
        let (out, snapshot) = {
            let mut state = self.lock_state();
            let out = change(&mut state)?;
            state.revision += 1;
            (out, *state)
        };
        self.notify(&snapshot);
        Some(out)
    }

    fn actuate<S>(
        &self,
        target: ComponentState,
        write: impl FnOnce(&mut HardwareState, S),
    ) -> Result<(), Rejection>
    where
        S: TryFrom<ComponentState, Error = Rejection>,
    {
        let accepted = S::try_from(target)?;
        self.mutate(|state| {
            write(state, accepted);
            Some(())
        });
        Ok(())
    }

    fn notify(&self, state: &HardwareState) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener.on_state_changed(state);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, HardwareState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedCoffeeMaker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimulatedCoffeeMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("SimulatedCoffeeMaker")
            .field("state", &self.snapshot())
            .field("listeners", &listeners)
            .finish()
    }
}

impl CoffeeMakerIO for SimulatedCoffeeMaker {
    fn read_heater_state(&self) -> ComponentState {
        self.lock_state().heater_plate.into()
    }

    fn set_heater_element(&self, target: ComponentState) {
        let _ = self.try_set_heater_element(target);
    }

    fn read_boiler_state(&self) -> ComponentState {
        self.lock_state().boiler.into()
    }

    fn set_boiler_element(&self, target: ComponentState) {
        let _ = self.try_set_boiler_element(target);
    }

    fn read_switch_state(&self) -> ComponentState {
        let consumed = self.mutate(|state| match state.brew_switch {
            BrewSwitch::Pressed => {
                state.brew_switch = BrewSwitch::Released;
                Some(BrewSwitch::Pressed)
            }
            BrewSwitch::Released => None,
        });
        consumed.unwrap_or(BrewSwitch::Released).into()
    }

    fn set_indicator_light(&self, target: ComponentState) {
        let _ = self.try_set_indicator_light(target);
    }

    fn set_pressure_valve(&self, target: ComponentState) {
        let _ = self.try_set_pressure_valve(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    fn recorder(hw: &SimulatedCoffeeMaker) -> Arc<Mutex<Vec<HardwareState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        hw.subscribe(Arc::new(move |state: &HardwareState| {
            sink.lock().unwrap().push(*state);
        }));
        seen
    }

    #[test]
    fn starts_in_power_on_configuration() {
        let hw = SimulatedCoffeeMaker::new();
        assert_eq!(hw.read_heater_state(), ComponentState::CarafeEmpty);
        assert_eq!(hw.read_boiler_state(), ComponentState::BoilerEmpty);
        assert_eq!(hw.read_switch_state(), ComponentState::SwitchReleased);
        assert_eq!(hw.read_boiler_element(), ComponentState::BoilerElementOff);
        assert_eq!(hw.read_heater_element(), ComponentState::HeaterElementOff);
        assert_eq!(hw.read_indicator_light(), ComponentState::IndicatorOn);
        assert_eq!(hw.read_pressure_valve(), ComponentState::ValveClosed);
        assert_eq!(hw.read_water_level(), 0);
        assert_eq!(hw.read_coffee_level(), 0);
        assert_eq!(hw.snapshot().revision, 0);
    }

    #[test]
    fn water_level_drives_boiler_state() {
        let hw = SimulatedCoffeeMaker::new();
        hw.set_water_level(10);
        assert_eq!(hw.read_water_level(), 10);
        assert_eq!(hw.read_boiler_state(), ComponentState::BoilerNotEmpty);

        hw.set_water_level(0);
        assert_eq!(hw.read_boiler_state(), ComponentState::BoilerEmpty);
    }

    #[test]
    fn out_of_range_levels_are_ignored() {
        let hw = SimulatedCoffeeMaker::new();
        hw.set_water_level(30);
        hw.set_water_level(101);
        hw.set_water_level(-5);
        assert_eq!(hw.read_water_level(), 30);

        assert_eq!(
            hw.try_set_coffee_level(500),
            Err(Rejection::LevelOutOfRange {
                reservoir: Reservoir::Coffee,
                requested: 500,
            })
        );
        assert_eq!(hw.read_coffee_level(), 0);
    }

    #[test]
    fn coffee_level_drives_carafe_state() {
        let hw = SimulatedCoffeeMaker::new();
        hw.set_coffee_level(3);
        assert_eq!(hw.read_heater_state(), ComponentState::CarafeNotEmpty);
        hw.set_coffee_level(0);
        assert_eq!(hw.read_heater_state(), ComponentState::CarafeEmpty);
    }

    #[test]
    fn removed_carafe_wins_until_insert() {
        let hw = SimulatedCoffeeMaker::new();
        hw.set_coffee_level(5);
        hw.remove_carafe();
        assert_eq!(hw.read_heater_state(), ComponentState::PlateEmpty);

        hw.set_coffee_level(7);
        hw.set_coffee_level(0);
        assert_eq!(hw.read_heater_state(), ComponentState::PlateEmpty);

        hw.set_coffee_level(2);
        hw.insert_carafe();
        assert_eq!(hw.read_heater_state(), ComponentState::CarafeNotEmpty);
    }

    #[test]
    fn insert_with_empty_carafe() {
        let hw = SimulatedCoffeeMaker::new();
        hw.remove_carafe();
        hw.insert_carafe();
        assert_eq!(hw.read_heater_state(), ComponentState::CarafeEmpty);
    }

    #[test]
    fn switch_press_is_consumed_by_first_read() {
        let hw = SimulatedCoffeeMaker::new();
        hw.press_button();
        hw.press_button();
        assert_eq!(hw.read_switch_state(), ComponentState::SwitchPressed);
        assert_eq!(hw.read_switch_state(), ComponentState::SwitchReleased);
    }

    #[test]
    fn actuators_accept_their_own_codes() {
        let hw = SimulatedCoffeeMaker::new();
        hw.set_heater_element(ComponentState::HeaterElementOn);
        hw.set_boiler_element(ComponentState::BoilerElementOn);
        hw.set_indicator_light(ComponentState::IndicatorForced);
        hw.set_pressure_valve(ComponentState::ValveOpen);

        assert_eq!(hw.read_heater_element(), ComponentState::HeaterElementOn);
        assert_eq!(hw.read_boiler_element(), ComponentState::BoilerElementOn);
        assert_eq!(hw.read_indicator_light(), ComponentState::IndicatorForced);
        assert_eq!(hw.read_pressure_valve(), ComponentState::ValveOpen);
    }

    #[test]
    fn invalid_actuation_changes_nothing_and_stays_quiet() {
        let hw = SimulatedCoffeeMaker::new();
        let seen = recorder(&hw);

        hw.set_boiler_element(ComponentState::HeaterElementOn);
        hw.set_boiler_element(ComponentState::ValveOpen);
        hw.set_pressure_valve(ComponentState::IndicatorOff);

        assert_eq!(hw.read_boiler_element(), ComponentState::BoilerElementOff);
        assert_eq!(hw.read_pressure_valve(), ComponentState::ValveClosed);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(
            hw.try_set_indicator_light(ComponentState::SwitchPressed),
            Err(Rejection::OutOfDomain {
                component: Component::IndicatorLight,
                requested: ComponentState::SwitchPressed,
            })
        );
    }

    #[test]
    fn listeners_see_one_revision_per_accepted_mutation() {
        let hw = SimulatedCoffeeMaker::new();
        let seen = recorder(&hw);

        hw.set_water_level(10);
        hw.set_water_level(200);
        hw.press_button();
        let _ = hw.read_switch_state();
        let _ = hw.read_switch_state();
        hw.remove_carafe();

        let seen = seen.lock().unwrap();
        let revisions: Vec<u64> = seen.iter().map(|s| s.revision).collect();
        assert_eq!(revisions, vec![1, 2, 3, 4]);
        assert_eq!(seen[0].water_level, 10);
        assert_eq!(seen[1].brew_switch, BrewSwitch::Pressed);
        assert_eq!(seen[2].brew_switch, BrewSwitch::Released);
        assert_eq!(seen[3].heater_plate, HeaterPlate::EmptyPlate);
    }

    #[test]
    fn listener_may_read_back_the_simulator() {
        let hw = Arc::new(SimulatedCoffeeMaker::new());
        let observed = Arc::new(Mutex::new(None));
        let (reader, sink) = (Arc::clone(&hw), Arc::clone(&observed));
        hw.subscribe(Arc::new(move |_: &HardwareState| {
            *sink.lock().unwrap() = Some(reader.read_water_level());
        }));

        hw.set_water_level(55);
        assert_eq!(*observed.lock().unwrap(), Some(55));
    }
}
