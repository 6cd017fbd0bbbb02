use crate::component::ComponentState;

/// Hardware surface polled and driven by the control software.
///
/// Actuation calls silently ignore codes that belong to another component.
pub trait CoffeeMakerIO: Send + Sync {
    fn read_heater_state(&self) -> ComponentState;
    fn set_heater_element(&self, target: ComponentState);
    fn read_boiler_state(&self) -> ComponentState;
    fn set_boiler_element(&self, target: ComponentState);
    /// Returns the switch state and releases it; a press is seen once.
    fn read_switch_state(&self) -> ComponentState;
    fn set_indicator_light(&self, target: ComponentState);
    fn set_pressure_valve(&self, target: ComponentState);
}
