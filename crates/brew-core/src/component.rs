use crate::validation::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware parts of the coffee maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    HeaterPlate,
    Boiler,
    BrewSwitch,
    BoilerElement,
    HeaterElement,
    IndicatorLight,
    PressureValve,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::HeaterPlate => "heater plate",
            Component::Boiler => "boiler",
            Component::BrewSwitch => "brew switch",
            Component::BoilerElement => "boiler element",
            Component::HeaterElement => "heater element",
            Component::IndicatorLight => "indicator light",
            Component::PressureValve => "pressure valve",
        };
        f.write_str(name)
    }
}

/// State code as seen by the control software.
///
/// Every component shares this one vocabulary, so a caller can hand any
/// code to any actuator. Actuators only accept the codes of their own
/// component; see [`ComponentState::component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    CarafeEmpty,
    CarafeNotEmpty,
    PlateEmpty,
    BoilerEmpty,
    BoilerNotEmpty,
    SwitchReleased,
    SwitchPressed,
    BoilerElementOn,
    BoilerElementOff,
    HeaterElementOn,
    HeaterElementOff,
    IndicatorOn,
    IndicatorOff,
    IndicatorForced,
    ValveOpen,
    ValveClosed,
}

impl ComponentState {
    /// The component this code belongs to.
    pub fn component(self) -> Component {
        match self {
            Self::CarafeEmpty | Self::CarafeNotEmpty | Self::PlateEmpty => Component::HeaterPlate,
            Self::BoilerEmpty | Self::BoilerNotEmpty => Component::Boiler,
            Self::SwitchReleased | Self::SwitchPressed => Component::BrewSwitch,
            Self::BoilerElementOn | Self::BoilerElementOff => Component::BoilerElement,
            Self::HeaterElementOn | Self::HeaterElementOff => Component::HeaterElement,
            Self::IndicatorOn | Self::IndicatorOff | Self::IndicatorForced => {
                Component::IndicatorLight
            }
            Self::ValveOpen | Self::ValveClosed => Component::PressureValve,
        }
    }
}

macro_rules! component_states {
    (
        $(#[$meta:meta])*
        $name:ident for $component:ident {
            $($variant:ident => $code:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const COMPONENT: Component = Component::$component;
        }

        impl From<$name> for ComponentState {
            fn from(state: $name) -> Self {
                match state {
                    $($name::$variant => ComponentState::$code),+
                }
            }
        }

        impl TryFrom<ComponentState> for $name {
            type Error = Rejection;

            fn try_from(code: ComponentState) -> Result<Self, Rejection> {
                match code {
                    $(ComponentState::$code => Ok($name::$variant),)+
                    requested => Err(Rejection::OutOfDomain {
                        component: Component::$component,
                        requested,
                    }),
                }
            }
        }
    };
}

component_states! {
    /// Warming plate under the carafe.
    HeaterPlate for HeaterPlate {
        EmptyCarafe => CarafeEmpty,
        NonEmptyCarafe => CarafeNotEmpty,
        EmptyPlate => PlateEmpty,
    }
}

component_states! {
    /// Water tank; derived from the water level.
    Boiler for Boiler {
        Empty => BoilerEmpty,
        NonEmpty => BoilerNotEmpty,
    }
}

component_states! {
    /// Momentary brew button.
    BrewSwitch for BrewSwitch {
        Released => SwitchReleased,
        Pressed => SwitchPressed,
    }
}

component_states! {
    BoilerElement for BoilerElement {
        On => BoilerElementOn,
        Off => BoilerElementOff,
    }
}

component_states! {
    HeaterElement for HeaterElement {
        On => HeaterElementOn,
        Off => HeaterElementOff,
    }
}

component_states! {
    /// `Forced` is the blinking "attention" mode.
    IndicatorLight for IndicatorLight {
        On => IndicatorOn,
        Off => IndicatorOff,
        Forced => IndicatorForced,
    }
}

component_states! {
    PressureValve for PressureValve {
        Open => ValveOpen,
        Closed => ValveClosed,
    }
}

/// Boiler state implied by a water level.
pub fn boiler_for_water(water_level: u8) -> Boiler {
    if water_level == 0 {
        Boiler::Empty
    } else {
        Boiler::NonEmpty
    }
}

/// Heater plate state implied by the coffee level and carafe presence.
///
/// A removed carafe always reads as an empty plate, whatever the level.
pub fn heater_plate_for(coffee_level: u8, carafe_present: bool) -> HeaterPlate {
    match (carafe_present, coffee_level) {
        (false, _) => HeaterPlate::EmptyPlate,
        (true, 0) => HeaterPlate::EmptyCarafe,
        (true, _) => HeaterPlate::NonEmptyCarafe,
    }
}
