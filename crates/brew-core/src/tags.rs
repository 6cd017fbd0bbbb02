/// Stable name of an observable quantity across logs, journal and metrics.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub key: &'static str,
    pub metric: &'static str,
    pub help: &'static str,
}

pub const WATER_LEVEL: Tag = Tag {
    key: "water_level",
    metric: "brewsim_water_level",
    help: "Water left in the boiler (0-100)",
};

pub const COFFEE_LEVEL: Tag = Tag {
    key: "coffee_level",
    metric: "brewsim_coffee_level",
    help: "Coffee brewed into the carafe (0-100)",
};

pub const STATE_CHANGES: Tag = Tag {
    key: "state_changes",
    metric: "brewsim_state_changes_total",
    help: "Accepted hardware mutations",
};

pub const BREW_TICKS: Tag = Tag {
    key: "brew_ticks",
    metric: "brewsim_brew_ticks_total",
    help: "Microcontroller ticks executed",
};

pub const BREW_TRANSFERS: Tag = Tag {
    key: "brew_transfers",
    metric: "brewsim_brew_transfers_total",
    help: "Units of water brewed into coffee",
};
