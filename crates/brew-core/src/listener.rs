use crate::hal_sim::HardwareState;

/// Observer of accepted hardware mutations, typically a display.
///
/// Called on the mutating thread after the hardware lock is released, so
/// implementations may read the simulator. Calls from different threads can
/// interleave; `HardwareState::revision` orders them.
pub trait StateListener: Send + Sync {
    fn on_state_changed(&self, state: &HardwareState);
}

impl<F> StateListener for F
where
    F: Fn(&HardwareState) + Send + Sync,
{
    fn on_state_changed(&self, state: &HardwareState) {
        self(state)
    }
}
