use std::sync::atomic::{AtomicU8, Ordering};

/// Where a mesh asset's geometry currently lives.
///
/// Transitions only ever move forward: `Unloaded -> Loaded -> Resident`. There is no way back,
/// an evicted asset is dropped instead of being reset.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum ResidencyState {
    /// No render geometry has been populated
    #[default]
    Unloaded = 0u8,
    /// Render geometry is on the CPU only
    Loaded = 1u8,
    /// Render geometry has been transferred to the device
    Resident = 2u8,
}

impl ResidencyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ResidencyState::Unloaded,
            1 => ResidencyState::Loaded,
            _ => ResidencyState::Resident,
        }
    }
}

/// Atomic holder for [`ResidencyState`] which refuses backward transitions
#[derive(Debug, Default)]
pub(crate) struct Residency {
    state: AtomicU8,
}

impl Residency {
    pub(crate) fn get(&self) -> ResidencyState {
        ResidencyState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves to `next` if it is not behind the current state, returns the state afterwards
    pub(crate) fn advance(&self, next: ResidencyState) -> ResidencyState {
        let previous = self.state.fetch_max(next as u8, Ordering::AcqRel);
        ResidencyState::from_u8(previous.max(next as u8))
    }
}
