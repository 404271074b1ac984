//! State broadcaster: owns the installer state and its single observer.

use std::fmt;

use super::state::InstallerState;

/// Observer invoked with the live state after every mutation.
pub type Observer = Box<dyn FnMut(&InstallerState) + Send>;

/// Holds the [`InstallerState`] and pushes it to the observer on demand.
///
/// Every mutation path goes through `&mut Broadcaster`, so there is exactly
/// one writer at a time.
pub struct Broadcaster {
    state: InstallerState,
    observer: Observer,
}

impl Broadcaster {
    /// Create a broadcaster with default state.
    pub fn new(observer: Observer) -> Self {
        Self {
            state: InstallerState::default(),
            observer,
        }
    }

    /// Current state.
    pub fn state(&self) -> &InstallerState {
        &self.state
    }

    /// Mutable access without notifying.
    pub fn state_mut(&mut self) -> &mut InstallerState {
        &mut self.state
    }

    /// Push the current state to the observer.
    pub fn notify(&mut self) {
        (self.observer)(&self.state);
    }

    /// Apply `f` to the state, then notify.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut InstallerState) -> R) -> R {
        let result = f(&mut self.state);
        self.notify();
        result
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
