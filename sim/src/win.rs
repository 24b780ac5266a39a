#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinState {
    #[default]
    NotWon,
    Won,
}

/// Sticky win latch for one level instance.
#[derive(Debug, Clone, Default)]
pub struct WinDetector {
    state: WinState,
}

impl WinDetector {
    pub fn state(&self) -> WinState {
        self.state
    }

    pub fn is_won(&self) -> bool {
        self.state == WinState::Won
    }

    /// Returns true only on the frame the level becomes won.
    pub fn update(&mut self, occupied: usize, total: usize) -> bool {
        if self.is_won() || total == 0 || occupied < total {
            return false;
        }
        self.state = WinState::Won;
        true
    }
}
