// Transport clock: play/pause plus a playhead that only moves on tick().
//
// Nothing here looks at wall-clock time. The host owns the timer and calls
// tick() once per step; see the scheduler in the binary.

use tracing::debug;

use super::grid::SequencerGrid;
use crate::shared::STEPS_PER_PATTERN;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

/// What one tick produced: the column the playhead moved to and the
/// instrument rows that are active there, in row order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub column: usize,
    pub fired: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct Transport {
    state: TransportState,
    column: usize,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    // Parked on the last column so the first tick after play() lands on step 0.
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            column: STEPS_PER_PATTERN - 1,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn play(&mut self) {
        if self.state != TransportState::Playing {
            debug!(column = self.column, "transport playing");
            self.state = TransportState::Playing;
        }
    }

    // keeps the column; play() resumes from here
    pub fn pause(&mut self) {
        if self.state != TransportState::Stopped {
            debug!(column = self.column, "transport paused");
            self.state = TransportState::Stopped;
        }
    }

    pub fn toggle(&mut self) -> TransportState {
        match self.state {
            TransportState::Playing => self.pause(),
            TransportState::Stopped => self.play(),
        }
        self.state
    }

    /// Rewind so the next tick plays step 0 again. Play state is untouched.
    pub fn reset(&mut self) {
        self.column = STEPS_PER_PATTERN - 1;
    }

    /// Advance one step and report the active cells in the new column.
    /// Returns `None` and leaves the playhead alone while stopped.
    pub fn tick(&mut self, grid: &SequencerGrid) -> Option<StepReport> {
        if self.state != TransportState::Playing {
            return None;
        }
        self.column = (self.column + 1) % STEPS_PER_PATTERN;
        Some(StepReport {
            column: self.column,
            fired: grid.active_at(self.column),
        })
    }
}
