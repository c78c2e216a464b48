// The step matrix: fixed instrument rows x 16 steps of plain booleans.
//
// The UI never stores step state itself; it toggles cells here and reads
// snapshots back to draw them.

use thiserror::Error;
use tracing::debug;

use crate::shared::{DEFAULT_INSTRUMENTS, STEPS_PER_PATTERN};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({instrument}, {step}) is outside the {instruments}x16 grid")]
    IndexOutOfRange {
        instrument: usize,
        step: usize,
        instruments: usize,
    },
    #[error("pattern shape {}x{} does not match grid shape {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// An owned copy of a grid's cells, row-major (`rows[instrument][step]`).
///
/// Snapshots handed out by [`SequencerGrid::snapshot`] never alias the grid.
/// A `Pattern` built by a caller may have any shape; the grid checks it on
/// [`SequencerGrid::set_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    rows: Vec<Vec<bool>>,
}

impl Pattern {
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    // all steps off, standard width
    pub fn empty(instruments: usize) -> Self {
        Self {
            rows: vec![vec![false; STEPS_PER_PATTERN]; instruments],
        }
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn get(&self, instrument: usize, step: usize) -> Option<bool> {
        self.rows.get(instrument)?.get(step).copied()
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&on| on).count()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// (rows, width). For a ragged pattern the width is that of the first row
    /// that differs from the standard 16, so a mismatch report points at it.
    pub fn shape(&self) -> (usize, usize) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .find(|&len| len != STEPS_PER_PATTERN)
            .unwrap_or(STEPS_PER_PATTERN);
        (self.rows.len(), width)
    }
}

impl From<Vec<Vec<bool>>> for Pattern {
    fn from(rows: Vec<Vec<bool>>) -> Self {
        Self::new(rows)
    }
}

#[derive(Clone, Debug)]
pub struct SequencerGrid {
    labels: Box<[String]>, // fixed at construction
    cells: Vec<[bool; STEPS_PER_PATTERN]>,
}

impl Default for SequencerGrid {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUMENTS)
    }
}

impl SequencerGrid {
    /// Build an all-off grid with one row per label. The row count and order
    /// never change afterwards.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Box<[String]> = labels.into_iter().map(Into::into).collect();
        let cells = vec![[false; STEPS_PER_PATTERN]; labels.len()];
        Self { labels, cells }
    }

    pub fn instrument_count(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, instrument: usize) -> Option<&str> {
        self.labels.get(instrument).map(String::as_str)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.labels.len(), STEPS_PER_PATTERN)
    }

    pub fn is_active(&self, instrument: usize, step: usize) -> Result<bool, GridError> {
        self.check_bounds(instrument, step)?;
        Ok(self.cells[instrument][step])
    }

    /// Flip one cell and return its new value.
    pub fn toggle(&mut self, instrument: usize, step: usize) -> Result<bool, GridError> {
        self.check_bounds(instrument, step)?;
        let cell = &mut self.cells[instrument][step];
        *cell = !*cell;
        debug!(instrument, step, active = *cell, "toggled step");
        Ok(*cell)
    }

    /// Replace every cell from `pattern`. The shape is checked up front, so a
    /// rejected pattern leaves the grid exactly as it was.
    pub fn set_all(&mut self, pattern: &Pattern) -> Result<(), GridError> {
        let found = pattern.shape();
        if found != self.shape() {
            return Err(GridError::ShapeMismatch {
                expected: self.shape(),
                found,
            });
        }
        for (dst, src) in self.cells.iter_mut().zip(pattern.rows()) {
            dst.copy_from_slice(src);
        }
        debug!(active = pattern.active_count(), "replaced pattern");
        Ok(())
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            *row = [false; STEPS_PER_PATTERN];
        }
    }

    pub fn snapshot(&self) -> Pattern {
        Pattern::new(self.cells.iter().map(|row| row.to_vec()).collect())
    }

    // active instrument rows at one step, in row order
    pub(crate) fn active_at(&self, step: usize) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(step).copied().unwrap_or(false))
            .map(|(instrument, _)| instrument)
            .collect()
    }

    fn check_bounds(&self, instrument: usize, step: usize) -> Result<(), GridError> {
        if instrument >= self.cells.len() || step >= STEPS_PER_PATTERN {
            return Err(GridError::IndexOutOfRange {
                instrument,
                step,
                instruments: self.cells.len(),
            });
        }
        Ok(())
    }
}
