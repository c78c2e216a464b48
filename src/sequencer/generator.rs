// Random beat generation. Every cell is an independent coin flip.
//
// The random source is always handed in, so a seeded generator reproduces the
// same beat and tests never depend on ambient randomness.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::debug;

use super::grid::{GridError, Pattern, SequencerGrid};
use crate::shared::STEPS_PER_PATTERN;

const ACTIVE_PROBABILITY: f64 = 0.5;

pub struct BeatGenerator<R = Pcg64> {
    rng: R,
}

impl BeatGenerator<Pcg64> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Pcg64::seed_from_u64(seed))
    }

    // seeded from the thread rng, for when the host doesn't care
    pub fn from_entropy() -> Self {
        Self::new(Pcg64::from_rng(&mut rand::rng()))
    }
}

impl<R: Rng> BeatGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw a fresh pattern shaped for `grid` without touching it.
    pub fn pattern_for(&mut self, grid: &SequencerGrid) -> Pattern {
        let rows = (0..grid.instrument_count())
            .map(|_| {
                (0..STEPS_PER_PATTERN)
                    .map(|_| self.rng.random_bool(ACTIVE_PROBABILITY))
                    .collect()
            })
            .collect();
        Pattern::new(rows)
    }

    /// Overwrite the whole grid with a random pattern. The pattern is built
    /// first and applied in one `set_all`, so there is no half-written grid.
    pub fn generate(&mut self, grid: &mut SequencerGrid) -> Result<(), GridError> {
        let pattern = self.pattern_for(grid);
        grid.set_all(&pattern)?;
        debug!(active = pattern.active_count(), "generated beat");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_beat() {
        let mut a = SequencerGrid::default();
        let mut b = SequencerGrid::default();
        BeatGenerator::from_seed(42).generate(&mut a).unwrap();
        BeatGenerator::from_seed(42).generate(&mut b).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SequencerGrid::default();
        let mut b = SequencerGrid::default();
        BeatGenerator::from_seed(1).generate(&mut a).unwrap();
        BeatGenerator::from_seed(2).generate(&mut b).unwrap();
        // 160 coin flips agreeing everywhere would be astronomically unlikely
        assert_ne!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn density_converges_to_half() {
        let mut grid = SequencerGrid::default();
        let mut active = 0;
        let mut total = 0;
        for seed in 0..200 {
            BeatGenerator::from_seed(seed).generate(&mut grid).unwrap();
            let snap = grid.snapshot();
            active += snap.active_count();
            total += snap.cell_count();
        }
        let ratio = active as f64 / total as f64;
        assert!((ratio - 0.5).abs() < 0.02, "ratio was {ratio}");
    }

    #[test]
    fn generate_overwrites_previous_state() {
        let mut grid = SequencerGrid::default();
        let mut generator = BeatGenerator::from_seed(7);
        let expected = BeatGenerator::from_seed(7).pattern_for(&grid);
        for step in 0..STEPS_PER_PATTERN {
            grid.toggle(0, step).unwrap();
        }
        generator.generate(&mut grid).unwrap();
        assert_eq!(grid.snapshot(), expected);
    }

    #[test]
    fn generate_fits_any_kit_size() {
        for rows in [1, 3, 10] {
            let labels: Vec<String> = (0..rows).map(|i| format!("row {i}")).collect();
            let mut grid = SequencerGrid::new(labels);
            BeatGenerator::from_seed(11).generate(&mut grid).unwrap();
            assert_eq!(grid.snapshot().shape(), (rows, STEPS_PER_PATTERN));
        }
    }
}
