mod generator;
mod grid;
mod transport;

pub use generator::BeatGenerator;
pub use grid::{GridError, Pattern, SequencerGrid};
pub use transport::{StepReport, Transport, TransportState};

use rand::Rng;

/// Whatever actually makes sound for a step. The sequencer only says which
/// rows fired; playing a kick is the host's business.
pub trait VoicePlayer {
    fn trigger(&mut self, instrument: usize, label: &str);
}

/// One sequencer session: the grid it owns and the clock bound to it.
#[derive(Clone, Debug, Default)]
pub struct Session {
    grid: SequencerGrid,
    transport: Transport,
}

impl Session {
    pub fn new(grid: SequencerGrid) -> Self {
        Self {
            grid,
            transport: Transport::new(),
        }
    }

    pub fn grid(&self) -> &SequencerGrid {
        &self.grid
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn toggle(&mut self, instrument: usize, step: usize) -> Result<bool, GridError> {
        self.grid.toggle(instrument, step)
    }

    pub fn set_all(&mut self, pattern: &Pattern) -> Result<(), GridError> {
        self.grid.set_all(pattern)
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    pub fn snapshot(&self) -> Pattern {
        self.grid.snapshot()
    }

    pub fn generate<R: Rng>(
        &mut self,
        generator: &mut BeatGenerator<R>,
    ) -> Result<(), GridError> {
        generator.generate(&mut self.grid)
    }

    pub fn play(&mut self) {
        self.transport.play();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    pub fn toggle_play(&mut self) -> TransportState {
        self.transport.toggle()
    }

    pub fn rewind(&mut self) {
        self.transport.reset();
    }

    pub fn tick(&mut self) -> Option<StepReport> {
        self.transport.tick(&self.grid)
    }

    /// Tick and hand every fired row to `player`.
    pub fn tick_into<P: VoicePlayer>(&mut self, player: &mut P) -> Option<StepReport> {
        let report = self.transport.tick(&self.grid)?;
        for &instrument in &report.fired {
            if let Some(label) = self.grid.label(instrument) {
                player.trigger(instrument, label);
            }
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<(usize, String)>);

    impl VoicePlayer for Log {
        fn trigger(&mut self, instrument: usize, label: &str) {
            self.0.push((instrument, label.to_string()));
        }
    }

    #[test]
    fn tick_into_triggers_fired_rows() {
        let mut session = Session::default();
        session.toggle(0, 0).unwrap();
        session.toggle(7, 0).unwrap();
        session.play();

        let mut log = Log::default();
        let report = session.tick_into(&mut log).unwrap();
        assert_eq!(report.column, 0);
        assert_eq!(log.0, vec![(0, "Kick".to_string()), (7, "Clap".to_string())]);
    }

    #[test]
    fn stopped_session_triggers_nothing() {
        let mut session = Session::default();
        session.toggle(0, 0).unwrap();
        let mut log = Log::default();
        assert!(session.tick_into(&mut log).is_none());
        assert!(log.0.is_empty());
    }

    #[test]
    fn generate_goes_through_the_session() {
        let mut session = Session::default();
        session.generate(&mut BeatGenerator::from_seed(3)).unwrap();
        let expected = BeatGenerator::from_seed(3).pattern_for(session.grid());
        assert_eq!(session.snapshot(), expected);
    }
}
