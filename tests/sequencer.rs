use beatscope::shared::{DEFAULT_INSTRUMENTS, STEPS_PER_PATTERN};
use beatscope::{BeatGenerator, GridError, Pattern, Session, SequencerGrid, TransportState};
use rand::SeedableRng;
use rand_pcg::Pcg64;

#[test]
fn host_session_walkthrough() {
    let mut session = Session::new(SequencerGrid::new(DEFAULT_INSTRUMENTS));

    // four on the floor
    for step in (0..STEPS_PER_PATTERN).step_by(4) {
        session.toggle(0, step).unwrap();
    }
    session.toggle(1, 4).unwrap();
    session.toggle(1, 12).unwrap();

    session.play();
    let fired: Vec<Vec<usize>> = (0..STEPS_PER_PATTERN)
        .map(|_| session.tick().unwrap().fired)
        .collect();
    assert_eq!(fired[0], vec![0]);
    assert_eq!(fired[4], vec![0, 1]);
    assert!(fired[5].is_empty());
    assert_eq!(fired[12], vec![0, 1]);

    // second lap repeats the first
    let again: Vec<Vec<usize>> = (0..STEPS_PER_PATTERN)
        .map(|_| session.tick().unwrap().fired)
        .collect();
    assert_eq!(again, fired);

    assert_eq!(session.toggle_play(), TransportState::Stopped);
    assert!(session.tick().is_none());
}

#[test]
fn injected_rng_drives_generation() {
    let grid = SequencerGrid::default();
    let a = BeatGenerator::new(Pcg64::seed_from_u64(99)).pattern_for(&grid);
    let b = BeatGenerator::from_seed(99).pattern_for(&grid);
    assert_eq!(a, b);
    assert_eq!(a.rows().len(), DEFAULT_INSTRUMENTS.len());
    assert!(a.rows().iter().all(|row| row.len() == STEPS_PER_PATTERN));
}

#[test]
fn bulk_pattern_requests() {
    let mut session = Session::default();
    let mut rows = vec![vec![false; STEPS_PER_PATTERN]; DEFAULT_INSTRUMENTS.len()];
    rows[2][0] = true;
    rows[2][2] = true;
    session.set_all(&Pattern::new(rows)).unwrap();
    assert_eq!(session.snapshot().active_count(), 2);

    let err = session.set_all(&Pattern::empty(4)).unwrap_err();
    assert!(matches!(err, GridError::ShapeMismatch { expected: (10, 16), found: (4, 16) }));
    assert_eq!(session.snapshot().active_count(), 2);

    session.clear();
    assert_eq!(session.snapshot(), Pattern::empty(DEFAULT_INSTRUMENTS.len()));
}
