use std::f32::consts::TAU;
use std::time::Duration;

use beatscope::audio::{render, wav, ColorScale, RenderOptions};
use beatscope::shared::SAMPLE_RATE;
use beatscope::{PlaybackState, Recorder, RecorderError, RecordingState};

fn tone(freq: f32, len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            ((TAU * freq * t).sin() * 0.5 * i16::MAX as f32) as i16
        })
        .collect()
}

#[test]
fn one_second_of_a_440_hz_tone() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(dir.path().join("temp_audio.wav"));

    recorder.start().unwrap();
    // the capture source delivers in blocks, like a device callback would
    for block in tone(440.0, SAMPLE_RATE as usize).chunks(512) {
        recorder.feed(block).unwrap();
    }
    let take = recorder.stop().unwrap();
    assert_eq!(recorder.state(), RecordingState::Idle);

    let mut reader = hound::WavReader::open(&take.container).unwrap();
    let spec = reader.spec();
    assert_eq!((spec.channels, spec.sample_rate, spec.bits_per_sample), (1, 44100, 16));
    assert_eq!(reader.duration(), 44100);
    assert_eq!(take.duration, Duration::from_secs(1));
    let on_disk: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(on_disk.as_slice(), recorder.buffer().samples());

    let spectrogram = take.spectrogram.as_ref().expect("spectrogram for a full second");
    let bin = spectrogram.dominant_bin().unwrap();
    let hz = spectrogram.bin_hz(bin);
    assert!(
        (hz - 440.0).abs() <= spectrogram.bin_resolution(),
        "dominant bin {bin} at {hz} Hz"
    );

    let image = render(spectrogram, &RenderOptions::default());
    assert_eq!(image.dimensions(), (512, 512));
}

#[test]
fn empty_take_is_valid_and_silent() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(dir.path().join("temp_audio.wav"));

    recorder.start().unwrap();
    let take = recorder.stop().unwrap();

    assert!(take.spectrogram.is_none());
    assert_eq!(take.samples, 0);
    assert!(wav::load(&take.container).unwrap().is_empty());
    // still playable as far as the state machine is concerned
    recorder.play().unwrap();
    assert_eq!(recorder.playback(), PlaybackState::Playing);
}

#[test]
fn each_stop_overwrites_the_container() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(dir.path().join("temp_audio.wav"));

    recorder.start().unwrap();
    recorder.feed(&tone(220.0, 10_000)).unwrap();
    let first = recorder.stop().unwrap();

    recorder.start().unwrap();
    recorder.feed(&[7; 300]).unwrap();
    let second = recorder.stop().unwrap();

    assert_eq!(first.container, second.container);
    assert_eq!(wav::load(&second.container).unwrap().samples(), &[7; 300]);
    assert_eq!(recorder.take().unwrap().samples, 300);
    assert!(second.spectrogram.is_some());
    assert!(!std::sync::Arc::ptr_eq(
        first.spectrogram.as_ref().unwrap(),
        second.spectrogram.as_ref().unwrap()
    ));
}

#[test]
fn background_render_matches_inline_render() {
    let dir = tempfile::tempdir().unwrap();
    let mut inline = Recorder::new(dir.path().join("inline.wav"));
    let mut deferred = Recorder::new(dir.path().join("deferred.wav"));
    let samples = tone(1000.0, 20_000);

    inline.start().unwrap();
    inline.feed(&samples).unwrap();
    let expected = inline.stop().unwrap();

    deferred.start().unwrap();
    deferred.feed(&samples).unwrap();
    deferred.stop_deferred().unwrap();
    assert!(matches!(deferred.stop(), Err(RecorderError::NotRecording)));

    let mut got = None;
    for _ in 0..500 {
        if let Some(done) = deferred.poll_completed().pop() {
            got = Some(done.unwrap());
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let got = got.expect("background render finished");
    assert_eq!(got.spectrogram, expected.spectrogram);
    assert_eq!(
        wav::load(&got.container).unwrap(),
        wav::load(&expected.container).unwrap()
    );

    let options = RenderOptions {
        width: 32,
        height: 32,
        color_scale: ColorScale::Heat,
        ..Default::default()
    };
    assert_eq!(
        render(got.spectrogram.as_ref().unwrap(), &options),
        render(expected.spectrogram.as_ref().unwrap(), &options)
    );
}

#[test]
fn errors_convert_into_the_crate_error() {
    fn start_twice(recorder: &mut Recorder) -> beatscope::Result<()> {
        recorder.start()?;
        recorder.start()?;
        Ok(())
    }
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(dir.path().join("temp_audio.wav"));
    let err = start_twice(&mut recorder).unwrap_err();
    assert!(matches!(
        err,
        beatscope::Error::Recorder(RecorderError::AlreadyRecording)
    ));
    assert_eq!(err.to_string(), "already recording");
}
