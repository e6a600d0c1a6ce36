//! End-to-end tests: MJPEG files on disk through the real engine, decoder and sinks

mod common;

use std::fs;

use common::{RecordingAudioSink, RecordingDisplay, WAIT, jpeg};
use tabplay::config::PanelConfig;
use tabplay::library::list_media;
use tabplay::media::Size;
use tabplay::{MjpegFileEngine, PlaybackSessionBuilder, PlayerConfig, QueuedSelections};
use tempfile::TempDir;

fn write_clip(dir: &TempDir, name: &str, frames: usize, width: u32, height: u32) {
    let data = jpeg(width, height, [30, 160, 220]).repeat(frames);
    fs::write(dir.path().join(name), data).unwrap();
}

/// Test that every frame of a file is decoded and presented at its size
#[test]
fn test_file_frames_reach_display() {
    let dir = TempDir::new().unwrap();
    write_clip(&dir, "clip.mjpeg", 3, 32, 16);

    let display = RecordingDisplay::default();
    let session = PlaybackSessionBuilder::new(PlayerConfig::default())
        .display(display.clone())
        .build(MjpegFileEngine::new(0))
        .unwrap();

    session.play(&dir.path().join("clip.mjpeg")).unwrap();
    assert!(session.completion().take_timeout(WAIT));
    assert!(common::wait_until(WAIT, || display.count() == 3));

    assert!(display.sizes.lock().unwrap().iter().all(|s| *s == Size::new(32, 16)));
    let stats = session.stats();
    assert_eq!(stats.decoded, 3);
    assert_eq!(stats.video_dropped(), 0);
}

/// Test that frames are fitted to a rotated panel
#[test]
fn test_panel_fit_presents_panel_size() {
    let dir = TempDir::new().unwrap();
    write_clip(&dir, "wide.mjpeg", 2, 64, 32);

    let display = RecordingDisplay::default();
    let config = PlayerConfig {
        panel: Some(PanelConfig {
            width: 24,
            height: 40,
            allow_rotate: true,
        }),
        ..Default::default()
    };
    let session = PlaybackSessionBuilder::new(config)
        .display(display.clone())
        .build(MjpegFileEngine::new(0))
        .unwrap();

    session.play(&dir.path().join("wide.mjpeg")).unwrap();
    assert!(session.completion().take_timeout(WAIT));
    assert!(common::wait_until(WAIT, || display.count() == 2));
    assert!(display.sizes.lock().unwrap().iter().all(|s| *s == Size::new(24, 40)));
}

/// Test that a sibling WAV is announced and forwarded
#[test]
fn test_sibling_wav_reaches_audio_sink() {
    let dir = TempDir::new().unwrap();
    write_clip(&dir, "talk.mjpeg", 4, 8, 8);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 200,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(dir.path().join("talk.wav"), spec).unwrap();
    for s in 0..200i16 {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let sink = RecordingAudioSink::default();
    let session = PlaybackSessionBuilder::new(PlayerConfig::default())
        .audio_sink(sink.clone())
        .build(MjpegFileEngine::new(20))
        .unwrap();

    session.play(&dir.path().join("talk.mjpeg")).unwrap();
    assert!(session.completion().take_timeout(WAIT));

    let clocks = sink.clocks.lock().unwrap();
    assert_eq!(clocks.len(), 1);
    assert_eq!(clocks[0].sample_rate, 200);
    // 200 Hz mono 16-bit at 20 fps: 20 bytes per frame
    assert_eq!(sink.pcm.lock().unwrap().len(), 80);
}

/// Test a directory played in natural order by the coordinator
#[test]
fn test_directory_played_in_natural_order() {
    let dir = TempDir::new().unwrap();
    write_clip(&dir, "part10.mjpeg", 1, 8, 8);
    write_clip(&dir, "part2.mjpeg", 2, 8, 8);
    fs::write(dir.path().join("readme.txt"), "not media").unwrap();
    fs::write(dir.path().join("part3.avi"), "not a jpeg stream").unwrap();

    let config = PlayerConfig::default();
    let files = list_media(dir.path(), &config.media_extensions).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["part2.mjpeg", "part3.avi", "part10.mjpeg"]);

    let display = RecordingDisplay::default();
    let session = PlaybackSessionBuilder::new(config)
        .display(display.clone())
        .build(MjpegFileEngine::new(0))
        .unwrap();
    let report = session.coordinator().run(&mut QueuedSelections::new(files));

    assert_eq!(report.played, 2);
    assert_eq!(report.failed, 1);
    assert!(common::wait_until(WAIT, || display.count() == 3));
}
