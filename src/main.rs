use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tab_touch::{GestureRecognizer, Point, ScriptedTouchSource, TouchDispatcher, spawn_poller};
use tabplay::config::PanelConfig;
use tabplay::library::list_media;
use tabplay::media::{NullDisplay, SnapshotDisplay, WavAudioSink};
use tabplay::{MjpegFileEngine, PlaybackSessionBuilder, PlayerConfig, QueuedSelections};

/// Plays MJPEG clips through the tabplay core, headless.
#[derive(Parser, Debug)]
#[command(name = "tabplay")]
#[command(about = "▶ Play MJPEG clips through the touchscreen player core")]
#[command(long_about = "Play a clip, or every clip in a directory in natural order, through the
touchscreen player core. Frames can be fitted to a panel and saved as PNG snapshots,
audio can be written to WAV, and recorded touch input can be replayed.")]
struct Args {
    /// Media file or directory
    #[arg(help = "Clip to play, or a directory whose clips are played in order")]
    path: PathBuf,

    #[arg(short, long, help = "JSON player configuration; missing fields use defaults")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value_t = 25, help = "Delivery rate of the file engine (0 = as fast as possible)")]
    fps: u32,

    #[arg(long, help = "Fit frames to a panel, e.g. 800x480")]
    panel: Option<String>,

    #[arg(long, help = "Never rotate frames to match the panel orientation")]
    no_rotate: bool,

    #[arg(long, help = "Write presented frames as PNG files into this directory")]
    snapshot_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 25, help = "Keep one snapshot every N presented frames")]
    snapshot_every: u64,

    #[arg(long, help = "Write forwarded PCM to numbered WAV files next to this path")]
    wav_out: Option<PathBuf>,

    #[arg(long, help = "Replay touch samples from JSON: [[[x, y], ...], ...], one sample per tick")]
    touch_script: Option<PathBuf>,

    #[arg(long, default_value_t = 20, help = "Milliseconds between replayed touch samples")]
    touch_tick_ms: u64,

    #[arg(long, help = "Print pipeline statistics as JSON when done")]
    stats_json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlayerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlayerConfig::default(),
    };
    if let Some(panel) = &args.panel {
        config.panel = Some(parse_panel(panel, !args.no_rotate)?);
    } else if let Some(panel) = config.panel.as_mut() {
        panel.allow_rotate &= !args.no_rotate;
    }
    config.validate()?;

    let mut selections = if args.path.is_dir() {
        let files = list_media(&args.path, &config.media_extensions)?;
        if files.is_empty() {
            bail!("no media files in {}", args.path.display());
        }
        QueuedSelections::new(files)
    } else {
        QueuedSelections::new([args.path.clone()])
    };

    let mut builder = PlaybackSessionBuilder::new(config.clone());
    builder = match &args.snapshot_dir {
        Some(dir) => builder.display(SnapshotDisplay::new(dir, args.snapshot_every)?),
        None => builder.display(NullDisplay),
    };
    if let Some(wav) = &args.wav_out {
        builder = builder.audio_sink(WavAudioSink::new(wav));
    }
    let session = builder.build(MjpegFileEngine::new(args.fps))?;

    let poller = match &args.touch_script {
        Some(script) => {
            let samples = load_touch_script(script)?;
            log::info!("replaying {} touch samples", samples.len());
            let source = ScriptedTouchSource::new(samples)
                .with_interval(Duration::from_millis(args.touch_tick_ms));
            let mut dispatcher = TouchDispatcher::new(GestureRecognizer::with_long_press_ticks(
                config.long_press_ticks,
            ));
            dispatcher.set_listener(session.gesture_controls().into_listener());
            Some(spawn_poller(source, dispatcher).context("starting touch poller")?)
        }
        None => None,
    };

    let report = session.coordinator().run(&mut selections);

    if let Some(handle) = poller {
        match handle.join() {
            Ok(samples) => log::debug!("touch poller consumed {} samples", samples),
            Err(_) => log::error!("touch poller panicked"),
        }
    }

    let stats = session.stats();
    log::info!(
        "done: {} played, {} failed, {} frames presented, {} dropped",
        report.played,
        report.failed,
        stats.presented,
        stats.video_dropped()
    );
    drop(session);

    if args.stats_json {
        let json = serde_json::json!({ "report": report, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    if report.played == 0 {
        return Err(anyhow!("nothing could be played"));
    }
    Ok(())
}

/// Parse a panel size like "800x480"
fn parse_panel(spec: &str, allow_rotate: bool) -> Result<PanelConfig> {
    let (w, h) = spec
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Invalid panel size: {}. Use WIDTHxHEIGHT, e.g. 800x480", spec))?;
    let width: u32 = w.trim().parse().with_context(|| format!("Invalid panel width: {}", w))?;
    let height: u32 = h.trim().parse().with_context(|| format!("Invalid panel height: {}", h))?;
    if width == 0 || height == 0 {
        bail!("Panel size must be non-zero: {}", spec);
    }
    Ok(PanelConfig {
        width,
        height,
        allow_rotate,
    })
}

/// Load recorded touch samples: a JSON array of samples, each an array of [x, y] points
fn load_touch_script(path: &Path) -> Result<Vec<Vec<Point>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading touch script {}", path.display()))?;
    let raw: Vec<Vec<[i32; 2]>> = serde_json::from_str(&text)
        .with_context(|| format!("parsing touch script {}", path.display()))?;
    Ok(raw
        .into_iter()
        .map(|sample| sample.into_iter().map(|[x, y]| Point::new(x, y)).collect())
        .collect())
}
