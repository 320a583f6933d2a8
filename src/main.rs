use air_strum::audio::{midi_to_hz, AudioCommand, ChannelAudio};
use air_strum::config::{GameConfig, UnmatchedStrumPolicy};
use air_strum::coordinator::Coordinator;
use air_strum::game::{Game, TickReport};
use air_strum::judgment::Grade;
use air_strum::note_stream::LcgFretPicker;
use air_strum::simulator::{self, Simulator};
use air_strum::types::*;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{debug, error, info};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "air-strum")]
#[command(about = "Air-guitar strum detection and rhythm judgment (simulated session)")]
struct Cli {
    /// Game config JSON; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to this path and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Viewport width (px)
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height (px)
    #[arg(long)]
    height: Option<f32>,

    /// Estimator frame rate (Hz)
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Minimum strum speed (px/frame)
    #[arg(long)]
    velocity_threshold: Option<f32>,

    /// Judgment window half-width (px)
    #[arg(long)]
    hit_window: Option<f32>,

    /// Number of passes through the demo sequence
    #[arg(long, default_value_t = 1)]
    repeats: u32,

    /// Play a muted chuck when a strum matches no note
    #[arg(long)]
    unmatched_muted: bool,

    /// Seed for note fret selection (default: time-based)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let config = effective_config(&cli);
    if let Some(path) = &cli.save_config {
        config.save(path)?;
    }

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    });

    info!("═══════════════════════════════════════════════");
    info!("  AIR STRUM v{}", env!("CARGO_PKG_VERSION"));
    info!("  Viewport: {}x{} @ {} fps", config.viewport.width, config.viewport.height, cli.fps);
    info!("  Strum threshold: {} px/frame, window ±{} px",
          config.velocity_threshold, config.hit_window);
    info!("  Unmatched strum: {:?}", config.unmatched_strum);
    info!("  Seed: {}", seed);
    info!("═══════════════════════════════════════════════");

    // Channel: inputs → coordinator
    let (input_tx, input_rx) = bounded::<InputEvent>(4096);

    // Channels: coordinator → consumers
    let (report_tx, report_rx) = bounded::<TickReport>(1024);
    let (audio_tx, audio_rx) = bounded::<AudioCommand>(256);
    let (peer_tx, peer_rx) = bounded::<String>(256);

    let mut handles = Vec::new();

    // ─── Judgment display ───────────────────────────────────────────
    handles.push(thread::Builder::new().name("display".into()).spawn(move || {
        for report in report_rx.iter() {
            for j in &report.judgments {
                match j.grade {
                    Grade::Miss => info!("{:>7}  note {:<4} fret {:>2}", j.grade, j.note_id, j.target_fret),
                    _ => info!("{:>7}  note {:<4} fret {:>2}  +{:<5} combo {}",
                               j.grade, j.note_id, j.target_fret, j.score_delta, j.combo_after),
                }
            }
        }
    })?);

    // ─── Audio output (logged; no synth attached) ───────────────────
    handles.push(thread::Builder::new().name("audio".into()).spawn(move || {
        for cmd in audio_rx.iter() {
            match cmd {
                AudioCommand::Strum { frets, direction, voices } => {
                    let notes: Vec<String> = voices
                        .iter()
                        .map(|v| format!("{}@{:.0}Hz", STRING_NAMES[v.string], midi_to_hz(v.midi as f64)))
                        .collect();
                    debug!("audio: {} strum frets={:?} [{}]", direction, frets, notes.join(" "));
                }
                AudioCommand::Muted => debug!("audio: muted chuck"),
            }
        }
    })?);

    // ─── Peer outbound ──────────────────────────────────────────────
    handles.push(thread::Builder::new().name("peer".into()).spawn(move || {
        for text in peer_rx.iter() {
            debug!("peer → {}", text);
        }
    })?);

    // ─── Coordinator ────────────────────────────────────────────────
    let game = Game::new(config.clone(), Box::new(LcgFretPicker::new(seed)));
    let coordinator = thread::Builder::new().name("coordinator".into()).spawn(move || {
        let audio = Box::new(ChannelAudio::new(audio_tx));
        let mut coord = Coordinator::new(input_rx, vec![report_tx], audio, game)
            .with_peer_sync(peer_tx);
        coord.run()
    })?;

    // ─── Input source ───────────────────────────────────────────────
    info!("Starting simulator...");
    let events = Simulator::demo(&config, cli.fps, cli.repeats);
    handles.push(thread::Builder::new().name("simulator".into()).spawn(move || {
        simulator::replay(events, input_tx);
    })?);

    match coordinator.join() {
        Ok(summary) => {
            info!("═══════════════════════════════════════════════");
            info!("  Final score: {}", summary.score);
            info!("  Max combo:   {}", summary.max_combo);
            info!("  Perfect {}  Great {}  Miss {}",
                  summary.counts.perfect, summary.counts.great, summary.counts.miss);
            info!("  Accuracy:    {:.1}%", summary.accuracy() * 100.0);
            info!("═══════════════════════════════════════════════");
        }
        Err(_) => error!("coordinator thread panicked"),
    }

    for h in handles {
        let _ = h.join();
    }
    Ok(())
}

/// Config file (if any) with command-line overrides applied on top.
fn effective_config(cli: &Cli) -> GameConfig {
    let mut config = cli
        .config
        .as_deref()
        .and_then(GameConfig::load)
        .unwrap_or_default();

    if let Some(w) = cli.width {
        config.viewport.width = w;
    }
    if let Some(h) = cli.height {
        config.viewport.height = h;
    }
    if let Some(v) = cli.velocity_threshold {
        config.velocity_threshold = v;
    }
    if let Some(w) = cli.hit_window {
        config.hit_window = w;
    }
    if cli.unmatched_muted {
        config.unmatched_strum = UnmatchedStrumPolicy::Muted;
    }
    config
}
