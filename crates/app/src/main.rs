use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use viseme_sync_core::{
    Chunk, ChunkId, ChunkSubmission, ClockedBackend, EngineConfig, ManualClock, SyncEngine,
};

fn main() -> viseme_sync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            chunks,
            config,
            fps,
            muted,
            max_seconds,
        } => run_simulate(&chunks, config.as_ref(), fps, muted, max_seconds),
        Commands::Timeline { chunks, config } => run_timeline(&chunks, config.as_ref()),
    }
}

fn load_config(path: Option<&PathBuf>) -> viseme_sync_core::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path),
        None => Ok(EngineConfig::default()),
    }
}

fn load_chunks(path: &PathBuf) -> viseme_sync_core::Result<Vec<ChunkSubmission>> {
    let text = std::fs::read_to_string(path)?;
    ChunkSubmission::parse_many(&text)
}

fn run_simulate(
    chunks: &PathBuf,
    config: Option<&PathBuf>,
    fps: f64,
    muted: bool,
    max_seconds: f64,
) -> viseme_sync_core::Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(viseme_sync_core::VisemeSyncError::msg(format!(
            "render rate must be positive, got {fps}"
        )));
    }

    let config = load_config(config)?;
    let submissions = load_chunks(chunks)?;
    tracing::info!(?chunks, count = submissions.len(), fps, muted, "starting simulation");

    let clock = ManualClock::new();
    let mut engine = SyncEngine::with_clock(config, clock.clone())?
        .with_backend(ClockedBackend::new(clock.clone()));
    engine.set_muted(muted);
    for submission in submissions {
        engine.submit(submission);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let tick = 1.0 / fps;
    let mut time = 0.0;
    loop {
        let pose = engine.frame();
        let status = engine.status();
        for event in engine.drain_events() {
            tracing::debug!(?event, time, "engine event");
        }
        let line = serde_json::json!({
            "time": time,
            "chunk": status.active.map(|ChunkId(id)| id),
            "position": status.position,
            "pose": pose.channels(),
        });
        writeln!(out, "{line}")?;

        if status.active.is_none() && status.pending == 0 {
            break;
        }
        if time >= max_seconds {
            tracing::warn!(max_seconds, "simulation cut off before all chunks finished");
            break;
        }
        clock.advance(tick);
        time += tick;
    }
    out.flush()?;
    Ok(())
}

fn run_timeline(chunks: &PathBuf, config: Option<&PathBuf>) -> viseme_sync_core::Result<()> {
    let config = load_config(config)?;
    let submissions = load_chunks(chunks)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (index, submission) in submissions.into_iter().enumerate() {
        let chunk = Chunk::from_submission(ChunkId(index as u64 + 1), submission, &config.timeline);
        let timeline = chunk.timeline();
        let line = serde_json::json!({
            "chunk": chunk.id().0,
            "frames": chunk.frames().len(),
            "source": timeline.source(),
            "raw_times": timeline.raw(),
            "duration": timeline.duration(),
            "audio": chunk.audio().map(|audio| audio.encoding().to_string()),
        });
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Viseme chunk synchronization engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a chunk file through the engine and print one pose per frame.
    Simulate {
        /// JSON file holding one chunk submission or an array of them.
        chunks: PathBuf,
        /// Optional engine configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Render rate of the simulated consumer.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Start with audio muted.
        #[arg(long)]
        muted: bool,
        /// Stop after this many simulated seconds.
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f64,
    },
    /// Print the resolved time axis of every chunk in a file.
    Timeline {
        chunks: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
