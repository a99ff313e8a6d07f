//! Desktop runner: replays detector output through a tracking session.
//!
//! Reads one `FrameInput` JSON object per line and writes one
//! `TrackingResult` JSON object per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toytrack_models::{FrameInput, TrackingResult};
use toytrack_session::{SessionConfig, TrackingSession};

#[derive(Parser, Debug)]
#[clap(name = "toytrack", version, about = "Replay detector output through the ToyTrack tracker")]
struct Args {
    /// JSON lines file with one frame of detections per line
    #[clap(short, long, required_unless_present = "print-schema")]
    input: Option<PathBuf>,

    /// Where to write results (stdout when omitted)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Empty frames tolerated before the track is lost
    #[clap(long)]
    buffer_frames: Option<u32>,

    /// Image width in pixels
    #[clap(long, default_value_t = 640)]
    width: u32,

    /// Image height in pixels
    #[clap(long, default_value_t = 480)]
    height: u32,

    /// Print the JSON schemas of the input and output lines and exit
    #[clap(long)]
    print_schema: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("toytrack=info,toytrack_core=info,toytrack_session=info"));

    // Logs go to stderr so results can be piped from stdout.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn print_schema() -> Result<()> {
    let input = schemars::schema_for!(FrameInput);
    let output = schemars::schema_for!(TrackingResult);
    println!("{}", serde_json::to_string_pretty(&input)?);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    if args.print_schema {
        return print_schema();
    }

    let mut config = SessionConfig::from_env();
    if let Some(buffer_frames) = args.buffer_frames {
        config.buffer_frames = buffer_frames;
    }

    let mut session = TrackingSession::new(config).context("Invalid session configuration")?;
    session
        .init(args.width, args.height)
        .context("Failed to initialize session")?;
    info!(
        session_id = session.session_id(),
        width = args.width,
        height = args.height,
        buffer_frames = config.buffer_frames,
        "Starting toytrack"
    );

    let input_path = args.input.context("--input is required")?;
    let reader = BufReader::new(
        File::open(&input_path)
            .with_context(|| format!("Failed to open {}", input_path.display()))?,
    );
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut frames = 0usize;
    let mut skipped = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: FrameInput = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed frame");
                skipped += 1;
                continue;
            }
        };

        match session.process_frame(&frame) {
            Ok(result) => {
                writeln!(writer, "{}", result.to_json()?)?;
                frames += 1;
            }
            Err(e) if e.is_recoverable() => {
                warn!(line = index + 1, error = %e, "Skipping frame");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    writer.flush()?;

    info!(frames = frames, skipped = skipped, "Finished");
    session.destroy();
    Ok(())
}
