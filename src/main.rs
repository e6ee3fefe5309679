use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use squat_counter::config::Config;
use squat_counter::protocol::{self, Command, FrameClock, MetricsResponse, ResetResponse};
use squat_counter::squat::{FrameStatus, SquatSession};

/// ランドマーク列 (JSON Lines) を再生してスクワットを数える
#[derive(Parser, Debug)]
#[command(name = "squat-counter", version = env!("GIT_VERSION"))]
struct Args {
    /// 設定ファイル
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// 入力ファイル (省略または "-" で標準入力)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// t_ms が無いレコードのフレームレート
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

#[derive(Default)]
struct Summary {
    frames: u64,
    no_detection: u64,
    sensor_noise: u64,
    form_invalid: u64,
    faults: u64,
    bad_lines: u64,
}

impl Summary {
    fn record(&mut self, status: &FrameStatus) {
        self.frames += 1;
        match status {
            FrameStatus::Tracked => {}
            FrameStatus::NoDetection => self.no_detection += 1,
            FrameStatus::SensorNoise => self.sensor_noise += 1,
            FrameStatus::FormInvalid(_) => self.form_invalid += 1,
            FrameStatus::Fault(_) => self.faults += 1,
        }
    }
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = File::open(p).with_context(|| format!("failed to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(&args.config);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log.level.as_str()))
        .init();

    log::info!("squat-counter {}", env!("GIT_VERSION"));
    log::info!(
        "knee<{} hip<{} range={}..={} frames={} cooldown={}ms decay={:?} window={}",
        config.squat.knee_threshold,
        config.squat.hip_threshold,
        config.squat.min_angle,
        config.squat.max_angle,
        config.squat.required_frames,
        config.squat.cooldown_ms,
        config.squat.decay,
        config.squat.smoothing_window
    );

    let input = open_input(args.input.as_ref())?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut session = SquatSession::new(&config.squat);
    let mut summary = Summary::default();
    let mut clock = FrameClock::new(Instant::now(), args.fps);

    for (line_no, line) in input.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        match protocol::parse_record(&line) {
            Ok(Command::Reset) => {
                session.reset();
                serde_json::to_writer(&mut out, &ResetResponse::ok())?;
            }
            Ok(Command::Frame(record)) => {
                let Some(at) = clock.timestamp(record.t_ms) else {
                    log::warn!("line {}: timestamp {:?} out of range", line_no + 1, record.t_ms);
                    summary.bad_lines += 1;
                    continue;
                };
                let metrics = session.process_frame_at(record.landmarks.as_deref(), at);
                summary.record(&metrics.status);
                serde_json::to_writer(&mut out, &MetricsResponse::from(&metrics))?;
            }
            Err(e) => {
                log::warn!("line {}: {}", line_no + 1, e);
                summary.bad_lines += 1;
                continue;
            }
        }
        writeln!(out)?;
    }
    out.flush()?;

    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Reps: {}", session.counter());
    eprintln!("Stage: {}", session.stage());
    eprintln!(
        "Frames: {} (no detection {}, sensor noise {}, form invalid {}, faults {})",
        summary.frames, summary.no_detection, summary.sensor_noise, summary.form_invalid, summary.faults
    );
    if summary.bad_lines > 0 {
        eprintln!("Skipped lines: {}", summary.bad_lines);
    }

    Ok(())
}
