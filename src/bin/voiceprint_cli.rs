use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use voiceprint::analysis::{LiveFrame, LiveSource, SimilarityReport, TickOutcome};
use voiceprint::audio::{load_wav, write_wav, SampleBuffer};
use voiceprint::config::AppConfig;
use voiceprint::context::AnalysisContext;
use voiceprint::fixtures::{SyntheticPattern, SyntheticSpec};

#[derive(Parser, Debug)]
#[command(
    name = "voiceprint_cli",
    about = "Extract voice features from WAV files and compare recordings"
)]
struct Cli {
    /// JSON configuration file (defaults are used when absent or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two recordings and print the similarity report
    Compare {
        a: PathBuf,
        b: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Exit with status 2 when the total score is below this value
        #[arg(long)]
        min_score: Option<f32>,
    },
    /// Print the extracted feature set of one recording as JSON
    Features {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a recording through the live monitor and print snapshots
    Monitor {
        input: PathBuf,
        /// Simulated time between ticks
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },
    /// Write a synthetic recording
    Synth {
        #[arg(long, value_enum, default_value_t = PatternArg::Voice)]
        pattern: PatternArg,
        #[arg(long, default_value_t = 220.0)]
        frequency: f32,
        #[arg(long, default_value_t = 0.8)]
        amplitude: f32,
        #[arg(long, default_value_t = 1_000)]
        duration_ms: u32,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Sine,
    Voice,
    WhiteNoise,
    Silence,
}

impl From<PatternArg> for SyntheticPattern {
    fn from(value: PatternArg) -> Self {
        match value {
            PatternArg::Sine => SyntheticPattern::Sine,
            PatternArg::Voice => SyntheticPattern::Voice,
            PatternArg::WhiteNoise => SyntheticPattern::WhiteNoise,
            PatternArg::Silence => SyntheticPattern::Silence,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    voiceprint::init_logging(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    });

    let config = cli
        .config
        .as_deref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Compare {
            a,
            b,
            json,
            min_score,
        } => run_compare(config, &a, &b, json, min_score),
        Commands::Features { input, output } => run_features(config, &input, output),
        Commands::Monitor { input, tick_ms } => run_monitor(config, &input, tick_ms),
        Commands::Synth {
            pattern,
            frequency,
            amplitude,
            duration_ms,
            sample_rate,
            output,
        } => {
            let spec = SyntheticSpec::new(pattern.into(), frequency)
                .with_amplitude(amplitude)
                .with_duration_ms(duration_ms)
                .with_sample_rate(sample_rate);
            write_wav(&output, &spec.generate())
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {}", output.display());
            Ok(ExitCode::from(0))
        }
    }
}

fn load(path: &Path) -> Result<SampleBuffer> {
    load_wav(path).with_context(|| format!("loading {}", path.display()))
}

fn run_compare(
    config: AppConfig,
    a: &Path,
    b: &Path,
    json: bool,
    min_score: Option<f32>,
) -> Result<ExitCode> {
    let ctx = AnalysisContext::new(config).context("invalid configuration")?;
    let report = ctx.compare(&load(a)?, &load(b)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    match min_score {
        Some(min) if report.total < min => Ok(ExitCode::from(2)),
        _ => Ok(ExitCode::from(0)),
    }
}

fn print_report(report: &SimilarityReport) {
    let percentages = report.to_percentages();
    for key in ["total", "timbre", "acoustic", "rhythm"] {
        println!("{:<18} {:>3}%", key, percentages[key]);
    }
    println!();
    for (key, _) in report.details.entries() {
        println!("  {:<16} {:>3}%", key, percentages[key]);
    }
    println!();
    println!("{}", report.summary());
}

fn run_features(config: AppConfig, input: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    let ctx = AnalysisContext::new(config).context("invalid configuration")?;
    let features = ctx
        .extract(&load(input)?)
        .with_context(|| format!("extracting {}", input.display()))?;
    let json = serde_json::to_string_pretty(&features)?;

    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::from(0))
}

/// Plays a decoded buffer forward in fixed steps, one frame per poll
struct ReplaySource {
    buffer: SampleBuffer,
    frame_size: usize,
    step: usize,
    cursor: usize,
}

impl LiveSource for ReplaySource {
    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn latest_frame(&mut self) -> Option<LiveFrame> {
        let samples = self.buffer.samples();
        if self.cursor >= samples.len() {
            return None;
        }
        let end = (self.cursor + self.frame_size).min(samples.len());
        let frame = LiveFrame::from_samples(samples[self.cursor..end].to_vec());
        self.cursor += self.step;
        Some(frame)
    }
}

#[derive(Serialize)]
struct MonitorLine<'a> {
    time_ms: u64,
    state: voiceprint::analysis::MonitorState,
    #[serde(flatten)]
    snapshot: &'a voiceprint::LiveSnapshot,
}

fn run_monitor(config: AppConfig, input: &Path, tick_ms: u64) -> Result<ExitCode> {
    let ctx = AnalysisContext::new(config).context("invalid configuration")?;
    let buffer = load(input)?;
    let tick_ms = tick_ms.max(1);
    let mut monitor = ctx.live_monitor(buffer.sample_rate());

    let step = ((buffer.sample_rate() as u64 * tick_ms) / 1000).max(1) as usize;
    let mut source = ReplaySource {
        frame_size: ctx.config().frames.frame_size,
        buffer,
        step,
        cursor: 0,
    };

    let start = Instant::now();
    let mut time_ms = 0u64;
    loop {
        let outcome = monitor.tick_at(&mut source, start + Duration::from_millis(time_ms));
        match outcome {
            TickOutcome::NoFrame => break,
            TickOutcome::Updated => {
                let line = MonitorLine {
                    time_ms,
                    state: monitor.state(),
                    snapshot: monitor.snapshot(),
                };
                println!("{}", serde_json::to_string(&line)?);
            }
            TickOutcome::Reset => println!("{{\"time_ms\":{},\"reset\":true}}", time_ms),
            TickOutcome::Throttled | TickOutcome::Idle | TickOutcome::Skipped => {}
        }
        time_ms += tick_ms;
    }

    Ok(ExitCode::from(0))
}
