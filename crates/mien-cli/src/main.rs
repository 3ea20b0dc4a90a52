//! Mien command line.
//!
//! Thin wrapper around mien-core and mien-capture for terminal usage.
//!
//! ## Usage
//!
//! ```bash
//! # Log one observation by hand
//! mien log happy 82
//!
//! # Summarize the journal per day
//! mien report --start 2026-08-01 --end 2026-08-25
//!
//! # Run a capture session against the synthetic camera
//! mien track --duration-secs 60
//!
//! # Guided breathing at the terminal
//! mien breathe --technique box --cycles 2
//!
//! # One affirmation for the latest logged emotion
//! mien affirm
//!
//! # Populate a demo journal
//! mien seed --days 20 --per-day 15
//!
//! # Detect and classify a still image
//! mien analyze photo.png
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mien_capture::classify::{self, EmotionClassifier, SyntheticClassifier};
use mien_capture::detect::{BrightnessDetector, FaceDetector, DEFAULT_MIN_FACE};
use mien_capture::frame::Frame;
use mien_capture::session::{run_session, SessionConfig, SessionEvent};
use mien_capture::source::SyntheticCamera;
use mien_core::breathing::Technique;
use mien_core::table::{self, DailySummary};
use mien_core::{affirmations, EmotionJournal, EmotionRecord, LoadSource};

/// Journal file used when neither `--journal` nor the env var is set.
const DEFAULT_JOURNAL_FILE: &str = "stats.json";
/// Environment override for the journal path.
const JOURNAL_ENV: &str = "MIEN_JOURNAL";
/// Subject recorded when no name is given.
const DEFAULT_SUBJECT: &str = "Guest";
/// Synthetic camera frame size.
const CAMERA_WIDTH: u32 = 640;
const CAMERA_HEIGHT: u32 = 480;

/// `report` exit code when the journal holds no usable data.
const EXIT_NO_DATA: i32 = 1;
/// `report` exit code for an unusable date range.
const EXIT_BAD_RANGE: i32 = 2;

#[derive(Parser)]
#[command(name = "mien", version, about = "Emotion journal and on-screen mood tracking")]
struct Cli {
    /// Journal file (default: MIEN_JOURNAL env var, then ./stats.json)
    #[arg(short, long, global = true)]
    journal: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append one observation to the journal
    Log {
        /// Emotion label (e.g. happy, sad, neutral)
        emotion: String,
        /// Confidence, 0-100 (fractions in (0, 1] are scaled up)
        percentage: f64,
        /// Subject name
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        name: String,
    },
    /// Summarize the journal as a per-day table
    Report {
        /// First date to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
        /// Emit the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a capture session and log what it sees
    Track {
        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long)]
        duration_secs: Option<u64>,
        /// Tick period in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Classify every Nth tick that has a face
        #[arg(long, default_value_t = 5)]
        analyze_every: u64,
        /// Ignore faces with a shorter side below this many pixels
        #[arg(long, default_value_t = DEFAULT_MIN_FACE)]
        min_face: u32,
        /// Subject name
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        subject: String,
    },
    /// Guided breathing exercise
    Breathe {
        /// Technique: 478, box, or diaphragmatic
        #[arg(short, long, default_value = "478")]
        technique: String,
        /// Number of cycles
        #[arg(short, long, default_value_t = 3)]
        cycles: u32,
    },
    /// Print an affirmation for an emotion
    Affirm {
        /// Emotion label (default: the most recently logged one)
        emotion: Option<String>,
        /// List the labels that have their own affirmation set
        #[arg(long)]
        list: bool,
    },
    /// Fill the journal with synthetic observations for demos
    Seed {
        /// Days to cover, ending today
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=36500))]
        days: u32,
        /// Observations per day
        #[arg(long, default_value_t = 15)]
        per_day: u32,
        /// Subject name
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        name: String,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Detect and classify the largest face in a still image
    Analyze {
        /// Image file to analyze
        image: PathBuf,
        /// Do not append the result to the journal
        #[arg(long)]
        no_log: bool,
        /// Subject name
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        name: String,
    },
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{raw}' (expected YYYY-MM-DD): {err}"))
}

fn resolve_journal_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(JOURNAL_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_FILE))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let journal = EmotionJournal::new(resolve_journal_path(cli.journal));

    match cli.command {
        Commands::Log { emotion, percentage, name } => {
            cmd_log(&journal, &emotion, percentage, &name)?;
        }
        Commands::Report { start, end, json } => {
            let code = cmd_report(&journal, start, end, json)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Track {
            duration_secs,
            interval_ms,
            analyze_every,
            min_face,
            subject,
        } => {
            cmd_track(journal, subject, duration_secs, interval_ms, analyze_every, min_face)
                .await?;
        }
        Commands::Breathe { technique, cycles } => {
            cmd_breathe(&technique, cycles).await?;
        }
        Commands::Affirm { emotion, list } => {
            cmd_affirm(&journal, emotion, list)?;
        }
        Commands::Seed { days, per_day, name, seed } => {
            cmd_seed(&journal, days, per_day, &name, seed)?;
        }
        Commands::Analyze { image, no_log, name } => {
            cmd_analyze(&journal, &image, &name, no_log)?;
        }
    }

    Ok(())
}

fn cmd_log(journal: &EmotionJournal, emotion: &str, percentage: f64, name: &str) -> Result<()> {
    let label = emotion.trim().to_lowercase();
    if label.is_empty() {
        anyhow::bail!("emotion label is empty");
    }
    if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
        anyhow::bail!("percentage must be in (0, 100], got {percentage}");
    }

    let record = journal.append(name, &label, percentage)?;
    println!(
        "Logged {} at {:.1}% for {} ({})",
        record.emotion, record.percentage, record.name, record.datetime
    );
    Ok(())
}

#[derive(Serialize)]
struct ReportJson {
    observations: usize,
    first: NaiveDate,
    last: NaiveDate,
    #[serde(flatten)]
    summary: DailySummary,
    totals: BTreeMap<String, u64>,
}

/// Returns the process exit code instead of exiting, so the happy path
/// stays testable.
fn cmd_report(
    journal: &EmotionJournal,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<i32> {
    let loaded = journal.load_detailed();
    match loaded.source {
        LoadSource::Missing => {
            eprintln!("No journal found at {}", journal.path().display());
            return Ok(EXIT_NO_DATA);
        }
        LoadSource::Corrupt => {
            eprintln!("Journal at {} is unreadable", journal.path().display());
            return Ok(EXIT_NO_DATA);
        }
        LoadSource::File => {}
    }
    if loaded.skipped > 0 {
        eprintln!("Warning: skipped {} unreadable entries", loaded.skipped);
    }

    let rows = table::rows_from_records(&loaded.records);
    let Some((first, last)) = table::available_range(&rows) else {
        eprintln!("No observations in {}", journal.path().display());
        return Ok(EXIT_NO_DATA);
    };

    let rows = match table::filter_range(rows, start, end) {
        Ok(rows) => rows,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(EXIT_BAD_RANGE);
        }
    };

    if rows.is_empty() {
        println!("Available range: {first} .. {last}");
        println!("No observations in the requested range.");
        return Ok(0);
    }

    let observations = rows.len();
    let totals = table::label_totals(&rows);
    let summary = table::aggregate(&rows);

    if json {
        let report = ReportJson { observations, first, last, summary, totals };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    println!("Available range: {first} .. {last}");
    println!("Observations: {observations}");
    println!();
    for (date, labels) in &summary.counts {
        println!("{date}");
        for (label, count) in labels {
            let mean = summary
                .mean_scores
                .get(date)
                .and_then(|scores| scores.get(label))
                .copied()
                .unwrap_or(0.0);
            println!("  {label:<10} {count:>4} obs   mean {mean:5.1}");
        }
    }
    println!();
    println!("Overall distribution:");
    for (label, count) in &totals {
        let share = 100.0 * *count as f64 / observations as f64;
        println!("  {label:<10} {share:>5.1}% ({count})");
    }
    Ok(0)
}

async fn cmd_track(
    journal: EmotionJournal,
    subject: String,
    duration_secs: Option<u64>,
    interval_ms: u64,
    analyze_every: u64,
    min_face: u32,
) -> Result<()> {
    let config = SessionConfig {
        subject,
        interval: Duration::from_millis(interval_ms),
        analyze_every,
        min_face,
    };
    let (tx, mut rx) = mpsc::channel(32);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        match duration_secs {
            Some(secs) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        trigger.cancel();
    });

    let worker = tokio::spawn(run_session(
        config,
        journal,
        SyntheticCamera::new(CAMERA_WIDTH, CAMERA_HEIGHT),
        BrightnessDetector::new(),
        SyntheticClassifier::new(),
        tx,
        cancel,
    ));

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Started { session_id } => {
                println!("Tracking started (session {session_id}). Press Ctrl-C to stop.");
            }
            SessionEvent::Faces { count } => {
                if count == 0 {
                    println!("No face in view");
                } else {
                    println!("{count} face(s) in view");
                }
            }
            SessionEvent::Observation { record } => {
                println!("  observation: {:<9} {:>5.1}%", record.emotion, record.percentage);
            }
            SessionEvent::Skipped { reason } => {
                tracing::debug!(reason = %reason, "tick skipped");
            }
            SessionEvent::Stopped { appended } => {
                println!("Tracking stopped. {appended} observations logged.");
            }
        }
    }

    worker.await.context("capture session panicked")??;
    Ok(())
}

async fn cmd_breathe(technique: &str, cycles: u32) -> Result<()> {
    let technique: Technique = technique.parse()?;
    println!(
        "{technique}: {cycles} cycles, {}s per cycle.",
        technique.cycle_secs()
    );

    for cycle in 1..=cycles {
        println!();
        println!("Cycle {cycle}/{cycles}");
        for step in technique.phases() {
            print!("  {:<11}", step.phase.instruction());
            std::io::stdout().flush()?;
            for remaining in (1..=step.secs).rev() {
                print!(" {remaining}");
                std::io::stdout().flush()?;
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            println!();
        }
    }

    println!();
    println!("Done. Notice how you feel.");
    Ok(())
}

fn cmd_affirm(journal: &EmotionJournal, emotion: Option<String>, list: bool) -> Result<()> {
    if list {
        println!("{}", affirmations::labels().join(", "));
        return Ok(());
    }

    // No label given: reuse the most recently logged emotion, or fall
    // through to the neutral set on an empty journal.
    let label = emotion.unwrap_or_else(|| {
        journal
            .load()
            .last()
            .map(|record| record.emotion.clone())
            .unwrap_or_default()
    });

    let mut rng = rand::thread_rng();
    match affirmations::pick(&label, &mut rng) {
        Some(line) => println!("{line}"),
        None => anyhow::bail!("no affirmations available"),
    }
    Ok(())
}

fn cmd_seed(
    journal: &EmotionJournal,
    days: u32,
    per_day: u32,
    name: &str,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let today = Local::now().date_naive();
    let mut records = journal.load();
    let before = records.len();

    for day_offset in (0..days).rev() {
        let date = today - chrono::Duration::days(i64::from(day_offset));
        for _ in 0..per_day {
            let estimate = classify::sample_estimate(&mut rng);
            let hour: u32 = rng.gen_range(8..22);
            let minute: u32 = rng.gen_range(0..60);
            let second: u32 = rng.gen_range(0..60);
            records.push(EmotionRecord {
                name: name.to_string(),
                datetime: format!("{date}T{hour:02}:{minute:02}:{second:02}"),
                emotion: estimate.label,
                percentage: estimate.confidence,
            });
        }
    }

    journal.save(&records)?;
    println!(
        "Seeded {} observations across {days} days into {}",
        records.len() - before,
        journal.path().display()
    );
    Ok(())
}

fn cmd_analyze(journal: &EmotionJournal, image: &Path, name: &str, no_log: bool) -> Result<()> {
    let frame = Frame::from_path(image)?;
    let mut detector = BrightnessDetector::new();
    let regions = detector.detect(&frame)?;

    // Stills skip the live-session minimum-size gate; any region is
    // worth reporting on.
    let Some(region) = regions.into_iter().max_by_key(|region| region.area()) else {
        println!("No face found in {}", image.display());
        return Ok(());
    };

    let mut classifier = SyntheticClassifier::new();
    let estimate = classifier.analyze(&frame, &region)?;
    println!("Detected: {} ({:.0}%)", estimate.label, estimate.confidence);

    let mut rng = rand::thread_rng();
    if let Some(line) = affirmations::pick(&estimate.label, &mut rng) {
        println!("{line}");
    }

    if !no_log {
        journal.append(name, &estimate.label, estimate.confidence)?;
        println!("Logged to {}", journal.path().display());
    }
    Ok(())
}
