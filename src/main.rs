//! Proctor CLI
//!
//! Usage:
//!   proctor --serve                           # HTTP API server
//!   proctor --serve --addr 0.0.0.0:5000       # Custom bind address
//!   proctor --replay session.jsonl            # Score a recorded signal stream
//!   proctor --replay session.jsonl --json     # JSON output

use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, Level};

use proctor::config::{
    ProctorConfig, DEFAULT_ADDR, DEFAULT_EVIDENCE_DIR, DEFAULT_SIGNAL_TIMEOUT_MS, DEFAULT_UPDATE_CAPACITY,
};
use proctor::core::{run_server, NeutralSignals, Proctor, ReplayStep, Replayer};
use proctor::types::{ScoreUpdate, Status};
use proctor::{ProctorResult, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "proctor",
    version = VERSION,
    about = "Proctor - suspicion scoring for monitored exam sessions",
    long_about = "Proctor keeps one suspicion score per student, fed by per-frame\n\
                  behavioral signals and browser-side violation reports.\n\n\
                  Modes:\n  \
                  --serve        HTTP API server mode\n  \
                  --replay FILE  Score a recorded JSONL signal stream offline\n\n\
                  Statuses:\n  \
                  NORMAL      - score below 15\n  \
                  SUSPICIOUS  - score 15 to 34\n  \
                  CHEATING    - score 35 or more, evidence captured on entry"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Directory for evidence images, logs and ledger files
    #[arg(long, default_value = DEFAULT_EVIDENCE_DIR)]
    evidence_dir: PathBuf,

    /// Per-detector timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_SIGNAL_TIMEOUT_MS)]
    signal_timeout_ms: u64,

    /// Replay a JSONL file of recorded signals and violations
    #[arg(short, long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn config(&self) -> ProctorConfig {
        ProctorConfig {
            addr: self.addr.clone(),
            evidence_dir: self.evidence_dir.clone(),
            signal_timeout: Duration::from_millis(self.signal_timeout_ms),
            update_capacity: DEFAULT_UPDATE_CAPACITY,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if let Some(ref path) = args.replay {
        run_replay(path, &args)
    } else if args.serve {
        run_serve(&args).await
    } else {
        let _ = Args::command().print_help();
        return ExitCode::from(2);
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "proctor exited with an error");
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so replay output stays clean on stdout
fn init_logging(args: &Args) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if args.log_json {
        builder.json().init();
    } else {
        builder.with_ansi(!args.no_color).init();
    }
}

/// Run the HTTP API, echoing every score update to the console
async fn run_serve(args: &Args) -> ProctorResult<()> {
    let config = args.config();
    let proctor = Arc::new(Proctor::from_config(&config, Arc::new(NeutralSignals)));

    let mut updates = proctor.subscribe();
    let (json, no_color) = (args.json, args.no_color);
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => print_update(&update, json, no_color),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    run_server(&config, proctor).await
}

fn print_update(update: &ScoreUpdate, json: bool, no_color: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(update) {
            println!("{}", line);
        }
    } else if no_color {
        println!("{}", update.to_parseable_string());
    } else {
        println!("{}", update.to_terminal_string());
    }
}

/// Score a recorded stream, one output line per record
fn run_replay(path: &Path, args: &Args) -> ProctorResult<()> {
    let reader = BufReader::new(File::open(path)?);
    let steps = Replayer::new().run(reader)?;

    for step in &steps {
        if args.json {
            println!("{}", serde_json::to_string(step)?);
        } else {
            println!("{}", format_step(step));
        }
    }

    if !args.json {
        let evidence = steps.iter().filter(|s| s.evidence).count();
        println!();
        println!("{} records replayed, {} evidence captures", steps.len(), evidence);
    }
    Ok(())
}

fn format_step(step: &ReplayStep) -> String {
    let status = match step.status {
        Status::Normal => step.status.as_str().green(),
        Status::Suspicious => step.status.as_str().yellow(),
        Status::Cheating => step.status.as_str().red().bold(),
    };

    let mut line = format!(
        "{:>5} | {} | score={:>3} | {}",
        step.line, step.student_id, step.score, status
    );
    if let Some(kind) = step.violation {
        let note = if step.suppressed {
            format!("{} (cooldown)", kind).dimmed()
        } else {
            kind.to_string().normal()
        };
        line.push_str(&format!(" | {}", note));
    }
    if step.evidence {
        line.push_str(&format!(" | {}", "evidence captured".magenta()));
    }
    line
}
