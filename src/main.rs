//! Flappy Pilot headless runner
//!
//! Drives sessions through the same command surface a remote client uses and
//! prints the results.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use flappy_pilot::level::LevelCatalog;
use flappy_pilot::{Command, Mode, NavigationHeuristic, PolicyHandle, Response, Session, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "flappy-pilot",
    version,
    about = "Run the gap-runner simulation headless"
)]
struct Cli {
    /// Optional JSON settings file; omitted fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Play one level until the run ends or the frame limit is reached.
    Run {
        /// Level id (unknown ids fall back to the default level).
        #[arg(short, long, default_value = "simple")]
        level: String,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Autopilot)]
        mode: ModeArg,
        /// In manual mode, jump every N frames (0 never jumps).
        #[arg(long, default_value_t = 20)]
        jump_every: u64,
        #[arg(long, default_value_t = 10_000)]
        max_frames: u64,
        /// Print every response as a JSON line.
        #[arg(long)]
        json: bool,
    },
    /// List the built-in levels.
    Levels,
    /// Fly the autopilot across every built-in level for several seeds.
    Eval {
        #[arg(long, default_value_t = 10)]
        seeds: u64,
        #[arg(long, default_value_t = 10_000)]
        max_frames: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Manual,
    Autopilot,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Manual => Mode::Manual,
            ModeArg::Autopilot => Mode::Autopilot,
        }
    }
}

/// How a single run finished
struct RunSummary {
    frames: u64,
    score: u64,
    crashed: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let catalog = Arc::new(LevelCatalog::builtin());
    let policy = PolicyHandle::new(NavigationHeuristic::for_settings(&settings));

    match cli.command {
        CliCommand::Run {
            level,
            seed,
            mode,
            jump_every,
            max_frames,
            json,
        } => {
            let mut session = Session::new(settings, catalog, policy, seed)
                .context("failed to start session")?;
            let summary =
                run_level(&mut session, &level, mode.into(), jump_every, max_frames, json)?;
            if !json {
                println!(
                    "level {}: score {} after {} frames ({})",
                    session.level_id(),
                    summary.score,
                    summary.frames,
                    if summary.crashed { "crashed" } else { "frame limit" }
                );
            }
        }
        CliCommand::Levels => {
            for level in catalog.summaries() {
                println!("{:<12} {:<24} {}", level.id, level.name, level.description);
            }
        }
        CliCommand::Eval { seeds, max_frames } => {
            println!(
                "{:<12} {:>6} {:>10} {:>6} {:>9}",
                "level", "runs", "mean", "best", "survived"
            );
            let ids: Vec<String> = catalog.ids().map(str::to_string).collect();
            for id in ids {
                let mut scores = Vec::new();
                let mut survived = 0;
                for seed in 0..seeds {
                    let mut session =
                        Session::new(settings.clone(), Arc::clone(&catalog), policy.clone(), seed)
                            .context("failed to start session")?;
                    let summary =
                        run_level(&mut session, &id, Mode::Autopilot, 0, max_frames, false)?;
                    if !summary.crashed {
                        survived += 1;
                    }
                    scores.push(summary.score);
                }
                let mean = if scores.is_empty() {
                    0.0
                } else {
                    scores.iter().sum::<u64>() as f64 / scores.len() as f64
                };
                let best = scores.iter().copied().max().unwrap_or(0);
                println!("{:<12} {:>6} {:>10.1} {:>6} {:>9}", id, seeds, mean, best, survived);
            }
        }
    }

    Ok(())
}

fn run_level(
    session: &mut Session,
    level: &str,
    mode: Mode,
    jump_every: u64,
    max_frames: u64,
    json: bool,
) -> Result<RunSummary> {
    let load = Command::LoadLevel {
        level_id: level.to_string(),
    };
    emit(session.handle(load), json)?;
    emit(session.handle(Command::SetMode { mode }), json)?;

    for frame in 1..=max_frames {
        if mode == Mode::Manual && jump_every > 0 && frame % jump_every == 0 {
            emit(session.handle(Command::Jump), json)?;
        }
        emit(session.handle(Command::Tick), json)?;
        if session.state().is_terminal() {
            break;
        }
    }

    let state = session.state();
    Ok(RunSummary {
        frames: state.frame(),
        score: state.score(),
        crashed: state.is_terminal(),
    })
}

fn emit(response: Response, json: bool) -> Result<()> {
    if let Response::Error { message } = &response {
        anyhow::bail!("session rejected command: {message}");
    }
    if json {
        println!("{}", serde_json::to_string(&response).context("failed to encode response")?);
    }
    Ok(())
}
