//! Timed challenge gate.
//!
//! Keeps the session (`.stagegate/state/session.json`) for a multi-page
//! challenge: starts the countdown, records solved steps, and decides whether
//! a page may be entered or where it redirects to.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use stagegate::clock::Clock;
use stagegate::core::affordance::{HubAffordance, visible_affordances};
use stagegate::core::answer::{AnswerVerdict, check_answer};
use stagegate::core::countdown::{format_clock, remaining_secs};
use stagegate::core::progress::Progress;
use stagegate::core::types::{Navigation, PageId};
use stagegate::exit_codes;
use stagegate::io::config::{StageConfig, load_config};
use stagegate::io::init::{InitOptions, StagePaths, init_stage};
use stagegate::io::store::FileStore;
use stagegate::ledger::StepLedger;
use stagegate::logging;
use stagegate::page::{PageContext, PageEvent, PagePhase};
use stagegate::session::{read_expiry, start_session};
use stagegate::timer::Tick;

#[derive(Parser)]
#[command(
    name = "stagegate",
    version,
    about = "Session countdown and step-gated page access for a timed challenge"
)]
struct Cli {
    /// Project root containing `.stagegate/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.stagegate/` with the default config and an empty session.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Start a new session (resets all steps) and go to the hub.
    Start,
    /// Load a page once: guard it and show the countdown.
    Visit {
        /// Page name or location, e.g. `morse.html` or `/mission/morse.html`.
        page: String,
    },
    /// Load a page and keep the countdown running until it expires.
    Watch { page: String },
    /// Record a step as complete.
    Mark { step: u8 },
    /// Show completed steps and the hub's next action.
    Progress {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Compare an answer with the expected one (case and spacing ignored).
    Check { candidate: String, expected: String },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, force),
        Command::Start => cmd_start(&cli.root),
        Command::Visit { page } => cmd_visit(&cli.root, &page, false),
        Command::Watch { page } => cmd_visit(&cli.root, &page, true),
        Command::Mark { step } => cmd_mark(&cli.root, step),
        Command::Progress { json } => cmd_progress(&cli.root, json),
        Command::Check {
            candidate,
            expected,
        } => Ok(cmd_check(&candidate, &expected)),
    }
}

fn open_stage(root: &Path) -> Result<(StageConfig, FileStore)> {
    let paths = StagePaths::new(root);
    let config = load_config(&paths.config_path).context("load stage config")?;
    Ok((config, FileStore::new(paths.session_path)))
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_stage(root, &InitOptions { force })?;
    println!("initialized {}", paths.stage_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_start(root: &Path) -> Result<i32> {
    let (config, store) = open_stage(root)?;
    let navigation = start_session(&store, &Clock::System, &config)?;
    if let Some(expiry_ms) = read_expiry(&store)? {
        println!("session expires at {}", format_instant(expiry_ms));
    }
    if let Navigation::Redirect(to) = navigation {
        println!("redirect {to}");
    }
    Ok(exit_codes::OK)
}

fn cmd_visit(root: &Path, location: &str, watch: bool) -> Result<i32> {
    let (config, store) = open_stage(root)?;
    let page = PageId::from_location(location, &config.entry_page());
    let mut ctx = PageContext::load(&store, &config, Clock::System, page)?;

    if let Some(tick) = ctx.last_tick() {
        print_tick(tick);
    }
    if let Navigation::Redirect(to) = ctx.navigation() {
        return Ok(report_redirect(ctx.phase(), to));
    }
    match ctx.phase() {
        PagePhase::Ungated => println!("{} (no countdown)", ctx.page()),
        _ => println!("{} admitted", ctx.page()),
    }
    if !watch {
        return Ok(exit_codes::OK);
    }

    while let Some(due_ms) = ctx.next_due_ms() {
        let wait_ms = due_ms.saturating_sub(ctx.now_ms()).max(0) as u64;
        thread::sleep(Duration::from_millis(wait_ms));
        for event in ctx.run_due()? {
            match event {
                PageEvent::Tick(tick) => print_tick(&tick),
                PageEvent::Redirect(to) => return Ok(report_redirect(ctx.phase(), &to)),
                PageEvent::RevealLine { text, .. } => println!("{text}"),
                PageEvent::RevealComplete | PageEvent::AnswerAccepted => {}
            }
        }
    }
    Ok(exit_codes::OK)
}

fn report_redirect(phase: &PagePhase, to: &PageId) -> i32 {
    match phase {
        PagePhase::Expired => {
            println!("session expired, redirect {to}");
            exit_codes::EXPIRED
        }
        PagePhase::NoSession => {
            println!("no active session, redirect {to}");
            exit_codes::REDIRECTED
        }
        PagePhase::AwaitingPrerequisite { step, .. } => {
            println!("step {step} not complete, redirect {to}");
            exit_codes::REDIRECTED
        }
        PagePhase::Ungated | PagePhase::Running => {
            println!("redirect {to}");
            exit_codes::REDIRECTED
        }
    }
}

fn print_tick(tick: &Tick) {
    if tick.warning {
        println!("{} (hurry)", tick.display);
    } else {
        println!("{}", tick.display);
    }
}

fn cmd_mark(root: &Path, step: u8) -> Result<i32> {
    let (config, store) = open_stage(root)?;
    let ledger = StepLedger::new(&store, config.max_steps);
    ledger.mark_step_done(ledger.step(step)?)?;
    println!("step {step} complete");
    Ok(exit_codes::OK)
}

#[derive(Serialize)]
struct ProgressReport {
    session: Option<SessionReport>,
    progress: Progress,
    affordances: Vec<HubAffordance>,
}

#[derive(Serialize)]
struct SessionReport {
    expiry_ms: i64,
    expires_at: String,
    remaining_secs: u64,
    remaining: String,
}

fn cmd_progress(root: &Path, json: bool) -> Result<i32> {
    let (config, store) = open_stage(root)?;
    let progress = StepLedger::new(&store, config.max_steps).progress()?;
    let session = read_expiry(&store)?.map(|expiry_ms| {
        let remaining = remaining_secs(expiry_ms, Clock::System.now_ms());
        SessionReport {
            expiry_ms,
            expires_at: format_instant(expiry_ms),
            remaining_secs: remaining,
            remaining: format_clock(remaining),
        }
    });
    let report = ProgressReport {
        affordances: visible_affordances(&progress),
        progress,
        session,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(exit_codes::OK);
    }

    match &report.session {
        Some(session) => println!("session: {} left", session.remaining),
        None => println!("session: none"),
    }
    for row in report.progress.checklist() {
        println!("{row}");
    }
    for affordance in &report.affordances {
        println!("next: {}", affordance.label());
    }
    Ok(exit_codes::OK)
}

fn cmd_check(candidate: &str, expected: &str) -> i32 {
    let verdict = AnswerVerdict::from_match(check_answer(candidate, expected));
    println!("{}", verdict.message());
    match verdict {
        AnswerVerdict::Accepted => exit_codes::OK,
        AnswerVerdict::Rejected => exit_codes::REJECTED,
    }
}

fn format_instant(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}
