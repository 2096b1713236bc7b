mod advisory;
mod analysis;
mod classify;
mod gate;
mod preferences;
mod record;
mod session;
mod store;
mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gate::{GateVerdict, ShellRunner};
use session::{Locations, Session};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use types::HookInput;

#[derive(Parser)]
#[command(name = "edit-hooks")]
#[command(about = "Post-edit advisory and type-check gate hooks for agent tool use")]
#[command(version)]
struct Cli {
    /// Project root; defaults to the event's working directory (or its git work tree).
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Directory holding per-session state; defaults to ~/.claude/tsc-cache.
    #[arg(long, global = true, env = "EDIT_HOOKS_CACHE_DIR")]
    cache_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record edits on PostToolUse and print a self-check reminder on Stop
    Advise,

    /// Type-check the project after a source file was written
    Typecheck {
        /// Ignore the cached command and probe the project again
        #[arg(long)]
        force_detect: bool,
    },
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading hook input from stdin")?;
    Ok(buffer)
}

fn read_hook_input() -> Result<HookInput> {
    let input = read_stdin()?;
    serde_json::from_str(&input).context("parsing hook input")
}

/// Diagnostics go to stderr and stay off unless `EDIT_HOOKS_LOG` asks for
/// them; the host reads stderr as hook output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("EDIT_HOOKS_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run_advise(locations: &Locations) -> Result<Option<String>> {
    let hook_input = read_hook_input()?;
    match &hook_input {
        HookInput::PostToolUse(e) => {
            Session::open(locations, &e.common)?.handle_post_tool_use(e)?;
            Ok(None)
        }
        HookInput::Stop(e) | HookInput::SubagentStop(e) => {
            Session::open(locations, &e.common)?.handle_stop()
        }
        HookInput::PreToolUse(_) | HookInput::Other => Ok(None),
    }
}

/// Returns the verdict and, for a failed check, where its full output was
/// saved. Errors before the event is known to edit source are silent; after
/// that they surface as a skipped check.
fn run_typecheck(
    locations: &Locations,
    force_detect: bool,
) -> Result<(GateVerdict, Option<PathBuf>)> {
    let parsed = read_hook_input();
    let cwd = parsed
        .as_ref()
        .ok()
        .and_then(HookInput::common)
        .and_then(|c| c.cwd.as_deref());
    session::sweep_stale_sessions(locations, cwd);

    let HookInput::PostToolUse(event) = parsed? else {
        return Ok((GateVerdict::NotApplicable, None));
    };
    if !session::edits_source(&event)? {
        return Ok((GateVerdict::NotApplicable, None));
    }

    let checked = Session::open(locations, &event.common).and_then(|session| {
        let verdict = session.handle_typecheck(&event, &ShellRunner, force_detect)?;
        Ok((verdict, session.last_errors_path()))
    });
    match checked {
        Ok((verdict, errors_path)) => Ok((verdict, Some(errors_path))),
        Err(err) => Ok((
            GateVerdict::Unavailable {
                command: String::new(),
                reason: format!("{err:#}"),
            },
            None,
        )),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let locations = Locations {
        project_dir: cli.project_dir,
        cache_root: cli.cache_root,
    };

    match cli.command {
        // The advisory is a courtesy: whatever happens, the host carries on.
        Commands::Advise => match run_advise(&locations) {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => {}
            Err(err) => debug!("advisory skipped: {err:#}"),
        },

        // Only a detected type error blocks; failing to run the check does not.
        Commands::Typecheck { force_detect } => {
            let (verdict, errors_path) = match run_typecheck(&locations, force_detect) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("type check not run: {err:#}");
                    return;
                }
            };
            match &verdict {
                GateVerdict::NotApplicable => {}
                GateVerdict::Pass { command } => eprintln!("{}", gate::render_pass(command)),
                GateVerdict::Unavailable { command, reason } => {
                    eprintln!("{}", gate::render_unavailable(command, reason))
                }
                GateVerdict::Fail(failure) => {
                    let shown = errors_path.as_deref().filter(|p| p.exists());
                    eprintln!("{}", gate::render_failure(failure, shown));
                }
            }
            process::exit(verdict.exit_code());
        }
    }
}
