use crate::advisory::RULE;
use regex::Regex;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

/// Build-specific config, probed first.
pub const BUILD_CONFIG: &str = "tsconfig.app.json";
/// General config, probed second.
pub const GENERAL_CONFIG: &str = "tsconfig.json";

/// Lines of diagnostics shown before collapsing the rest into a count.
pub const MAX_REPORTED_ERRORS: usize = 10;
/// Raw output lines shown when the tool failed without any error marker.
const RAW_TAIL_LINES: usize = 20;

/// POSIX shell status for "command not found".
const COMMAND_NOT_FOUND: i32 = 127;

static TYPE_ERROR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"error TS\d+").unwrap());

// ===================================================================
// Command resolution
// ===================================================================

/// Pick the type-check invocation for `root` by probing for a build-specific
/// config, then a general one, then falling back to `default`.
pub fn resolve_command(root: &Path, default: &str) -> String {
    for config in [BUILD_CONFIG, GENERAL_CONFIG] {
        if root.join(config).is_file() {
            return format!("npx tsc --project {config} --noEmit");
        }
    }
    default.to_string()
}

// ===================================================================
// Execution
// ===================================================================

/// Exit status and combined stdout/stderr of a finished check.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub output: String,
}

pub trait CommandRunner {
    fn run(&self, command: &str, dir: &Path) -> io::Result<CommandOutput>;
}

/// Runs the command through `sh -c`, folding stderr into stdout so the
/// captured text keeps the tool's own ordering.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, dir: &Path) -> io::Result<CommandOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!("{command} 2>&1"))
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

// ===================================================================
// Verdict
// ===================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub command: String,
    pub status: Option<i32>,
    pub output: String,
    pub error_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// The event did not touch any source file through a write-like tool.
    NotApplicable,
    Pass { command: String },
    /// The check could not run at all; the host is not blocked.
    Unavailable { command: String, reason: String },
    Fail(Failure),
}

impl GateVerdict {
    pub fn exit_code(&self) -> i32 {
        match self {
            GateVerdict::Fail(_) => 1,
            _ => 0,
        }
    }
}

/// Turn a finished check into a verdict. Error markers in the output fail
/// the gate even when the tool exited 0.
pub fn evaluate(command: &str, result: CommandOutput) -> GateVerdict {
    let error_lines: Vec<String> = result
        .output
        .lines()
        .filter(|l| TYPE_ERROR_MARKER.is_match(l))
        .map(|l| l.trim_end().to_string())
        .collect();

    if error_lines.is_empty() {
        match result.status {
            Some(0) => {
                return GateVerdict::Pass {
                    command: command.to_string(),
                };
            }
            Some(COMMAND_NOT_FOUND) => {
                return GateVerdict::Unavailable {
                    command: command.to_string(),
                    reason: "command not found".into(),
                };
            }
            _ => {}
        }
    }

    GateVerdict::Fail(Failure {
        command: command.to_string(),
        status: result.status,
        output: result.output,
        error_lines,
    })
}

// ===================================================================
// Reporting (stderr text)
// ===================================================================

pub fn render_pass(command: &str) -> String {
    format!("type check passed ({command})")
}

pub fn render_unavailable(command: &str, reason: &str) -> String {
    if command.is_empty() {
        format!("type check skipped: {reason}")
    } else {
        format!("type check skipped ({command}): {reason}")
    }
}

/// The delimited block shown to the user when the gate fails.
pub fn render_failure(failure: &Failure, errors_path: Option<&Path>) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "TYPE CHECK FAILED".to_string(),
        RULE.to_string(),
        format!("command: {}", failure.command),
        String::new(),
    ];

    if failure.error_lines.is_empty() {
        let status = match failure.status {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        lines.push(format!("check failed with {status} and no error markers:"));
        let raw: Vec<&str> = failure.output.lines().collect();
        let start = raw.len().saturating_sub(RAW_TAIL_LINES);
        lines.extend(raw[start..].iter().map(|l| l.to_string()));
    } else {
        lines.extend(
            failure
                .error_lines
                .iter()
                .take(MAX_REPORTED_ERRORS)
                .cloned(),
        );
        let remaining = failure.error_lines.len().saturating_sub(MAX_REPORTED_ERRORS);
        if remaining > 0 {
            lines.push(format!("... and {remaining} more error(s)"));
        }
    }

    if let Some(path) = errors_path {
        lines.push(String::new());
        lines.push(format!("full output: {}", path.display()));
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}
