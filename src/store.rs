use crate::record::EditRecord;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const EDIT_LOG: &str = "edited-files.log";
const COMMAND_CACHE: &str = "typecheck-command.cache";
const LAST_ERRORS: &str = "last-errors.txt";
const LAST_COMMAND: &str = "last-command.txt";

/// Default age after which a session directory is swept.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Read a text file, returning `None` if it doesn't exist.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Keep a session id from escaping the cache root.
fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".into()
    } else {
        cleaned
    }
}

/// Session-scoped state under a shared cache root:
///
/// ```text
/// <root>/<session_id>/edited-files.log
/// <root>/<session_id>/typecheck-command.cache
/// <root>/<session_id>/last-errors.txt
/// <root>/<session_id>/last-command.txt
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(sanitize_session_id(session_id))
    }

    fn ensure_session_dir(&self, session_id: &str) -> Result<PathBuf> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }

    pub fn last_errors_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(LAST_ERRORS)
    }

    pub fn last_command_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(LAST_COMMAND)
    }

    // ---------------------------------------------------------------
    // Edit log
    // ---------------------------------------------------------------

    /// Append one record with a single append-mode write. Concurrent hook
    /// processes only ever add at the end, so no update is lost.
    pub fn append_edit(&self, session_id: &str, record: &EditRecord) -> Result<()> {
        let path = self.ensure_session_dir(session_id)?.join(EDIT_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.write_all(record.to_line().as_bytes())
            .with_context(|| format!("appending to {}", path.display()))
    }

    /// All records for the session in insertion order. A missing or
    /// unreadable log reads as empty.
    pub fn read_log(&self, session_id: &str) -> Vec<EditRecord> {
        let path = self.session_dir(session_id).join(EDIT_LOG);
        match read_optional(&path) {
            Ok(Some(contents)) => contents.lines().filter_map(EditRecord::parse_line).collect(),
            Ok(None) => Vec::new(),
            Err(err) => {
                debug!("treating unreadable edit log as empty: {err:#}");
                Vec::new()
            }
        }
    }

    // ---------------------------------------------------------------
    // Command cache
    // ---------------------------------------------------------------

    pub fn cached_command(&self, session_id: &str) -> Option<String> {
        let path = self.session_dir(session_id).join(COMMAND_CACHE);
        match read_optional(&path) {
            Ok(Some(cmd)) => {
                let cmd = cmd.trim();
                (!cmd.is_empty()).then(|| cmd.to_string())
            }
            Ok(None) => None,
            Err(err) => {
                debug!("ignoring unreadable command cache: {err:#}");
                None
            }
        }
    }

    pub fn set_cached_command(&self, session_id: &str, command: &str) -> Result<()> {
        let path = self.ensure_session_dir(session_id)?.join(COMMAND_CACHE);
        fs::write(&path, command).with_context(|| format!("writing {}", path.display()))
    }

    /// Persist the raw output and the command of a failed check.
    pub fn record_failure(&self, session_id: &str, output: &str, command: &str) -> Result<()> {
        let dir = self.ensure_session_dir(session_id)?;
        let errors = dir.join(LAST_ERRORS);
        fs::write(&errors, output).with_context(|| format!("writing {}", errors.display()))?;
        let cmd = dir.join(LAST_COMMAND);
        fs::write(&cmd, command).with_context(|| format!("writing {}", cmd.display()))
    }

    // ---------------------------------------------------------------
    // Housekeeping
    // ---------------------------------------------------------------

    /// Remove session directories last modified more than `max_age` before
    /// `now`. Returns how many were removed; every failure is skipped.
    pub fn sweep_stale(&self, max_age: Duration, now: SystemTime) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_dir() {
                continue;
            }
            let Ok(modified) = meta.modified() else { continue };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => warn!("could not sweep {}: {err}", entry.path().display()),
            }
        }
        removed
    }
}
