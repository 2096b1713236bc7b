use crate::advisory::{self, AnalyzedFile, BUILTIN_TEMPLATE};
use crate::analysis::analyze_file;
use crate::classify::{classify, has_source_extension, is_eligible_for_analysis};
use crate::gate::{self, CommandRunner, GateVerdict};
use crate::preferences::{AdvisoryTemplate, Preferences};
use crate::record::EditRecord;
use crate::store::{SessionStore, DEFAULT_RETENTION};
use crate::types::{CommonInput, ToolUseInput};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Default cache root, relative to the home directory.
const DEFAULT_CACHE_DIR: &str = ".claude/tsc-cache";

/// Where the project lives and where session state is kept, as given on the
/// command line or by the host's environment.
#[derive(Debug, Clone, Default)]
pub struct Locations {
    pub project_dir: Option<PathBuf>,
    pub cache_root: Option<PathBuf>,
}

impl Locations {
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_root {
            Some(root) => Ok(root.clone()),
            None => default_cache_root(),
        }
    }
}

/// Resolve the project root: an explicit directory wins; otherwise the
/// event's `cwd`, widened to its git work tree when it sits inside one.
/// Returns `None` when nothing usable exists on disk.
pub fn resolve_project_root(explicit: Option<&Path>, cwd: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return dir.is_dir().then(|| dir.to_path_buf());
    }
    let cwd = Path::new(cwd?);
    if !cwd.is_dir() {
        return None;
    }
    match git2::Repository::discover(cwd) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => Some(workdir.to_path_buf()),
            None => Some(cwd.to_path_buf()),
        },
        Err(_) => Some(cwd.to_path_buf()),
    }
}

fn default_cache_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("no home directory for the session cache")?;
    Ok(home.join(DEFAULT_CACHE_DIR))
}

/// Remove stale session directories under the cache root. Runs before the
/// event is trusted, so only the cache root is required; the project's
/// preferences adjust the retention when they load. Never fails.
pub fn sweep_stale_sessions(locations: &Locations, cwd: Option<&str>) -> usize {
    let cache_root = match locations.cache_root() {
        Ok(root) => root,
        Err(err) => {
            debug!("no cache root to sweep: {err:#}");
            return 0;
        }
    };
    let retention = resolve_project_root(locations.project_dir.as_deref(), cwd)
        .and_then(|root| Preferences::load(&root).ok())
        .map_or(DEFAULT_RETENTION, |prefs| prefs.cache_retention());
    let removed = SessionStore::new(cache_root).sweep_stale(retention, SystemTime::now());
    if removed > 0 {
        info!(removed, "swept stale session caches");
    }
    removed
}

/// Whether a tool call wrote at least one source file the gate should check.
pub fn edits_source(input: &ToolUseInput) -> Result<bool> {
    let call = input
        .tool_call()
        .with_context(|| format!("parsing {} tool input", input.tool_name))?;
    Ok(call.kind().is_write_like() && call.touched_paths().iter().any(|p| has_source_extension(p)))
}

pub struct Session {
    project_root: Option<PathBuf>,
    store: SessionStore,
    session_id: String,
    prefs: Preferences,
}

impl Session {
    /// Resolve the project root and cache root for this event and load the
    /// project's preferences.
    pub fn open(locations: &Locations, common: &CommonInput) -> Result<Self> {
        let project_root =
            resolve_project_root(locations.project_dir.as_deref(), common.cwd.as_deref());
        let cache_root = locations.cache_root()?;
        let prefs = match &project_root {
            Some(root) => Preferences::load(root)?,
            None => Preferences::default(),
        };
        debug!(
            session = %common.session_id,
            project = ?project_root,
            cache = %cache_root.display(),
            "session opened"
        );
        Ok(Self {
            project_root,
            store: SessionStore::new(cache_root),
            session_id: common.session_id.clone(),
            prefs,
        })
    }

    /// Absolute form of a logged path; relative paths hang off the project root.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        match &self.project_root {
            Some(root) if p.is_relative() => root.join(p),
            _ => p.to_path_buf(),
        }
    }

    // ---------------------------------------------------------------
    // Advisory template
    // ---------------------------------------------------------------

    fn load_advisory_template(&self) -> Result<String> {
        match &self.prefs.advisory_template {
            AdvisoryTemplate::Builtin => Ok(BUILTIN_TEMPLATE.to_string()),
            AdvisoryTemplate::Inline(s) => Ok(s.clone()),
            AdvisoryTemplate::File(filename) => {
                let root = self
                    .project_root
                    .as_ref()
                    .context("template file configured without a project root")?;
                let path = root.join(".claude").join(filename);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }

    // ---------------------------------------------------------------
    // Hook handlers
    // ---------------------------------------------------------------

    /// Log every file a write-like tool touched. Other tools leave no trace.
    pub fn handle_post_tool_use(&self, input: &ToolUseInput) -> Result<usize> {
        let call = input
            .tool_call()
            .with_context(|| format!("parsing {} tool input", input.tool_name))?;
        let kind = call.kind();
        if !kind.is_write_like() {
            return Ok(0);
        }
        let paths = call.touched_paths();
        for path in &paths {
            self.store
                .append_edit(&self.session_id, &EditRecord::now(kind.clone(), path))?;
        }
        debug!(tool = kind.as_str(), count = paths.len(), "edits recorded");
        Ok(paths.len())
    }

    /// Build the advisory for everything edited so far in the session, if
    /// anything warrants one.
    pub fn handle_stop(&self) -> Result<Option<String>> {
        if !self.prefs.advisory_enabled {
            return Ok(None);
        }
        let log = self.store.read_log(&self.session_id);
        if log.is_empty() {
            return Ok(None);
        }

        let mut seen: Vec<&str> = Vec::new();
        for record in &log {
            if !seen.contains(&record.path.as_str()) {
                seen.push(&record.path);
            }
        }

        let files: Vec<AnalyzedFile> = seen
            .into_iter()
            .filter(|p| is_eligible_for_analysis(p))
            .map(|p| AnalyzedFile {
                path: p.to_string(),
                category: classify(p),
                analysis: analyze_file(&self.resolve_path(p)),
            })
            .collect();
        for f in &files {
            debug!(path = %f.path, category = %f.category, attention = f.analysis.needs_attention(), "analyzed");
        }

        let Some(advice) = advisory::decide_advisory(&files) else {
            return Ok(None);
        };
        let template = self.load_advisory_template()?;
        let text = advisory::render_advisory(&template, &advice)?;
        Ok(Some(text))
    }

    /// The resolved type-check command, from the session cache unless a
    /// fresh probe is forced.
    pub fn typecheck_command(&self, root: &Path, force_detect: bool) -> String {
        if !force_detect {
            if let Some(cmd) = self.store.cached_command(&self.session_id) {
                return cmd;
            }
        }
        let cmd = gate::resolve_command(root, &self.prefs.default_typecheck_command);
        if let Err(err) = self.store.set_cached_command(&self.session_id, &cmd) {
            warn!("could not cache type-check command: {err:#}");
        }
        cmd
    }

    /// Run the type check if this tool call edited source files.
    pub fn handle_typecheck(
        &self,
        input: &ToolUseInput,
        runner: &dyn CommandRunner,
        force_detect: bool,
    ) -> Result<GateVerdict> {
        if !edits_source(input)? {
            return Ok(GateVerdict::NotApplicable);
        }

        let Some(root) = &self.project_root else {
            return Ok(GateVerdict::Unavailable {
                command: String::new(),
                reason: "no project root".into(),
            });
        };

        let command = self.typecheck_command(root, force_detect);
        info!(%command, root = %root.display(), "running type check");
        let result = match runner.run(&command, root) {
            Ok(result) => result,
            Err(err) => {
                return Ok(GateVerdict::Unavailable {
                    command,
                    reason: err.to_string(),
                });
            }
        };

        let verdict = gate::evaluate(&command, result);
        if let GateVerdict::Fail(failure) = &verdict {
            if let Err(err) =
                self.store
                    .record_failure(&self.session_id, &failure.output, &failure.command)
            {
                warn!("could not persist type-check failure: {err:#}");
            }
        }
        Ok(verdict)
    }

    pub fn last_errors_path(&self) -> PathBuf {
        self.store.last_errors_path(&self.session_id)
    }
}
