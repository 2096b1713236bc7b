use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Location of the preferences file relative to the project root.
pub const RELATIVE_PATH: &str = ".claude/edit-hooks.toml";

pub const DEFAULT_TYPECHECK_COMMAND: &str = "npx tsc --noEmit";

/// Advisory template: either an inline minijinja string or a path to a
/// template file (relative to `.claude/`).
///
/// In TOML this looks like one of:
///
/// ```toml
/// [advisory_template]
/// inline = "{{ backend_count }} backend file(s) touched"
///
/// # or
///
/// [advisory_template]
/// file = "advisory.j2"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryTemplate {
    /// The template shipped with the binary.
    #[default]
    Builtin,
    Inline(String),
    File(String),
}

/// Per-project preferences stored in `.claude/edit-hooks.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Preferences {
    /// Turns the post-edit advisory off without unregistering the hook.
    #[serde(default = "default_true")]
    pub advisory_enabled: bool,

    #[serde(default)]
    pub advisory_template: AdvisoryTemplate,

    /// Command used when the project has no tsconfig to probe.
    #[serde(default = "default_typecheck_command")]
    pub default_typecheck_command: String,

    /// Session cache directories older than this are swept.
    #[serde(default = "default_retention_days")]
    pub cache_retention_days: u64,
}

fn default_true() -> bool {
    true
}

fn default_typecheck_command() -> String {
    DEFAULT_TYPECHECK_COMMAND.into()
}

fn default_retention_days() -> u64 {
    crate::store::DEFAULT_RETENTION.as_secs() / (24 * 60 * 60)
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            advisory_enabled: default_true(),
            advisory_template: AdvisoryTemplate::default(),
            default_typecheck_command: default_typecheck_command(),
            cache_retention_days: default_retention_days(),
        }
    }
}

impl Preferences {
    /// Load preferences from `<project>/.claude/edit-hooks.toml`.
    ///
    /// A missing file means defaults; nothing is written into the project.
    /// Missing keys in an existing file are filled in with defaults via serde.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(RELATIVE_PATH);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let prefs: Preferences = toml::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?;
                Ok(prefs)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn cache_retention(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_retention_days.saturating_mul(24 * 60 * 60))
    }
}
