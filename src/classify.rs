use std::fmt;

/// Coarse category used to tailor advisory questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Backend,
    Database,
    Other,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCategory::Backend => write!(f, "backend"),
            FileCategory::Database => write!(f, "database"),
            FileCategory::Other => write!(f, "other"),
        }
    }
}

/// Extensions treated as source code by both hooks.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Request handlers, services, wiring modules, guards, interceptors, pipes
/// and exception filters.
const BACKEND_ROLES: &[&str] = &[
    "controller",
    "service",
    "module",
    "guard",
    "interceptor",
    "pipe",
    "filter",
];

const DATABASE_ROLES: &[&str] = &["entity", "repository"];

const DATABASE_DIRS: &[&str] = &["prisma", "migrations"];

/// Extensions a role suffix may be followed by (`users.service.ts`).
const ROLE_EXTENSIONS: &[&str] = &["ts", "js"];

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty()).then_some(ext)
}

/// True when `path` contains `/<dir>/` or starts with `<dir>/`.
fn has_dir_segment(path: &str, dir: &str) -> bool {
    path.starts_with(&format!("{dir}/")) || path.contains(&format!("/{dir}/"))
}

/// True when the file name ends in `.<role>.<ext>` for one of `roles`.
fn has_role_suffix(name: &str, roles: &[&str]) -> bool {
    roles.iter().any(|role| {
        ROLE_EXTENSIONS
            .iter()
            .any(|ext| name.ends_with(&format!(".{role}.{ext}")))
    })
}

/// Map a path to its category. First matching rule wins; unmatched input is
/// `Other`, never an error.
pub fn classify(path: &str) -> FileCategory {
    let path = normalize(path);
    let name = file_name(&path);

    if has_dir_segment(&path, "src") && has_role_suffix(name, BACKEND_ROLES) {
        return FileCategory::Backend;
    }
    if DATABASE_DIRS.iter().any(|d| has_dir_segment(&path, d))
        || has_role_suffix(name, DATABASE_ROLES)
    {
        return FileCategory::Database;
    }
    FileCategory::Other
}

/// True when the file has a recognized source-code extension.
pub fn has_source_extension(path: &str) -> bool {
    let path = normalize(path);
    extension(file_name(&path)).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Whether a touched file should be scanned for risk indicators: source
/// files only, minus tests, declarations, config and type-definition folders.
pub fn is_eligible_for_analysis(path: &str) -> bool {
    if !has_source_extension(path) {
        return false;
    }
    let path = normalize(path);
    let name = file_name(&path);
    if name.contains(".test.") || name.contains(".spec.") || name.contains(".config.") {
        return false;
    }
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    !["types", "__tests__", "node_modules"]
        .iter()
        .any(|dir| has_dir_segment(&path, dir))
}
