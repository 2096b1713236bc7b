use crate::analysis::ContentAnalysis;
use crate::classify::FileCategory;
use minijinja::{context, Environment};
use serde::Serialize;
use std::fmt;

// ===================================================================
// Input: every eligible file, already classified and analyzed by Session
// ===================================================================

#[derive(Debug, Clone)]
pub struct AnalyzedFile {
    pub path: String,
    pub category: FileCategory,
    pub analysis: ContentAnalysis,
}

// ===================================================================
// Output: what the Stop handler should print
// ===================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub backend_count: usize,
    /// Questions for the backend block, in display order.
    pub backend_questions: Vec<&'static str>,
    pub database_count: usize,
    pub database_questions: Vec<&'static str>,
}

pub const CATCH_LOGGING: &str = "Did you add logging with enough context in every catch block?";
pub const PERSISTENCE_WRAPPING: &str =
    "Are database calls wrapped so persistence errors are caught, logged and translated?";
pub const EXCEPTION_FILTER: &str =
    "Is this controller covered by an exception filter that maps errors to responses?";
pub const HTTP_STATUS: &str = "Do the errors you throw map to the right HTTP status codes?";
pub const SCHEMA_COLUMNS: &str =
    "Did you verify table and column names against the current schema?";
pub const MIGRATION_TESTED: &str = "Has the migration been run and tested against a real database?";

// ===================================================================
// Error: only template rendering can fail in pure code
// ===================================================================

#[derive(Debug)]
pub enum AdvisoryError {
    TemplateRender(String),
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryError::TemplateRender(msg) => write!(f, "template render error: {msg}"),
        }
    }
}

impl std::error::Error for AdvisoryError {}

// ===================================================================
// Pure entry point
// ===================================================================

/// Decide whether the touched files warrant a reminder.
///
/// Any risk indicator in any file, or any database file at all, calls for
/// one. The backend questions are driven by the indicators found in backend
/// files; the database block is unconditional once a database file shows up.
pub fn decide_advisory(files: &[AnalyzedFile]) -> Option<Advisory> {
    let any_indicator = files.iter().any(|f| f.analysis.needs_attention());

    let backend: Vec<&AnalyzedFile> = files
        .iter()
        .filter(|f| f.category == FileCategory::Backend)
        .collect();
    let database_count = files
        .iter()
        .filter(|f| f.category == FileCategory::Database)
        .count();

    if !any_indicator && database_count == 0 {
        return None;
    }

    let flags = backend
        .iter()
        .fold(ContentAnalysis::default(), |acc, f| acc.union(f.analysis));

    let mut backend_questions = Vec::new();
    if flags.has_error_handling_block {
        backend_questions.push(CATCH_LOGGING);
    }
    if flags.has_data_access_call {
        backend_questions.push(PERSISTENCE_WRAPPING);
    }
    if flags.has_request_handler_marker {
        backend_questions.push(EXCEPTION_FILTER);
    }
    if flags.has_thrown_domain_error {
        backend_questions.push(HTTP_STATUS);
    }

    let database_questions = if database_count > 0 {
        vec![SCHEMA_COLUMNS, MIGRATION_TESTED]
    } else {
        Vec::new()
    };

    let advisory = Advisory {
        backend_count: backend.len(),
        backend_questions,
        database_count,
        database_questions,
    };
    // Indicators only in `other` files leave nothing to ask about.
    (advisory.backend_count > 0 || advisory.database_count > 0).then_some(advisory)
}

// ===================================================================
// Rendering
// ===================================================================

/// Horizontal rule framing both hooks' report blocks.
pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub const BUILTIN_TEMPLATE: &str = r#"{{ rule }}
ERROR HANDLING SELF-CHECK
{{ rule }}
{% if backend_count > 0 %}
Backend changes detected: {{ backend_count }} file(s) edited
{% for q in backend_questions %}  - {{ q }}
{% endfor %}{% endif %}{% if database_count > 0 %}
Database changes detected: {{ database_count }} file(s) edited
{% for q in database_questions %}  - {{ q }}
{% endfor %}{% endif %}
{{ rule }}"#;

pub fn render_advisory(template: &str, advisory: &Advisory) -> Result<String, AdvisoryError> {
    let env = Environment::new();
    let tmpl = env
        .template_from_str(template)
        .map_err(|e| AdvisoryError::TemplateRender(e.to_string()))?;
    tmpl.render(context! {
        rule => RULE,
        backend_count => advisory.backend_count,
        backend_questions => advisory.backend_questions,
        database_count => advisory.database_count,
        database_questions => advisory.database_questions,
    })
    .map_err(|e| AdvisoryError::TemplateRender(e.to_string()))
}
