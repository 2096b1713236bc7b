//! Shallow risk scan of edited source files.
//!
//! Each indicator is a plain regex over the file text. This is a cheap
//! heuristic for deciding whether a reminder is worth printing, not a parser.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ERROR_HANDLING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btry\s*\{|\.catch\s*\(").unwrap());

static ASYNC_OPERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\basync\s+|\bawait\s+|\.then\s*\(").unwrap());

// Persistence vocabulary: the Prisma client plus the usual ORM verbs when
// called through a member access (`this.repo.save(`, `tx.user.create(`).
static DATA_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bprisma\.|PrismaService|\$transaction|\$queryRaw|\.(findMany|findUnique|findFirst|findOne|create|createMany|update|updateMany|upsert|delete|deleteMany|aggregate|save|remove)\s*\(",
    )
    .unwrap()
});

static REQUEST_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@Controller\s*\(|\bclass\s+\w*Controller\b").unwrap());

static THROWN_DOMAIN_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bthrow\s+new\s+\w*(Error|Exception)\s*\(").unwrap());

/// Risk indicators found in one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentAnalysis {
    pub has_error_handling_block: bool,
    pub has_async_operation: bool,
    pub has_data_access_call: bool,
    pub has_request_handler_marker: bool,
    pub has_thrown_domain_error: bool,
}

impl ContentAnalysis {
    pub fn needs_attention(&self) -> bool {
        self.has_error_handling_block
            || self.has_async_operation
            || self.has_data_access_call
            || self.has_request_handler_marker
            || self.has_thrown_domain_error
    }

    /// Flags set in either analysis.
    pub fn union(self, other: Self) -> Self {
        Self {
            has_error_handling_block: self.has_error_handling_block
                || other.has_error_handling_block,
            has_async_operation: self.has_async_operation || other.has_async_operation,
            has_data_access_call: self.has_data_access_call || other.has_data_access_call,
            has_request_handler_marker: self.has_request_handler_marker
                || other.has_request_handler_marker,
            has_thrown_domain_error: self.has_thrown_domain_error
                || other.has_thrown_domain_error,
        }
    }
}

pub fn analyze_text(text: &str) -> ContentAnalysis {
    ContentAnalysis {
        has_error_handling_block: ERROR_HANDLING.is_match(text),
        has_async_operation: ASYNC_OPERATION.is_match(text),
        has_data_access_call: DATA_ACCESS.is_match(text),
        has_request_handler_marker: REQUEST_HANDLER.is_match(text),
        has_thrown_domain_error: THROWN_DOMAIN_ERROR.is_match(text),
    }
}

/// Analyze the file's current contents. Missing or unreadable files (or
/// non-UTF-8 ones) report no indicators.
pub fn analyze_file(path: &Path) -> ContentAnalysis {
    match fs::read_to_string(path) {
        Ok(text) => analyze_text(&text),
        Err(err) => {
            tracing::debug!("skipping analysis of {}: {err}", path.display());
            ContentAnalysis::default()
        }
    }
}
