use crate::types::ToolKind;

/// One logged fact: `tool` modified `path` at `timestamp`.
/// Stored as a tab-separated line in `<cache>/<session>/edited-files.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub timestamp: String,
    pub tool: ToolKind,
    pub path: String,
}

impl EditRecord {
    /// Stamp a new record with the current UTC time.
    pub fn now(tool: ToolKind, path: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool,
            path: path.to_string(),
        }
    }

    /// Encode as a single log line, newline included.
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\n", self.timestamp, self.tool.as_str(), self.path)
    }

    /// Decode one log line. The path is the remainder after the second tab,
    /// so paths containing tabs survive.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields = line.splitn(3, '\t');
        let timestamp = fields.next()?;
        let tool = fields.next()?;
        let path = fields.next()?;
        if path.is_empty() {
            return None;
        }
        Some(Self {
            timestamp: timestamp.to_string(),
            tool: ToolKind::from_name(tool),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_encoding_is_tab_separated() {
        let rec = EditRecord {
            timestamp: "2026-01-01T00:00:00+00:00".into(),
            tool: ToolKind::MultiEdit,
            path: "/repo/src/a.ts".into(),
        };
        assert_eq!(
            rec.to_line(),
            "2026-01-01T00:00:00+00:00\tMultiEdit\t/repo/src/a.ts\n"
        );
        assert_eq!(EditRecord::parse_line(&rec.to_line()), Some(rec));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(EditRecord::parse_line(""), None);
        assert_eq!(EditRecord::parse_line("ts\tWrite"), None);
        assert_eq!(EditRecord::parse_line("ts\tWrite\t"), None);
    }

    #[test]
    fn unknown_tool_is_kept_verbatim() {
        let rec = EditRecord::parse_line("t\tNotebookEdit\tnb.ipynb").unwrap();
        assert_eq!(rec.tool, ToolKind::Other("NotebookEdit".into()));
    }

    #[test]
    fn now_uses_rfc3339() {
        let rec = EditRecord::now(ToolKind::Write, "a.ts");
        assert!(chrono::DateTime::parse_from_rfc3339(&rec.timestamp).is_ok());
    }
}
