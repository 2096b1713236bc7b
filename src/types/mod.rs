use serde::Deserialize;

// ===================================================================
// Hook Input Types (received via stdin, snake_case JSON)
// ===================================================================

/// Fields shared by all hook event inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonInput {
    pub session_id: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolUseInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StopInput {
    #[serde(flatten)]
    pub common: CommonInput,
}

/// Top-level hook input, deserialized from stdin JSON.
///
/// Tagged by the `hook_event_name` field. Events neither handler cares about
/// land in `Other` so a new host event never turns into a parse failure.
#[derive(Debug, Deserialize)]
#[serde(tag = "hook_event_name")]
pub enum HookInput {
    PreToolUse(ToolUseInput),
    PostToolUse(ToolUseInput),
    Stop(StopInput),
    SubagentStop(StopInput),
    #[serde(other)]
    Other,
}

impl HookInput {
    /// Access the common fields, if the event carries them.
    pub fn common(&self) -> Option<&CommonInput> {
        match self {
            Self::PreToolUse(e) | Self::PostToolUse(e) => Some(&e.common),
            Self::Stop(e) | Self::SubagentStop(e) => Some(&e.common),
            Self::Other => None,
        }
    }
}

// ===================================================================
// Tool-Specific Input Types
// ===================================================================

/// Parsed tool call, matching `tool_name` to a typed `tool_input`.
#[derive(Debug)]
pub enum ToolCall {
    Write(WriteToolInput),
    Edit(EditToolInput),
    MultiEdit(MultiEditToolInput),
    /// Any tool that does not modify files.
    Other { tool_name: String },
}

impl ToolUseInput {
    /// Parse `tool_name` + `tool_input` into a typed `ToolCall`.
    pub fn tool_call(&self) -> Result<ToolCall, serde_json::Error> {
        ToolCall::parse(&self.tool_name, &self.tool_input)
    }
}

impl ToolCall {
    pub fn parse(
        tool_name: &str,
        tool_input: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        match tool_name {
            "Write" => Ok(Self::Write(serde_json::from_value(tool_input.clone())?)),
            "Edit" => Ok(Self::Edit(serde_json::from_value(tool_input.clone())?)),
            "MultiEdit" => Ok(Self::MultiEdit(serde_json::from_value(
                tool_input.clone(),
            )?)),
            other => Ok(Self::Other {
                tool_name: other.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Write(_) => ToolKind::Write,
            Self::Edit(_) => ToolKind::Edit,
            Self::MultiEdit(_) => ToolKind::MultiEdit,
            Self::Other { tool_name } => ToolKind::Other(tool_name.clone()),
        }
    }

    /// Every file path this call touches, in order, without repeats.
    /// Non-modifying tools touch nothing.
    pub fn touched_paths(&self) -> Vec<&str> {
        let candidates: Vec<&str> = match self {
            Self::Write(w) => vec![w.file_path.as_str()],
            Self::Edit(e) => vec![e.file_path.as_str()],
            Self::MultiEdit(m) => m
                .file_path
                .iter()
                .map(String::as_str)
                .chain(m.edits.iter().filter_map(|e| e.file_path.as_deref()))
                .collect(),
            Self::Other { .. } => Vec::new(),
        };
        let mut paths: Vec<&str> = Vec::new();
        for p in candidates {
            if !p.is_empty() && !paths.contains(&p) {
                paths.push(p);
            }
        }
        paths
    }
}

/// Kind of tool that produced an edit, as stored in the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    Write,
    Edit,
    MultiEdit,
    Other(String),
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Write => "Write",
            Self::Edit => "Edit",
            Self::MultiEdit => "MultiEdit",
            Self::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Write" => Self::Write,
            "Edit" => Self::Edit,
            "MultiEdit" => Self::MultiEdit,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_write_like(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteToolInput {
    #[serde(alias = "path")]
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditToolInput {
    #[serde(alias = "path")]
    pub file_path: String,
}

/// A batched edit. The host sends either one top-level `file_path` with a
/// list of edits, or a list of edits that each name their own file.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiEditToolInput {
    #[serde(default, alias = "path")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub edits: Vec<SingleEdit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleEdit {
    #[serde(default, alias = "path")]
    pub file_path: Option<String>,
}
