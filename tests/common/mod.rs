#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Run the binary with `args`, feeding `stdin_json`. Returns exit code,
/// stdout and stderr.
pub fn run_cli(args: &[&str], stdin_json: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_edit-hooks"))
        .args(args)
        .env_remove("CLAUDE_PROJECT_DIR")
        .env_remove("EDIT_HOOKS_CACHE_DIR")
        .env_remove("EDIT_HOOKS_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    // The binary may exit before reading (e.g. on a usage error).
    let _ = child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin_json.as_bytes());

    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// A project directory plus a separate cache root, both removed on drop.
pub struct Workspace {
    pub project: tempfile::TempDir,
    pub cache: tempfile::TempDir,
    pub session_id: String,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            project: tempfile::tempdir().unwrap(),
            cache: tempfile::tempdir().unwrap(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Write a file under the project root, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.project.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn session_dir(&self) -> PathBuf {
        self.cache.path().join(&self.session_id)
    }

    /// Run `edit-hooks <subcommand>` against this workspace.
    pub fn run(&self, subcommand: &[&str], stdin_json: &str) -> (i32, String, String) {
        let project = self.project.path().to_str().unwrap();
        let cache = self.cache.path().to_str().unwrap();
        let mut args = vec!["--project-dir", project, "--cache-root", cache];
        args.extend_from_slice(subcommand);
        run_cli(&args, stdin_json)
    }

    pub fn post_tool_use(&self, tool_name: &str, tool_input: serde_json::Value) -> String {
        serde_json::json!({
            "session_id": self.session_id,
            "transcript_path": "/tmp/t.jsonl",
            "cwd": self.project.path(),
            "permission_mode": "default",
            "hook_event_name": "PostToolUse",
            "tool_name": tool_name,
            "tool_input": tool_input,
            "tool_response": { "success": true },
            "tool_use_id": "toolu_001"
        })
        .to_string()
    }

    pub fn stop(&self) -> String {
        serde_json::json!({
            "session_id": self.session_id,
            "transcript_path": "/tmp/t.jsonl",
            "cwd": self.project.path(),
            "permission_mode": "default",
            "hook_event_name": "Stop",
            "stop_hook_active": false
        })
        .to_string()
    }

    /// Record an edit of `rel` through the advisory hook.
    pub fn record_edit(&self, tool_name: &str, rel: &str) {
        let path = self.project.path().join(rel);
        let input = self.post_tool_use(tool_name, serde_json::json!({ "file_path": path }));
        let (code, stdout, stderr) = self.run(&["advise"], &input);
        assert_eq!(code, 0);
        assert!(stdout.is_empty(), "expected no stdout, got: {stdout}");
        assert!(stderr.is_empty(), "expected no stderr, got: {stderr}");
    }
}
