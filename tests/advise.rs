mod common;

use std::fs;

use common::Workspace;

#[test]
fn stop_without_edits_prints_nothing() {
    let ws = Workspace::new();
    let (code, stdout, stderr) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stdout.is_empty(), "expected no advisory, got: {stdout}");
    assert!(stderr.is_empty());
    assert!(!ws.session_dir().exists());
}

#[test]
fn edits_are_logged_in_order_with_duplicates() {
    let ws = Workspace::new();
    ws.record_edit("Write", "src/a.ts");
    ws.record_edit("Edit", "src/b.ts");
    ws.record_edit("Edit", "src/a.ts");

    let log = fs::read_to_string(ws.session_dir().join("edited-files.log")).unwrap();
    let rows: Vec<Vec<&str>> = log.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][1], "Write");
    assert!(rows[0][2].ends_with("src/a.ts"));
    assert_eq!(rows[1][1], "Edit");
    assert!(rows[1][2].ends_with("src/b.ts"));
    assert!(rows[2][2].ends_with("src/a.ts"));
}

#[test]
fn multi_edit_logs_every_path() {
    let ws = Workspace::new();
    let input = ws.post_tool_use(
        "MultiEdit",
        serde_json::json!({
            "edits": [
                { "path": "src/a.ts", "old_string": "a", "new_string": "b" },
                { "path": "src/b.ts", "old_string": "c", "new_string": "d" }
            ]
        }),
    );
    let (code, _, _) = ws.run(&["advise"], &input);
    assert_eq!(code, 0);
    let log = fs::read_to_string(ws.session_dir().join("edited-files.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().all(|l| l.contains("\tMultiEdit\t")));
}

#[test]
fn read_only_tools_are_not_logged() {
    let ws = Workspace::new();
    let input = ws.post_tool_use("Read", serde_json::json!({ "file_path": "src/a.ts" }));
    let (code, stdout, _) = ws.run(&["advise"], &input);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(!ws.session_dir().join("edited-files.log").exists());
}

#[test]
fn backend_data_access_gets_backend_block_only() {
    let ws = Workspace::new();
    ws.write(
        "src/users/users.service.ts",
        "export class UsersService {\n  list() {\n    return this.prisma.user.findMany();\n  }\n}\n",
    );
    ws.record_edit("Edit", "src/users/users.service.ts");

    let (code, stdout, stderr) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stderr.is_empty(), "expected no stderr, got: {stderr}");
    assert!(stdout.contains("ERROR HANDLING SELF-CHECK"), "got: {stdout}");
    assert!(stdout.contains("Backend changes detected: 1 file(s) edited"));
    assert!(stdout.contains("database calls wrapped"));
    assert!(!stdout.contains("catch block"));
    assert!(!stdout.contains("Database changes"));
}

#[test]
fn quiet_database_file_gets_database_block_only() {
    let ws = Workspace::new();
    ws.write("prisma/seed.ts", "export const users = [];\n");
    ws.record_edit("Write", "prisma/seed.ts");

    let (code, stdout, _) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stdout.contains("Database changes detected: 1 file(s) edited"), "got: {stdout}");
    assert!(stdout.contains("column names"));
    assert!(stdout.contains("migration"));
    assert!(!stdout.contains("Backend changes"));
}

#[test]
fn quiet_backend_file_prints_nothing() {
    let ws = Workspace::new();
    ws.write("src/app.module.ts", "export class AppModule {}\n");
    ws.record_edit("Write", "src/app.module.ts");
    let (code, stdout, _) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stdout.is_empty(), "expected no advisory, got: {stdout}");
}

#[test]
fn deleted_file_is_treated_as_quiet() {
    let ws = Workspace::new();
    let path = ws.write("src/a.controller.ts", "@Controller('a') export class AController {}");
    ws.record_edit("Write", "src/a.controller.ts");
    fs::remove_file(path).unwrap();
    let (code, stdout, _) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn subagent_stop_also_triggers_advisory() {
    let ws = Workspace::new();
    ws.write("src/a.controller.ts", "@Controller('a')\nexport class AController {}\n");
    ws.record_edit("Write", "src/a.controller.ts");
    let input = ws.stop().replace("\"Stop\"", "\"SubagentStop\"");
    let (code, stdout, _) = ws.run(&["advise"], &input);
    assert_eq!(code, 0);
    assert!(stdout.contains("exception filter"), "got: {stdout}");
}

#[test]
fn broken_template_fails_open() {
    let ws = Workspace::new();
    ws.write(".claude/edit-hooks.toml", "[advisory_template]\ninline = \"{% if %}\"\n");
    ws.write("src/a.service.ts", "try { run() } catch (e) {}\n");
    ws.record_edit("Edit", "src/a.service.ts");
    let (code, stdout, stderr) = ws.run(&["advise"], &ws.stop());
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.is_empty());
}

#[test]
fn concurrent_edits_are_all_logged() {
    let ws = Workspace::new();
    let paths: Vec<String> = (0..8).map(|i| format!("src/f{i}.ts")).collect();
    std::thread::scope(|scope| {
        for rel in &paths {
            let ws = &ws;
            scope.spawn(move || ws.record_edit("Write", rel));
        }
    });

    let log = fs::read_to_string(ws.session_dir().join("edited-files.log")).unwrap();
    let mut logged: Vec<&str> = log
        .lines()
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 3, "malformed line: {line:?}");
            assert_eq!(fields[1], "Write");
            fields[2]
        })
        .collect();
    assert_eq!(logged.len(), paths.len());
    logged.sort();
    let mut expected: Vec<String> = paths
        .iter()
        .map(|rel| ws.project.path().join(rel).to_string_lossy().into_owned())
        .collect();
    expected.sort();
    assert_eq!(logged, expected);
}
