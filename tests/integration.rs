use std::path::Path;
use std::process::{Command, Output};

fn backref_cmd(vault: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_backref"));
    cmd.current_dir(vault);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(vault: &Path, args: &[&str]) -> Output {
    backref_cmd(vault).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A vault where a.md and notes/c.md both reference text in b.md.
fn vault() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.md"), "# B\n\nhello world and more\n").unwrap();
    std::fs::write(
        dir.path().join("a.md"),
        "see [↗](ref://b.md#5-16/\"hello world\") here\n",
    )
    .unwrap();
    std::fs::create_dir(dir.path().join("notes")).unwrap();
    std::fs::write(
        dir.path().join("notes/c.md"),
        "quote [↗](ref://b.md#17-20/\"and\";portal)\n",
    )
    .unwrap();
    dir
}

#[test]
fn index_lists_every_backlink() {
    let dir = vault();
    let output = run(dir.path(), &["index"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    assert!(out.contains("a.md@4 -> b.md#5-16 \"hello world\""), "{out}");
    assert!(out.contains("notes/c.md@6 -> b.md#17-20 \"and\""), "{out}");
}

#[test]
fn backlinks_json_carries_ids_and_portal_text() {
    let dir = vault();
    let output = run(dir.path(), &["backlinks", "b.md", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert!(record["id"].as_str().unwrap().starts_with("backlink-"));
        assert_eq!(record["referencedLocation"]["filename"], "b.md");
    }
    assert_eq!(records[1]["portalText"], "quote");
}

#[test]
fn config_excludes_directories() {
    let dir = vault();
    std::fs::write(dir.path().join(".backref.toml"), "exclude = [\"notes/\"]\n").unwrap();

    let output = run(dir.path(), &["backlinks", "b.md", "--json"]);
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[test]
fn malformed_config_is_an_error() {
    let dir = vault();
    std::fs::write(dir.path().join(".backref.toml"), "temporary_view_opacity = 2.0\n").unwrap();

    let output = run(dir.path(), &["index"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("temporary_view_opacity"));
}

#[test]
fn check_reports_fresh_moved_and_broken() {
    let dir = vault();
    let check = run(dir.path(), &["check"]);
    assert_eq!(check.status.code(), Some(0), "{}", stdout(&check));
    assert!(stdout(&check).contains("All 2 references fresh"));

    std::fs::write(dir.path().join("b.md"), "# B\n\nwell, hello world and more\n").unwrap();
    let check = run(dir.path(), &["check"]);
    assert_eq!(check.status.code(), Some(1), "{}", stdout(&check));
    assert!(stdout(&check).contains("MOVED"));

    std::fs::remove_file(dir.path().join("b.md")).unwrap();
    let check = run(dir.path(), &["check"]);
    assert_eq!(check.status.code(), Some(2), "{}", stdout(&check));
    assert!(stdout(&check).contains("BROKEN"));
    assert!(stdout(&check).contains("file not found"));
}

#[test]
fn encode_then_decode_from_the_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &["encode", "--file", "my notes/b.md", "--from", "120", "--to", "135", "--text", "hello world"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let token = stdout(&output).trim().to_string();
    assert_eq!(token, "ref://my%20notes/b.md#120-135/\"hello%20world\"");

    let output = run(dir.path(), &["decode", &token]);
    let location: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(location["filename"], "my notes/b.md");
    assert_eq!(location["from"], 120);
    assert_eq!(location["text"], "hello world");
    assert_eq!(location["variant"], "plain");
}

#[test]
fn decode_rejects_malformed_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["decode", "ref://b.md#9-2/\"x\""]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed reference token"));

    let output = run(dir.path(), &["encode", "--file", "b.md", "--from", "3", "--to", "3", "--text", "x"]);
    assert_eq!(output.status.code(), Some(1));
}
