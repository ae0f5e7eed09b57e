// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives the `keeper` binary against a vault in a temp directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn keeper(dir: &Path, master: &str, args: &[&str], stdin: &str) -> Output {
    keeper_with_env(dir, master, &[], args, stdin)
}

fn keeper_with_env(
    dir: &Path,
    master: &str,
    extra_env: &[(&str, &str)],
    args: &[&str],
    stdin: &str,
) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_keeper"))
        .args(["--plain"])
        .args(args)
        .current_dir(dir)
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("KEEPER_VAULT_KEY_FILE", dir.join("vault/keeper.key"))
        .env("KEEPER_VAULT_ARCHIVE_FILE", dir.join("vault/keeper.archive"))
        .env("KEEPER_VAULT_KDF_MEMORY_COST", "8192")
        .env("KEEPER_VAULT_KDF_ITERATIONS", "1")
        .env("KEEPER_MASTER_PASSWORD", master)
        .envs(extra_env.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn init_vault() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let out = keeper(dir.path(), "master", &["init"], "");
    assert!(out.status.success(), "init failed: {out:?}");
    dir
}

#[test]
fn init_creates_both_files() {
    let dir = init_vault();
    assert!(dir.path().join("vault/keeper.key").exists());
    assert!(dir.path().join("vault/keeper.archive").exists());

    let again = keeper(dir.path(), "master", &["init"], "");
    assert_eq!(again.status.code(), Some(1));
}

#[test]
fn add_list_show_remove() {
    let dir = init_vault();
    let path = dir.path();

    let out = keeper(path, "master", &["add", "example.com", "alice"], "p@ss1\n");
    assert!(out.status.success(), "{out:?}");
    let out = keeper(path, "master", &["add", "test.org", "bob"], "\n");
    assert!(out.status.success(), "{out:?}");

    let listing = stdout(&keeper(path, "master", &["list"], ""));
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines, ["example.com\talice", "test.org\tbob  (no password)"]);

    let shown = stdout(&keeper(path, "master", &["show", "example.com"], ""));
    assert!(shown.contains("password: p@ss1"), "{shown}");

    let out = keeper(path, "master", &["remove", "test.org", "--account", "bob"], "");
    assert!(out.status.success(), "{out:?}");
    let listing = stdout(&keeper(path, "master", &["list"], ""));
    assert!(!listing.contains("test.org"));
}

#[test]
fn wrong_password_exits_with_cannot_open_status() {
    let dir = init_vault();
    let out = keeper(dir.path(), "not-master", &["list"], "");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid master password"));
}

#[test]
fn missing_entry_is_reported() {
    let dir = init_vault();
    let out = keeper(dir.path(), "master", &["show", "nowhere.example"], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("nowhere.example"));
}

#[test]
fn list_without_vault_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = keeper(dir.path(), "master", &["list"], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("keeper init"));
}

#[test]
fn generate_respects_length() {
    let dir = tempfile::tempdir().unwrap();
    let out = keeper(dir.path(), "", &["generate", "--length", "24"], "");
    assert!(out.status.success(), "{out:?}");
    assert_eq!(stdout(&out).trim_end().len(), 24);
}

#[test]
fn invalid_config_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keeper.toml"), "[generator]\nlenght = 5\n").unwrap();
    let out = keeper(dir.path(), "master", &["generate"], "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn passwd_changes_master_password() {
    let dir = init_vault();
    let path = dir.path();
    let out = keeper(path, "master", &["add", "example.com", "alice"], "p@ss1\n");
    assert!(out.status.success(), "{out:?}");

    let out = keeper_with_env(
        path,
        "master",
        &[("KEEPER_NEW_MASTER_PASSWORD", "new-master")],
        &["passwd"],
        "",
    );
    assert!(out.status.success(), "{out:?}");

    assert_eq!(keeper(path, "master", &["list"], "").status.code(), Some(2));
    let shown = stdout(&keeper(path, "new-master", &["show", "example.com"], ""));
    assert!(shown.contains("password: p@ss1"), "{shown}");
}

#[test]
fn rename_keeps_password() {
    let dir = init_vault();
    let path = dir.path();
    keeper(path, "master", &["add", "example.com", "alice"], "p@ss1\n");

    let out = keeper(
        path,
        "master",
        &["rename", "example.com", "--new-site", "example.net"],
        "",
    );
    assert!(out.status.success(), "{out:?}");
    let shown = stdout(&keeper(path, "master", &["show", "example.net"], ""));
    assert!(shown.contains("password: p@ss1"), "{shown}");
}

#[test]
fn config_prints_effective_values() {
    let dir = tempfile::tempdir().unwrap();
    let out = keeper(dir.path(), "", &["config"], "");
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    assert!(text.contains("kdf_iterations = 1"), "{text}");
    assert!(text.contains("[generator]"), "{text}");
}

#[test]
fn oversized_site_is_an_ordinary_failure() {
    let dir = init_vault();
    let path = dir.path();
    keeper(path, "master", &["add", "example.com", "alice"], "p@ss1\n");

    let long_site = "x".repeat(65536);
    let out = keeper(path, "master", &["add", long_site.as_str(), "bob"], "\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid entry"));

    let listing = stdout(&keeper(path, "master", &["list"], ""));
    assert_eq!(listing.lines().collect::<Vec<_>>(), ["example.com\talice"]);
}

#[test]
fn generated_password_is_printed_after_saving() {
    let dir = init_vault();
    let path = dir.path();
    let out = keeper(path, "master", &["add", "example.com", "alice", "--generate"], "");
    assert!(out.status.success(), "{out:?}");

    let text = stdout(&out);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{text}");
    assert!(lines[0].starts_with("Added alice@example.com"), "{text}");
    let generated = lines[1].strip_prefix("Generated password: ").unwrap();

    let shown = stdout(&keeper(path, "master", &["show", "example.com"], ""));
    assert!(shown.contains(&format!("password: {generated}")), "{shown}");
}
