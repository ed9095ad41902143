use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn xmlls(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xmlls").unwrap();
    cmd.env("XMLLS_CONFIG", dir.path().join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("HTTPS_PROXY")
        .env_remove("https_proxy")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .arg("--no-color");
    cmd
}

fn write_binary(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("custom-lemminx");
    std::fs::write(&path, b"").unwrap();
    path
}

#[test]
fn help_lists_the_commands() {
    Command::cargo_bin("xmlls")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("trust"));
}

#[test]
fn config_set_then_show() {
    let dir = TempDir::new().unwrap();
    xmlls(&dir).args(["config", "set", "vmargs", "-Xmx1G"]).assert().success();
    xmlls(&dir)
        .args(["config", "set", "proxy_authorization", "Basic dXNlcjpzZWNyZXQ="])
        .assert()
        .success();

    xmlls(&dir)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vmargs\": \"-Xmx1G\""))
        .stdout(predicate::str::contains("dXNlcjpzZWNyZXQ=").not());
}

#[test]
fn config_path_honours_override() {
    let dir = TempDir::new().unwrap();
    xmlls(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn unknown_config_key_fails() {
    let dir = TempDir::new().unwrap();
    xmlls(&dir)
        .args(["config", "set", "api_key", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn trust_add_by_path_and_list() {
    let dir = TempDir::new().unwrap();
    let binary = write_binary(dir.path());

    xmlls(&dir)
        .args(["trust", "add"])
        .arg(&binary)
        .assert()
        .success()
        .stdout(predicate::str::contains(EMPTY_SHA256));

    xmlls(&dir)
        .args(["trust", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(EMPTY_SHA256));
    assert!(dir.path().join("trusted-hashes.toml").exists());
}

#[test]
fn resolve_reports_missing_binary() {
    let dir = TempDir::new().unwrap();
    xmlls(&dir)
        .args(["resolve", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"missing\""));
}

#[test]
fn untrusted_binary_fails_verification_without_a_terminal() {
    let dir = TempDir::new().unwrap();
    let binary = write_binary(dir.path());

    xmlls(&dir)
        .arg("verify")
        .arg(&binary)
        .assert()
        .failure()
        .stdout(predicate::str::contains("not trusted"));
}

#[test]
fn trusted_override_produces_a_spec() {
    let dir = TempDir::new().unwrap();
    let binary = write_binary(dir.path());

    xmlls(&dir)
        .args(["config", "set", "binary_path"])
        .arg(&binary)
        .assert()
        .success();
    xmlls(&dir)
        .args(["config", "set", "binary_args", "-Dlog=debug"])
        .assert()
        .success();
    xmlls(&dir).args(["trust", "add", EMPTY_SHA256]).assert().success();

    xmlls(&dir)
        .args(["spec", "--binary", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom-lemminx"))
        .stdout(predicate::str::contains("\"-Dlog=debug\""))
        .stdout(predicate::str::contains("\"env\": null"));
}
