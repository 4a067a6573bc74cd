#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const UNUSED_REPORT: &str = r#"{"Issues":[{"Text":"unused var","FromLinter":"unused","Pos":{"Filename":"main.go","Line":10,"Column":2},"Severity":""}]}"#;

const PINNED_IMAGE: &str = "docker.io/golangci/golangci-lint:v1.64-alpine@sha256:05e1762ba74443e44b3a179e9549ad134a9ee2180d4fcc06b19a77ea0c6ac66a";

/// Runs the binary from an empty directory so no project config is picked up.
fn glint_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("glint").expect("binary should be built");
    cmd.current_dir(cwd).env_remove("GLINT_LOG");
    cmd
}

fn go_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
    std::fs::create_dir_all(dir.path().join("cmd/app")).unwrap();
    std::fs::write(dir.path().join("cmd/app/main.go"), "package main\n").unwrap();
    dir
}

fn write_report(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("golangci-lint-report.json");
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn help_lists_query_commands() {
    let cwd = TempDir::new().unwrap();
    glint_cmd(cwd.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("issues")
                .and(predicate::str::contains("error-count"))
                .and(predicate::str::contains("warning-count"))
                .and(predicate::str::contains("assert"))
                .and(predicate::str::contains("plan")),
        );
}

#[test]
fn plan_describes_pinned_container_run() {
    let cwd = TempDir::new().unwrap();
    let tree = go_tree();

    let output = glint_cmd(cwd.path())
        .arg("plan")
        .arg(tree.path())
        .args(["--path", "cmd/app", "--lint-cache", "shared-lint"])
        .output()
        .expect("command should run");
    assert!(output.status.success());

    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");

    assert_eq!(plan["request"]["image"], PINNED_IMAGE);
    assert_eq!(plan["request"]["workdir"], "/src/cmd/app");
    assert_eq!(plan["request"]["redirect_stdout"], "golangci-lint-report.json");
    assert_eq!(plan["command"][0], "docker");

    let command: Vec<&str> = plan["command"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert!(command.contains(&"type=volume,source=shared-lint,target=/root/.cache/golangci-lint"));
    assert!(command.contains(&"type=volume,source=go-mod,target=/go/pkg/mod"));
    assert!(command.contains(&"--out-format"));
    assert!(command.contains(&"/root/.golangci.yml"));
}

#[test]
fn plan_rejects_escaping_path() {
    let cwd = TempDir::new().unwrap();
    let tree = go_tree();

    glint_cmd(cwd.path())
        .arg("plan")
        .arg(tree.path())
        .args(["--path", "../outside"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid lint path"));
}

#[test]
fn missing_source_fails() {
    let cwd = TempDir::new().unwrap();

    glint_cmd(cwd.path())
        .args(["plan", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid source tree"));
}

#[test]
fn env_overrides_container_cli() {
    let cwd = TempDir::new().unwrap();
    let tree = go_tree();

    let output = glint_cmd(cwd.path())
        .env("GLINT_DOCKER", "podman")
        .arg("plan")
        .arg(tree.path())
        .output()
        .expect("command should run");

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["command"][0], "podman");
}

#[test]
fn unpinned_image_is_refused() {
    let cwd = TempDir::new().unwrap();
    let tree = go_tree();

    glint_cmd(cwd.path())
        .env("GLINT_IMAGE", "golangci/golangci-lint:latest")
        .arg("plan")
        .arg(tree.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("pinned by digest"));
}

#[test]
fn render_normalizes_saved_report() {
    let cwd = TempDir::new().unwrap();
    let report = write_report(&cwd, UNUSED_REPORT);

    glint_cmd(cwd.path())
        .arg("render")
        .arg(&report)
        .args(["--path", "cmd/app"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[unused] cmd/app/main.go:10: unused var")
                .and(predicate::str::contains("1 issues (1 errors, 0 warnings)")),
        );
}

#[test]
fn render_json_is_a_normalized_report() {
    let cwd = TempDir::new().unwrap();
    let report = write_report(&cwd, UNUSED_REPORT);

    let output = glint_cmd(cwd.path())
        .arg("render")
        .arg(&report)
        .args(["--format", "json"])
        .output()
        .expect("command should run");

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["Issues"][0]["Severity"], "error");
    assert_eq!(parsed["Issues"][0]["Pos"]["Filename"], "main.go");
}

#[test]
fn render_rejects_malformed_report() {
    let cwd = TempDir::new().unwrap();
    let report = write_report(&cwd, "level=info msg=\"not json\"");

    glint_cmd(cwd.path())
        .arg("render")
        .arg(&report)
        .assert()
        .failure();
}

#[cfg(unix)]
mod fake_engine {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in container CLI that prints `report` as the tool's stdout.
    fn fake_docker(dir: &TempDir, report: &str) -> PathBuf {
        let path = dir.path().join("fake-docker");
        std::fs::write(&path, format!("#!/bin/sh\ncat <<'JSON'\n{report}\nJSON\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn assert_fails_with_error_count_and_diagnostics() {
        let cwd = TempDir::new().unwrap();
        let tree = go_tree();
        let docker = fake_docker(&cwd, UNUSED_REPORT);

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("assert")
            .arg(tree.path())
            .args(["--path", "cmd/app"])
            .assert()
            .code(1)
            .stderr(
                predicate::str::contains("[unused] cmd/app/main.go:10: unused var")
                    .and(predicate::str::contains("linting failed with 1 issues")),
            );
    }

    #[test]
    fn assert_passes_on_clean_report() {
        let cwd = TempDir::new().unwrap();
        let tree = go_tree();
        let docker = fake_docker(&cwd, r#"{"Issues":[]}"#);

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("assert")
            .arg(tree.path())
            .assert()
            .success()
            .stderr(predicate::str::contains("linting failed").not());
    }

    #[test]
    fn counts_are_printed() {
        let cwd = TempDir::new().unwrap();
        let tree = go_tree();
        let docker = fake_docker(
            &cwd,
            r#"{"Issues":[{"Text":"a","Pos":{"Filename":"a.go"}},{"Text":"b","Pos":{"Filename":"b.go"},"Severity":"warning"}]}"#,
        );

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("error-count")
            .arg(tree.path())
            .assert()
            .success()
            .stdout("1\n");

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("warning-count")
            .arg(tree.path())
            .assert()
            .success()
            .stdout("1\n");
    }

    #[test]
    fn report_copies_raw_artifact() {
        let cwd = TempDir::new().unwrap();
        let tree = go_tree();
        let docker = fake_docker(&cwd, UNUSED_REPORT);
        let out = cwd.path().join("saved.json");

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("report")
            .arg(tree.path())
            .arg("--out")
            .arg(&out)
            .assert()
            .success();

        let saved = std::fs::read_to_string(&out).unwrap();
        assert_eq!(saved.trim(), UNUSED_REPORT);
    }

    #[test]
    fn engine_failure_is_fatal() {
        let cwd = TempDir::new().unwrap();
        let tree = go_tree();
        let docker = cwd.path().join("fake-docker");
        std::fs::write(&docker, "#!/bin/sh\necho 'manifest unknown' >&2\nexit 125\n").unwrap();
        std::fs::set_permissions(&docker, std::fs::Permissions::from_mode(0o755)).unwrap();

        glint_cmd(cwd.path())
            .env("GLINT_DOCKER", &docker)
            .arg("issues")
            .arg(tree.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("manifest unknown"));
    }
}
