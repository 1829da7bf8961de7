use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn accessr(config: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("accessr");
    cmd.arg("--config-dir").arg(config);
    cmd
}

/// A config dir with an ssh service and a host `web` in the group `lab`
/// reachable on 10.0.0.5.
fn populated() -> TempDir {
    let dir = TempDir::new().unwrap();
    accessr(dir.path())
        .args(["service", "add", "ssh", "--command", "ssh {address}", "--terminal"])
        .assert()
        .success();
    accessr(dir.path())
        .args(["service", "add", "http", "--command", "xdg-open http://{address}{path}"])
        .assert()
        .success();
    accessr(dir.path())
        .args(["group", "add", "lab", "--description", "Lab machines"])
        .assert()
        .success();
    accessr(dir.path())
        .args(["host", "add", "--group", "lab", "web", "--description", "Web server"])
        .assert()
        .success();
    accessr(dir.path())
        .args(["destination", "add", "--group", "lab", "--host", "web", "lan", "10.0.0.5"])
        .assert()
        .success();
    dir
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("accessr");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--config-dir"))
        .stdout(predicate::str::contains("service"))
        .stdout(predicate::str::contains("associate"))
        .stdout(predicate::str::contains("launch"));
}

#[test]
fn test_duplicate_service_is_rejected() {
    let dir = populated();
    accessr(dir.path())
        .args(["service", "add", "ssh", "--command", "ssh -4 {address}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    accessr(dir.path())
        .args(["service", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ssh {address}"))
        .stdout(predicate::str::contains("requires: path"));
}

#[test]
fn test_invalid_names_are_rejected() {
    let dir = populated();
    accessr(dir.path())
        .args(["host", "add", "bad/name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid characters"));
    accessr(dir.path())
        .args(["group", "add", "   "])
        .assert()
        .failure();
}

#[test]
fn test_resolve_uses_the_destination_address() {
    let dir = populated();
    accessr(dir.path())
        .args(["associate", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "ssh"])
        .assert()
        .success();

    accessr(dir.path())
        .args(["resolve", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "ssh"])
        .assert()
        .success()
        .stdout("ssh 10.0.0.5\n");
}

#[test]
fn test_association_arguments_are_stored_in_the_host_file() {
    let dir = populated();
    accessr(dir.path())
        .args([
            "associate",
            "--group",
            "lab",
            "--host",
            "web",
            "--destination",
            "lan",
            "--service",
            "http",
            "--arg",
            "path=/index",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("hosts/lab/web.conf")).unwrap();
    assert!(content.contains(r#"lan = http:{"path": "/index"}"#), "{}", content);

    accessr(dir.path())
        .args(["resolve", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "http"])
        .assert()
        .success()
        .stdout("xdg-open http://10.0.0.5/index\n");
}

#[test]
fn test_arguments_pick_between_associations_of_one_service() {
    let dir = populated();
    for path in ["path=/index", "path=/admin"] {
        accessr(dir.path())
            .args(["associate", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "http"])
            .args(["--arg", path])
            .assert()
            .success();
    }

    accessr(dir.path())
        .args(["resolve", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "http"])
        .assert()
        .success()
        .stdout("xdg-open http://10.0.0.5/index\n");
    accessr(dir.path())
        .args(["resolve", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "http"])
        .args(["--arg", "path=/admin"])
        .assert()
        .success()
        .stdout("xdg-open http://10.0.0.5/admin\n");
}

#[test]
fn test_missing_argument_is_reported() {
    let dir = populated();
    accessr(dir.path())
        .args(["resolve", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path"));
}

#[test]
fn test_host_rename_moves_the_file() {
    let dir = populated();
    accessr(dir.path())
        .args(["host", "rename", "--group", "lab", "web", "frontend"])
        .assert()
        .success();

    assert!(!dir.path().join("hosts/lab/web.conf").exists());
    assert!(dir.path().join("hosts/lab/frontend.conf").exists());
    accessr(dir.path())
        .args(["host", "show", "--group", "lab", "frontend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lan = 10.0.0.5 (ipv4)"));
}

#[test]
fn test_group_removal_needs_confirmation() {
    let dir = populated();
    accessr(dir.path())
        .args(["group", "remove", "lab"])
        .write_stdin("y\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert!(dir.path().join("hosts/lab/web.conf").exists());

    accessr(dir.path())
        .args(["group", "remove", "lab", "--yes"])
        .assert()
        .success();
    assert!(!dir.path().join("hosts/lab").exists());
}

#[test]
fn test_types_lists_every_destination_type() {
    let dir = TempDir::new().unwrap();
    accessr(dir.path())
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("ipv4"))
        .stdout(predicate::str::contains("ipv6"))
        .stdout(predicate::str::contains("mac"))
        .stdout(predicate::str::contains("filename"))
        .stdout(predicate::str::contains("custom"));
}

#[cfg(unix)]
#[test]
fn test_launch_reports_the_exit_code() {
    let dir = populated();
    accessr(dir.path())
        .args(["service", "add", "ping", "--command", "test -n {address}"])
        .assert()
        .success();
    accessr(dir.path())
        .args(["service", "add", "fail", "--command", "false {address}"])
        .assert()
        .success();

    accessr(dir.path())
        .args(["launch", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "ping"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Process started"))
        .stderr(predicate::str::contains("Exit code: 0"));

    accessr(dir.path())
        .args(["launch", "--group", "lab", "--host", "web", "--destination", "lan", "--service", "fail"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exit code: 1"));
}
