use assert_cmd::Command;

#[test]
fn test_list_prints_every_game() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("brainboost")
        .unwrap()
        .env("HOME", dir.path())
        .arg("list")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["memory-matrix", "speed-match", "chalkboard", "digit-detective", "spatial-speed"] {
        assert!(stdout.contains(name), "missing {name} in {stdout}");
    }
    assert_eq!(stdout.lines().count(), 9);
}

#[test]
fn test_history_is_empty_in_fresh_home() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("brainboost")
        .unwrap()
        .env("HOME", dir.path())
        .args(["history", "--limit", "5"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no sessions recorded yet"));
}

#[test]
fn test_play_refuses_without_a_tty() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("brainboost")
        .unwrap()
        .env("HOME", dir.path())
        .args(["play", "chalkboard"])
        .write_stdin("")
        .assert()
        .failure();
}

#[test]
fn test_unknown_game_is_a_usage_error() {
    Command::cargo_bin("brainboost")
        .unwrap()
        .args(["play", "tetris"])
        .assert()
        .failure()
        .code(2);
}
