#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::{SHOP_CONFIG, TestProject};
use predicates::prelude::*;

fn wtflow(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("wtflow").unwrap();
    cmd.current_dir(project.path())
        .env_remove("WTFLOW_PROJECT_ROOT")
        .env("NO_COLOR", "1");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("wtflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("env"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("wtflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_init_writes_starter() {
    let project = TestProject::new();

    wtflow(&project)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("wtflow.kdl"));

    let content = std::fs::read_to_string(project.path().join("wtflow.kdl")).unwrap();
    assert!(content.contains("ports offset=1000"));
}

#[test]
fn test_init_refuses_overwrite() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project).arg("init").assert().failure().code(1);
    wtflow(&project).args(["init", "--force"]).assert().success();
}

#[test]
fn test_list_empty() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("ワークツリーはありません"));
}

#[test]
fn test_env_main() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("export WTFLOW_ENV=main"))
        .stdout(predicate::str::contains("export WTFLOW_SLOT=0"))
        .stdout(predicate::str::contains("export COMPOSE_PROJECT_NAME=shop"))
        .stdout(predicate::str::contains("export API_MAIN_PORT=3000"));
}

#[test]
fn test_env_named_from_worktree_dir() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);
    project.write_slots(r#"{"feature": 2}"#);
    let worktree = project.create_worktree_dir("feature");

    let mut cmd = Command::cargo_bin("wtflow").unwrap();
    cmd.current_dir(&worktree)
        .env_remove("WTFLOW_PROJECT_ROOT")
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("export WTFLOW_ENV=feature"))
        .stdout(predicate::str::contains("export COMPOSE_PROJECT_NAME=shop-wt-feature"))
        .stdout(predicate::str::contains("export API_MAIN_PORT=5000"))
        .stdout(predicate::str::contains("export WEB_MAIN_PORT=7173"));
}

#[test]
fn test_status_main_without_definition() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("環境: main"))
        .stdout(predicate::str::contains("(未生成)"))
        .stdout(predicate::str::contains("localhost:3000"));
}

#[test]
fn test_unknown_environment_fails() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .args(["status", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_slot_not_assigned_fails() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);
    project.create_worktree_dir("manual");

    wtflow(&project)
        .args(["env", "manual"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("スロットが割り当てられていません"));
}

#[test]
fn test_invalid_config_fails() {
    let project = TestProject::new();
    project.write_config("service \"api\" {");

    wtflow(&project).arg("env").assert().failure().code(1);
}

#[test]
fn test_remove_absent_is_success() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .args(["remove", "never-created"])
        .assert()
        .success()
        .stdout(predicate::str::contains("既に存在しません"));
}

#[test]
fn test_remove_parent_path_is_rejected() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);
    std::fs::write(project.path().join("precious.txt"), "keep me").unwrap();
    project.create_worktree_dir("a");

    for name in ["..", "a/../..", ""] {
        wtflow(&project)
            .args(["remove", name, "--force"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("無効なワークツリー名"));
    }

    assert!(project.path().join("precious.txt").exists());
    assert!(project.path().join(".worktrees/a").exists());
}

#[test]
fn test_create_main_is_rejected() {
    let project = TestProject::new();
    project.write_config(SHOP_CONFIG);

    wtflow(&project)
        .args(["create", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("main は予約済み"));
    assert!(!project.path().join(".worktrees/.slots.json").exists());
}
