//! E2E CLI tests covering:
//! - `quay init` and the not-initialized error
//! - card lifecycle: create, drop, advance, comment, delete
//! - column rules: duplicate titles and occupied-column removal
//! - JSON output contract
//!
//! Each test runs `quay` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the quay binary, rooted in `dir`.
fn quay_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("quay"));
    cmd.current_dir(dir);
    cmd.env("QUAY_LOG", "off");
    cmd.env("XDG_CONFIG_HOME", dir.join(".user-config"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("QUAY_AUTHOR");
    cmd
}

fn init_board(dir: &Path) {
    quay_cmd(dir).args(["init"]).assert().success();
}

fn json_of(dir: &Path, args: &[&str]) -> Value {
    let output = quay_cmd(dir)
        .args(args)
        .args(["--format", "json"])
        .output()
        .expect("quay should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

/// Create a card via CLI, return its id.
fn create_card(dir: &Path, client: &str, service: &str) -> u64 {
    let json = json_of(
        dir,
        &["card", "create", "--client", client, "--service", service],
    );
    json["id"].as_u64().expect("create output should have numeric id")
}

fn card_status(dir: &Path, id: u64) -> String {
    let json = json_of(dir, &["card", "show", &id.to_string()]);
    json["status"].as_str().expect("status").to_string()
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn init_creates_board_with_default_columns() {
    let dir = TempDir::new().unwrap();
    quay_cmd(dir.path())
        .args(["init", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("em_analise"));
    assert!(dir.path().join(".quay/board.json").exists());
    assert!(dir.path().join(".quay/config.toml").exists());

    let columns = json_of(dir.path(), &["column", "list"]);
    let keys: Vec<&str> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        ["demandas", "em_analise", "aprovado", "em_execucao", "concluido"]
    );
}

#[test]
fn commands_outside_a_board_report_not_initialized() {
    let dir = TempDir::new().unwrap();
    quay_cmd(dir.path())
        .args(["board"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"))
        .stderr(predicate::str::contains("suggestion:"));
}

#[test]
fn second_init_without_force_fails() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    quay_cmd(dir.path()).args(["init"]).assert().failure();
    quay_cmd(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn commands_find_board_from_subdirectory() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let nested = dir.path().join("docs/notes");
    std::fs::create_dir_all(&nested).unwrap();
    let id = create_card(&nested, "Hapag", "Inspeção");
    assert_eq!(card_status(dir.path(), id), "demandas");
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[test]
fn drop_to_aprovado_then_column_cannot_be_removed() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "Maersk", "Vistoria");

    let moved = json_of(dir.path(), &["drop", &id.to_string(), "aprovado"]);
    assert_eq!(moved["changed"], true);
    assert_eq!(moved["effect"]["effect"], "card_moved");
    assert_eq!(moved["effect"]["from"], "demandas");
    assert_eq!(moved["effect"]["to"], "aprovado");
    assert_eq!(moved["card"]["status"], "aprovado");

    quay_cmd(dir.path())
        .args(["column", "remove", "aprovado"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2004]"));
    assert_eq!(card_status(dir.path(), id), "aprovado");
}

#[test]
fn dropping_on_same_column_is_no_change() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "MSC", "Laudo");
    let report = json_of(dir.path(), &["drop", &id.to_string(), "demandas"]);
    assert_eq!(report["changed"], false);
    assert!(report.get("effect").is_none());
}

#[test]
fn drop_to_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "MSC", "Laudo");
    quay_cmd(dir.path())
        .args(["drop", &id.to_string(), "arquivado"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2002]"));
    assert_eq!(card_status(dir.path(), id), "demandas");
}

#[test]
fn advance_walks_the_stage_ring() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "CMA", "Peritagem");
    let expected = ["em_analise", "aprovado", "em_execucao", "concluido", "demandas"];
    for stage in expected {
        quay_cmd(dir.path())
            .args(["advance", &id.to_string()])
            .assert()
            .success();
        assert_eq!(card_status(dir.path(), id), stage);
    }
}

#[test]
fn comment_requires_author_and_is_shown() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "Hapag", "Inspeção");

    quay_cmd(dir.path())
        .args(["card", "comment", &id.to_string(), "sem autor"])
        .assert()
        .failure();

    quay_cmd(dir.path())
        .args(["--author", "ana", "card", "comment", &id.to_string(), "Cliente confirmou"])
        .assert()
        .success();
    let card = json_of(dir.path(), &["card", "show", &id.to_string()]);
    assert_eq!(card["comments"][0]["author"], "ana");
    assert_eq!(card["comments"][0]["body"], "Cliente confirmou");
}

#[test]
fn delete_with_yes_removes_card() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "Hapag", "Inspeção");
    let report = json_of(dir.path(), &["card", "delete", &id.to_string(), "--yes"]);
    assert_eq!(report["deleted"], id);

    quay_cmd(dir.path())
        .args(["card", "show", &id.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2001]"));
}

#[test]
fn piped_delete_without_yes_is_refused() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "Hapag", "Inspeção");
    quay_cmd(dir.path())
        .args(["card", "delete", &id.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(card_status(dir.path(), id), "demandas");
}

#[test]
fn blank_client_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    quay_cmd(dir.path())
        .args(["card", "create", "--client", "  ", "--service", "Laudo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2006]"));
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[test]
fn duplicate_column_title_is_rejected_by_default() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    quay_cmd(dir.path())
        .args(["column", "add", "Em Teste"])
        .assert()
        .success();
    quay_cmd(dir.path())
        .args(["column", "add", "em teste"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]"));

    let columns = json_of(dir.path(), &["column", "list"]);
    assert_eq!(columns.as_array().unwrap().len(), 6);
}

#[test]
fn overwrite_policy_retitles_existing_column() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let config_path = dir.path().join(".quay/config.toml");
    let config = std::fs::read_to_string(&config_path).unwrap();
    assert!(config.contains(r#"duplicate_columns = "reject""#));
    std::fs::write(
        &config_path,
        config.replace(
            r#"duplicate_columns = "reject""#,
            r#"duplicate_columns = "overwrite""#,
        ),
    )
    .unwrap();

    let id = create_card(dir.path(), "Hapag", "Inspeção");
    quay_cmd(dir.path())
        .args(["column", "add", "DEMANDAS"])
        .assert()
        .success();

    let board = json_of(dir.path(), &["board"]);
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[0]["key"], "demandas");
    assert_eq!(columns[0]["title"], "DEMANDAS");
    assert_eq!(columns[0]["cards"][0]["id"], id);
}

#[test]
fn rename_keeps_key_and_cards() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = create_card(dir.path(), "Hapag", "Inspeção");
    quay_cmd(dir.path())
        .args(["column", "rename", "demandas", "Entrada"])
        .assert()
        .success();

    let board = json_of(dir.path(), &["board"]);
    assert_eq!(board["columns"][0]["key"], "demandas");
    assert_eq!(board["columns"][0]["title"], "Entrada");
    assert_eq!(board["columns"][0]["cards"][0]["id"], id);
}

#[test]
fn empty_column_can_be_removed() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    quay_cmd(dir.path())
        .args(["column", "add", "Em Teste"])
        .assert()
        .success();
    quay_cmd(dir.path())
        .args(["column", "remove", "em_teste"])
        .assert()
        .success();
    let columns = json_of(dir.path(), &["column", "list"]);
    assert_eq!(columns.as_array().unwrap().len(), 5);
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn json_errors_are_wrapped() {
    let dir = TempDir::new().unwrap();
    let output = quay_cmd(dir.path())
        .args(["board", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(json["error"]["error_code"], "E1001");
}

#[test]
fn text_output_is_tab_separated() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    create_card(dir.path(), "Hapag", "Inspeção");
    quay_cmd(dir.path())
        .args(["card", "list", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id\tstatus\turgency"))
        .stdout(predicate::str::contains("1\tdemandas\tnormal\t-\tHapag\tInspeção"));
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().unwrap();
    quay_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quay"));
}
