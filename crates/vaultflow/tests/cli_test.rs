mod common;

use common::{KOYEB_STACK_YAML, TestProject};
use predicates::prelude::*;

const STATE_WITH_OUTPUT: &str = r#"{
  "version": 1,
  "updated_at": "2026-01-01T00:00:00Z",
  "resources": {},
  "outputs": {
    "service_url": "vault-koyeb-vault.koyeb.app"
  }
}"#;

#[test]
fn test_cli_help() {
    let project = TestProject::new();
    project
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deploy HashiCorp Vault"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("output"))
        .stdout(predicate::str::contains("destroy"));
}

#[test]
fn test_cli_version() {
    let project = TestProject::new();
    project
        .command()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultflow"));
}

#[test]
fn test_up_help() {
    let project = TestProject::new();
    project
        .command()
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stack"))
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("VAULTFLOW_STACK"));
}

#[test]
fn test_invalid_command() {
    let project = TestProject::new();
    project.command().arg("invalid-command").assert().failure();
}

#[test]
fn test_up_without_stack_file_fails() {
    let project = TestProject::new();
    project
        .command()
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stack file for stack 'dev' not found"));
}

#[test]
fn test_stack_from_env() {
    let project = TestProject::new();
    project
        .command()
        .env("VAULTFLOW_STACK", "prod")
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack 'prod'"));
}

#[test]
fn test_preview_without_token_fails() {
    let project = TestProject::new();
    project.write_stack("dev", KOYEB_STACK_YAML);
    project
        .command()
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KOYEB_TOKEN"));
}

#[test]
fn test_preview_masks_credentials() {
    let project = TestProject::new();
    project.write_stack("dev", KOYEB_STACK_YAML);
    project
        .command()
        .env("KOYEB_TOKEN", "token")
        .env("AWS_SECRET_ACCESS_KEY", "very-secret-value")
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("koyeb:index/service:Service:vault"))
        .stdout(predicate::str::contains("1 to create"))
        .stdout(predicate::str::contains("service_url"))
        .stdout(predicate::str::contains("very-secret-value").not());

    assert!(!project.path().join(".vaultflow/dev.state.json").exists());
}

#[test]
fn test_up_without_yes_stops_after_plan() {
    let project = TestProject::new();
    project.write_stack("dev", KOYEB_STACK_YAML);
    project
        .command()
        .env("KOYEB_TOKEN", "token")
        .arg("up")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 to create"))
        .stdout(predicate::str::contains("--yes"));

    assert!(!project.path().join(".vaultflow/dev.state.json").exists());
}

#[test]
fn test_unsupported_provider_lists_available() {
    let project = TestProject::new();
    project.write_stack(
        "dev",
        &KOYEB_STACK_YAML.replace("cloud_provider: koyeb", "cloud_provider: provider_name"),
    );
    project
        .command()
        .env("KOYEB_TOKEN", "token")
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cloud provider 'provider_name' is not supported",
        ))
        .stderr(predicate::str::contains("Available providers: koyeb"));
}

#[test]
fn test_output_reads_state() {
    let project = TestProject::new();
    project.write_state("dev", STATE_WITH_OUTPUT);
    project
        .command()
        .args(["output", "service_url"])
        .assert()
        .success()
        .stdout("vault-koyeb-vault.koyeb.app\n");

    project
        .command()
        .arg("output")
        .assert()
        .success()
        .stdout(predicate::str::contains("service_url"));
}

#[test]
fn test_output_unknown_name_fails() {
    let project = TestProject::new();
    project.write_state("dev", STATE_WITH_OUTPUT);
    project
        .command()
        .args(["output", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output 'missing' not found"));
}

#[test]
fn test_output_without_state() {
    let project = TestProject::new();
    project
        .command()
        .args(["output", "--stack", "stg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No outputs for stack 'stg'"));
}

#[test]
fn test_destroy_empty_stack() {
    let project = TestProject::new();
    project
        .command()
        .args(["destroy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to destroy"));
}
