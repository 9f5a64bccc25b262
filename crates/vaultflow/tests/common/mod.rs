#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! once assert_cmd 2.1 is the minimum

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A complete stack file for the Koyeb provider
#[allow(dead_code)]
pub const KOYEB_STACK_YAML: &str = r#"
config:
  vaultflow:cloud_provider: koyeb
  koyeb:resource_name: koyeb-vault
  koyeb:service_name: vault
  koyeb:service_type: nano
  koyeb:service_instance_vcpu: 0.25
  koyeb:service_instance_memory: 512
  koyeb:service_instance_disk: 2
  koyeb:service_instance_port: "8200,http"
  hashicorp_vault:github_repo: example/vault-koyeb
  hashicorp_vault:github_repo_branch: main
  hashicorp_vault:dockerfile_path: Dockerfile
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    #[allow(dead_code)]
    pub fn write_stack(&self, stack: &str, content: &str) {
        let path = self.root.path().join(format!("Vaultflow.{}.yaml", stack));
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, stack: &str, content: &str) {
        let dir = self.root.path().join(".vaultflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.state.json", stack)), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// The CLI running inside this project with a clean environment
    #[allow(dead_code)]
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("vaultflow").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("VAULTFLOW_STACK")
            .env_remove("VAULTFLOW_STACK_FILE")
            .env_remove("KOYEB_TOKEN")
            .env_remove("KOYEB_API_URL")
            .env_remove("AWS_ACCESS_KEY_ID")
            .env_remove("AWS_SECRET_ACCESS_KEY")
            .env_remove("VAULT_ADDR")
            .env_remove("VAULT_INIT_JSON");
        cmd
    }
}
