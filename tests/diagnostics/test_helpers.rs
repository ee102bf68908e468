//! Shared fixtures for diagnostics CLI scenarios.

use std::process::Output;
use std::sync::{Arc, LazyLock};

use escargot::CargoBuild;
use rstest::fixture;
use tempfile::TempDir;

use crate::test_constants::{SERVICE_NAME, STORAGE_ACCOUNT};

#[derive(Clone, Debug)]
pub struct CliOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn from_process_output(output: Output) -> Self {
        let Output {
            status,
            stdout: raw_stdout,
            stderr: raw_stderr,
        } = output;
        let status_code = status.code().unwrap_or(1);
        let stdout = String::from_utf8_lossy(&raw_stdout).into_owned();
        let stderr = String::from_utf8_lossy(&raw_stderr).into_owned();
        Self {
            status_code,
            stdout,
            stderr,
        }
    }

    /// Returns the operations echoed by the fake backend, in call order.
    pub fn recorded_operations(&self) -> Vec<&str> {
        self.stderr
            .lines()
            .filter_map(|line| line.strip_prefix("call: "))
            .filter_map(|call| call.split_once('(').map(|(operation, _)| operation))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct CliContext {
    pub failing_operation: Option<String>,
    pub output: Option<CliOutput>,
    pub tmp_dir: Option<Arc<TempDir>>,
}

#[expect(
    clippy::expect_used,
    reason = "test setup requires panic on build failure"
)]
static MGMTCTL_BIN: LazyLock<escargot::CargoRun> = LazyLock::new(|| {
    CargoBuild::new()
        .bin("mgmtctl")
        .features("test-backdoors")
        .run()
        .expect("failed to build mgmtctl with test-backdoors feature")
});

pub fn mgmtctl_cmd() -> assert_cmd::Command {
    MGMTCTL_BIN.command().into()
}

impl CliContext {
    pub fn base_command(&self) -> assert_cmd::Command {
        let mut cmd = mgmtctl_cmd();
        cmd.env("MGMTCTL_FAKE_BACKEND", "1");
        cmd.env_remove("MGMTCTL_FAKE_FAILURE");
        if let Some(operation) = &self.failing_operation {
            cmd.env("MGMTCTL_FAKE_FAILURE", operation);
        }
        cmd
    }

    pub fn set_diagnostics_command(&self) -> assert_cmd::Command {
        let mut cmd = self.base_command();
        cmd.args([
            "set-diagnostics-extension",
            "--service-name",
            SERVICE_NAME,
            "--storage-account-name",
            STORAGE_ACCOUNT,
        ]);
        cmd
    }
}

#[fixture]
pub fn cli_context() -> CliContext {
    CliContext {
        failing_operation: None,
        output: None,
        tmp_dir: None,
    }
}
