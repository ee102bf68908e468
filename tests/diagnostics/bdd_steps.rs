//! BDD step definitions for the diagnostics extension CLI commands.

use std::fs;
use std::sync::Arc;

use rstest_bdd_macros::{given, then, when};
use tempfile::TempDir;

use super::test_helpers::{CliContext, CliOutput};
use crate::test_constants::SERVICE_NAME;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("failed to execute mgmtctl command: {0}")]
    Execution(String),
    #[error("failed to create temp file: {0}")]
    TempFile(String),
}

fn run(
    mut cli_context: CliContext,
    mut cmd: assert_cmd::Command,
    tmp_dir: Option<TempDir>,
) -> Result<CliContext, StepError> {
    let output = cmd
        .output()
        .map_err(|err| StepError::Execution(err.to_string()))?;

    if let Some(dir) = tmp_dir {
        cli_context.tmp_dir = Some(Arc::new(dir));
    }
    cli_context.output = Some(CliOutput::from_process_output(output));
    Ok(cli_context)
}

fn output(cli_context: &CliContext) -> Result<&CliOutput, StepError> {
    cli_context
        .output
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("missing command output")))
}

#[given("the fake management backend is enabled")]
fn fake_backend_enabled(cli_context: CliContext) -> CliContext {
    cli_context
}

#[given("the fake backend fails on \"{operation}\"")]
fn fake_backend_fails(mut cli_context: CliContext, operation: String) -> CliContext {
    cli_context.failing_operation = Some(operation);
    cli_context
}

#[when("I set the diagnostics extension with thumbprint \"{thumbprint}\"")]
fn set_with_thumbprint(
    cli_context: CliContext,
    thumbprint: String,
) -> Result<CliContext, StepError> {
    let mut cmd = cli_context.set_diagnostics_command();
    cmd.args(["--certificate-thumbprint", thumbprint.as_str()]);
    run(cli_context, cmd, None)
}

#[when(
    "I set the diagnostics extension on role \"{role}\" in slot \"{slot}\" with configuration \"{configuration}\""
)]
fn set_with_configuration(
    cli_context: CliContext,
    role: String,
    slot: String,
    configuration: String,
) -> Result<CliContext, StepError> {
    let tmp_dir = TempDir::new().map_err(|err| StepError::TempFile(err.to_string()))?;
    let file_path = tmp_dir.path().join("diagnostics.wadcfg");
    fs::write(&file_path, configuration).map_err(|err| StepError::TempFile(err.to_string()))?;
    let file_path_string = file_path
        .to_str()
        .ok_or_else(|| StepError::TempFile(String::from("non-utf8 file path")))?;

    let mut cmd = cli_context.set_diagnostics_command();
    cmd.args([
        "--certificate-thumbprint",
        "ABCDEF0123",
        "--role",
        role.as_str(),
        "--slot",
        slot.as_str(),
        "--diagnostics-configuration-file",
        file_path_string,
    ]);
    run(cli_context, cmd, Some(tmp_dir))
}

#[when(
    "I set the diagnostics extension with a certificate file and thumbprint \"{thumbprint}\""
)]
fn set_with_both_certificates(
    cli_context: CliContext,
    thumbprint: String,
) -> Result<CliContext, StepError> {
    let tmp_dir = TempDir::new().map_err(|err| StepError::TempFile(err.to_string()))?;
    let file_path = tmp_dir.path().join("diagnostics.cer");
    fs::write(&file_path, [0x30, 0x82, 0x01])
        .map_err(|err| StepError::TempFile(err.to_string()))?;
    let file_path_string = file_path
        .to_str()
        .ok_or_else(|| StepError::TempFile(String::from("non-utf8 file path")))?;

    let mut cmd = cli_context.set_diagnostics_command();
    cmd.args([
        "--certificate-file",
        file_path_string,
        "--certificate-thumbprint",
        thumbprint.as_str(),
    ]);
    run(cli_context, cmd, Some(tmp_dir))
}

#[when("I set the diagnostics extension without a certificate")]
fn set_without_certificate(cli_context: CliContext) -> Result<CliContext, StepError> {
    let cmd = cli_context.set_diagnostics_command();
    run(cli_context, cmd, None)
}

#[when("I remove the diagnostics extension")]
fn remove_extension(cli_context: CliContext) -> Result<CliContext, StepError> {
    let mut cmd = cli_context.base_command();
    cmd.args(["remove-diagnostics-extension", "--service-name", SERVICE_NAME]);
    run(cli_context, cmd, None)
}

#[then("the command exits successfully")]
fn exits_successfully(cli_context: &CliContext) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.status_code == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected exit status 0, got {}: {}",
            result.status_code, result.stderr
        )))
    }
}

#[then("the command exits with status {code:i32}")]
fn exits_with_status(cli_context: &CliContext, code: i32) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.status_code == code {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected exit status {code}, got {}: {}",
            result.status_code, result.stderr
        )))
    }
}

#[then("stdout reports status \"{status}\"")]
fn stdout_reports_status(cli_context: &CliContext, status: String) -> Result<(), StepError> {
    let result = output(cli_context)?;
    let document: serde_json::Value = serde_json::from_str(&result.stdout)
        .map_err(|err| StepError::Assertion(format!("stdout is not JSON: {err}")))?;
    match document.get("status").and_then(serde_json::Value::as_str) {
        Some(actual) if actual == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected status '{status}', got {other:?}"
        ))),
    }
}

#[then("the command fails with error containing \"{snippet}\"")]
fn fails_with_error(cli_context: &CliContext, snippet: String) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.status_code == 0 {
        return Err(StepError::Assertion(String::from(
            "expected non-zero exit status",
        )));
    }
    if !result.stderr.contains(&snippet) {
        return Err(StepError::Assertion(format!(
            "expected stderr to contain '{snippet}', got: {}",
            result.stderr
        )));
    }
    Ok(())
}

#[then("the backend recorded an \"{operation}\" call")]
fn recorded_call(cli_context: &CliContext, operation: String) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.recorded_operations().contains(&operation.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a {operation} call, got: {}",
            result.stderr
        )))
    }
}

#[then("the backend recorded no \"{operation}\" call")]
fn no_recorded_call(cli_context: &CliContext, operation: String) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.recorded_operations().contains(&operation.as_str()) {
        Err(StepError::Assertion(format!(
            "unexpected {operation} call: {}",
            result.stderr
        )))
    } else {
        Ok(())
    }
}
