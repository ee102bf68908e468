//! BDD scenarios for the diagnostics extension CLI commands.

use rstest_bdd_macros::scenario;

use super::test_helpers::{CliContext, cli_context};

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Install diagnostics on every role"
)]
fn scenario_install_all_roles(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Install diagnostics on a named staging role with a configuration file"
)]
fn scenario_install_named_role(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Reject a role missing from the deployment"
)]
fn scenario_unknown_role(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Require a certificate source"
)]
fn scenario_missing_certificate(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Reject two certificate sources"
)]
fn scenario_both_certificates(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Remove diagnostics from every role"
)]
fn scenario_remove(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/diagnostics.feature",
    name = "Surface manager failures verbatim"
)]
fn scenario_manager_failure(cli_context: CliContext) {
    let _ = cli_context;
}
