//! BDD scenarios for the web job commands.

use rstest_bdd_macros::scenario;

use super::test_helpers::{WebJobContext, webjob_context};

#[scenario(
    path = "tests/features/webjob.feature",
    name = "Create a triggered web job on the staging slot"
)]
fn scenario_create_job(webjob_context: WebJobContext) {
    let _ = webjob_context;
}

#[scenario(
    path = "tests/features/webjob.feature",
    name = "Reject an unknown job type"
)]
fn scenario_unknown_job_type(webjob_context: WebJobContext) {
    let _ = webjob_context;
}

#[scenario(
    path = "tests/features/webjob.feature",
    name = "Reject an unknown slot"
)]
fn scenario_unknown_slot(webjob_context: WebJobContext) {
    let _ = webjob_context;
}

#[scenario(
    path = "tests/features/webjob.feature",
    name = "List web jobs filtered by name"
)]
fn scenario_list_by_name(webjob_context: WebJobContext) {
    let _ = webjob_context;
}

#[scenario(path = "tests/features/webjob.feature", name = "Remove a web job")]
fn scenario_remove_job(webjob_context: WebJobContext) {
    let _ = webjob_context;
}

#[scenario(
    path = "tests/features/webjob.feature",
    name = "Surface client failures verbatim"
)]
fn scenario_client_failure(webjob_context: WebJobContext) {
    let _ = webjob_context;
}
