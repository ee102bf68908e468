//! BDD step definitions for the web job commands.

use mgmtctl::test_support::WebJobCall;
use mgmtctl::{GetWebJob, JobDescriptor, JobType, NewWebJob, RemoveWebJob, Slot};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{WebJobContext, WebJobOutcome};
use crate::test_constants::WEBSITE_NAME;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("failed to start runtime: {0}")]
    Runtime(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Runtime(err.to_string()))
}

fn triggered(job_name: &str) -> JobDescriptor {
    JobDescriptor {
        job_name: job_name.to_owned(),
        job_type: JobType::Triggered,
        status: None,
        url: None,
    }
}

#[given("a website without web jobs")]
fn website_without_jobs(webjob_context: WebJobContext) -> WebJobContext {
    webjob_context
}

#[given("a website with web jobs \"{first}\" and \"{second}\"")]
fn website_with_jobs(webjob_context: WebJobContext, first: String, second: String) -> WebJobContext {
    WebJobContext {
        client: webjob_context
            .client
            .with_jobs(vec![triggered(&first), triggered(&second)]),
        ..webjob_context
    }
}

#[given("the web job client fails on \"{operation}\"")]
fn client_fails(webjob_context: WebJobContext, operation: String) -> WebJobContext {
    match operation.as_str() {
        "create_job" => webjob_context.client.fail_operation("create_job"),
        "list_jobs" => webjob_context.client.fail_operation("list_jobs"),
        "delete_job" => webjob_context.client.fail_operation("delete_job"),
        other => panic!("unknown web job operation: {other}"),
    }
    webjob_context
}

#[when("I create web job \"{job_name}\" of type \"{job_type}\" from \"{job_file}\" on slot \"{slot}\"")]
fn create_job(
    webjob_context: WebJobContext,
    job_name: String,
    job_type: String,
    job_file: String,
    slot: String,
) -> Result<WebJobContext, StepError> {
    let command = NewWebJob {
        name: Some(String::from(WEBSITE_NAME)),
        slot: Some(slot),
        job_name: Some(job_name),
        job_type: Some(job_type),
        job_file: Some(job_file),
    };
    let WebJobContext {
        client, mut sink, ..
    } = webjob_context;

    let result = runtime()?.block_on(command.execute(&client, &mut sink));

    Ok(WebJobContext {
        client,
        sink,
        outcome: Some(WebJobOutcome::from_result(result)),
    })
}

#[when("I list web jobs named \"{job_name}\"")]
fn list_jobs(webjob_context: WebJobContext, job_name: String) -> Result<WebJobContext, StepError> {
    let command = GetWebJob {
        name: Some(String::from(WEBSITE_NAME)),
        job_name: Some(job_name),
        ..GetWebJob::default()
    };
    let WebJobContext {
        client, mut sink, ..
    } = webjob_context;

    let result = runtime()?.block_on(command.execute(&client, &mut sink));

    Ok(WebJobContext {
        client,
        sink,
        outcome: Some(WebJobOutcome::from_result(result)),
    })
}

#[when("I remove triggered web job \"{job_name}\"")]
fn remove_job(webjob_context: WebJobContext, job_name: String) -> Result<WebJobContext, StepError> {
    let command = RemoveWebJob {
        name: Some(String::from(WEBSITE_NAME)),
        slot: None,
        job_name: Some(job_name),
        job_type: Some(String::from("triggered")),
    };

    let result = runtime()?.block_on(command.execute(&webjob_context.client));

    Ok(WebJobContext {
        outcome: Some(WebJobOutcome::from_result(result)),
        ..webjob_context
    })
}

#[then("the command succeeds")]
fn command_succeeds(webjob_context: &WebJobContext) -> Result<(), StepError> {
    match &webjob_context.outcome {
        Some(WebJobOutcome::Success) => Ok(()),
        Some(other) => Err(StepError::Assertion(format!(
            "expected success, got {other:?}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the command is rejected for parameter \"{field}\"")]
fn command_rejected(webjob_context: &WebJobContext, field: String) -> Result<(), StepError> {
    match &webjob_context.outcome {
        Some(WebJobOutcome::Rejected { field: actual }) if *actual == field => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected rejection of {field}, got {other:?}"
        ))),
    }
}

#[then("the command fails with \"{message}\"")]
fn command_fails(webjob_context: &WebJobContext, message: String) -> Result<(), StepError> {
    match &webjob_context.outcome {
        Some(WebJobOutcome::Failure(actual)) if *actual == message => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure '{message}', got {other:?}"
        ))),
    }
}

#[then("the client received no calls")]
fn no_calls(webjob_context: &WebJobContext) -> Result<(), StepError> {
    let calls = webjob_context.client.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}

#[then("the client received {count} create call for \"{job_name}\" on slot \"{slot}\"")]
fn create_calls(
    webjob_context: &WebJobContext,
    count: usize,
    job_name: String,
    slot: String,
) -> Result<(), StepError> {
    let expected_slot: Slot = slot
        .parse()
        .map_err(|err| StepError::Assertion(format!("bad slot in scenario: {err}")))?;
    let matching = webjob_context
        .client
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                WebJobCall::Create(request)
                    if request.site_name == WEBSITE_NAME
                        && request.job_name == job_name
                        && request.slot == expected_slot
            )
        })
        .count();
    if matching == count && webjob_context.client.create_calls() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} create call(s), got {:?}",
            webjob_context.client.calls()
        )))
    }
}

#[then("{count} job descriptor is written")]
fn descriptors_written(webjob_context: &WebJobContext, count: usize) -> Result<(), StepError> {
    let objects = webjob_context.sink.objects();
    if objects.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} descriptor(s), got {objects:?}"
        )))
    }
}

#[then("the website keeps {count} web job")]
fn jobs_remaining(webjob_context: &WebJobContext, count: usize) -> Result<(), StepError> {
    let jobs = webjob_context.client.jobs();
    if jobs.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} remaining job(s), got {jobs:?}"
        )))
    }
}
