//! Recording collaborators for CLI tests, compiled with `test-backdoors`.
//!
//! Setting `MGMTCTL_FAKE_BACKEND=1` replaces the REST client with in-memory
//! doubles. `MGMTCTL_FAKE_FAILURE` names one operation to fail. Every call
//! the doubles observe is echoed to stderr as a `call: ...` line.

use std::env;
use std::io::Write;

use mgmtctl::test_support::{RecordingExtensionManager, RecordingWebJobClient};
use mgmtctl::{Deployment, JobDescriptor, JobType, Slot};

const FAKE_BACKEND_ENV: &str = "MGMTCTL_FAKE_BACKEND";
const FAKE_FAILURE_ENV: &str = "MGMTCTL_FAKE_FAILURE";

pub(crate) struct FakeBackend {
    pub(crate) manager: RecordingExtensionManager,
    pub(crate) jobs: RecordingWebJobClient,
}

pub(crate) fn from_env() -> Option<FakeBackend> {
    if env::var(FAKE_BACKEND_ENV).ok()? != "1" {
        return None;
    }

    let deployment = Deployment {
        name: String::from("fake-deployment"),
        roles: vec![String::from("WebRole1"), String::from("WorkerRole1")],
        ..Deployment::default()
    };
    let manager = RecordingExtensionManager::new()
        .with_deployment("svc", Slot::Production, deployment.clone())
        .with_deployment("svc", Slot::Staging, deployment)
        .with_storage_key("diagstore", "fake-storage-key");
    let jobs = RecordingWebJobClient::new().with_jobs(vec![JobDescriptor {
        job_name: String::from("nightly"),
        job_type: JobType::Triggered,
        status: Some(String::from("Ready")),
        url: None,
    }]);

    if let Ok(operation) = env::var(FAKE_FAILURE_ENV) {
        match operation.as_str() {
            "deployment" => manager.fail_operation("deployment"),
            "storage_key" => manager.fail_operation("storage_key"),
            "install" => manager.fail_operation("install"),
            "apply" => manager.fail_operation("apply"),
            "create_job" => jobs.fail_operation("create_job"),
            "list_jobs" => jobs.fail_operation("list_jobs"),
            "delete_job" => jobs.fail_operation("delete_job"),
            _ => {}
        }
    }

    Some(FakeBackend { manager, jobs })
}

pub(crate) fn write_calls(mut target: impl Write, backend: &FakeBackend) {
    for call in backend.manager.calls() {
        writeln!(target, "call: {call}").ok();
    }
    for call in backend.jobs.calls() {
        writeln!(target, "call: {call}").ok();
    }
}
