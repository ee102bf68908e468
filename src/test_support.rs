//! Test support utilities shared across unit and integration tests.
//!
//! The recording collaborators also back the binary's `test-backdoors`
//! feature, so CLI tests can run commands without a management endpoint.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::dispatch::ClientFuture;
use crate::extension::{
    Deployment, DeploymentTarget, ExtensionConfiguration, ExtensionConfigurationRequest,
    ExtensionManager, OperationStatus,
};
use crate::output::{OutputError, OutputSink};
use crate::slot::Slot;
use crate::webjob::{JobDescriptor, JobType, WebJobClient, WebJobRequest};

/// Error returned by the recording doubles when a failure is injected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TestDoubleError {
    /// The named operation was configured to fail.
    #[error("injected failure in {operation}")]
    Injected {
        /// Operation that failed.
        operation: &'static str,
    },
}

/// Output sink that keeps every object as JSON.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    objects: Vec<serde_json::Value>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the objects written so far, in order.
    #[must_use]
    pub fn objects(&self) -> Vec<serde_json::Value> {
        self.objects.clone()
    }
}

impl OutputSink for RecordingSink {
    fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), OutputError> {
        let object =
            serde_json::to_value(value).map_err(|err| OutputError::Serialise(err.to_string()))?;
        self.objects.push(object);
        Ok(())
    }
}

/// Call observed by [`RecordingWebJobClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WebJobCall {
    /// `create_job`.
    Create(WebJobRequest),
    /// `list_jobs`.
    List {
        /// Website name.
        site_name: String,
        /// Website slot.
        slot: Slot,
        /// Type filter.
        job_type: Option<JobType>,
    },
    /// `delete_job`.
    Delete {
        /// Website name.
        site_name: String,
        /// Website slot.
        slot: Slot,
        /// Job name.
        job_name: String,
        /// Job type.
        job_type: JobType,
    },
}

impl fmt::Display for WebJobCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(request) => write!(
                f,
                "create_job({:?}, {}, {:?}, {}, {:?})",
                request.site_name,
                request.slot,
                request.job_name,
                request.job_type,
                request.job_file
            ),
            Self::List {
                site_name,
                slot,
                job_type,
            } => match job_type {
                Some(kind) => write!(f, "list_jobs({site_name:?}, {slot}, {kind})"),
                None => write!(f, "list_jobs({site_name:?}, {slot})"),
            },
            Self::Delete {
                site_name,
                slot,
                job_name,
                job_type,
            } => write!(
                f,
                "delete_job({site_name:?}, {slot}, {job_name:?}, {job_type})"
            ),
        }
    }
}

#[derive(Debug, Default)]
struct WebJobState {
    calls: Vec<WebJobCall>,
    jobs: Vec<JobDescriptor>,
    failing: BTreeSet<&'static str>,
}

/// In-memory web job client that records every call.
///
/// Created jobs are kept and reported by later `list_jobs` calls.
#[derive(Clone, Debug, Default)]
pub struct RecordingWebJobClient {
    state: Arc<Mutex<WebJobState>>,
}

impl RecordingWebJobClient {
    /// Creates a client with no jobs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jobs reported by `list_jobs`.
    #[must_use]
    pub fn with_jobs(self, jobs: Vec<JobDescriptor>) -> Self {
        self.lock().jobs = jobs;
        self
    }

    /// Makes the named operation (`create_job`, `list_jobs` or
    /// `delete_job`) fail.
    pub fn fail_operation(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Returns every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<WebJobCall> {
        self.lock().calls.clone()
    }

    /// Returns the number of `create_job` calls.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, WebJobCall::Create(_)))
            .count()
    }

    /// Returns the jobs currently held.
    #[must_use]
    pub fn jobs(&self) -> Vec<JobDescriptor> {
        self.lock().jobs.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WebJobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, operation: &'static str, call: WebJobCall) -> Result<(), TestDoubleError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(TestDoubleError::Injected { operation });
        }
        Ok(())
    }
}

impl WebJobClient for RecordingWebJobClient {
    type Error = TestDoubleError;

    fn create_job<'a>(
        &'a self,
        request: &'a WebJobRequest,
    ) -> ClientFuture<'a, JobDescriptor, Self::Error> {
        Box::pin(async move {
            self.record("create_job", WebJobCall::Create(request.clone()))?;
            let descriptor = JobDescriptor {
                job_name: request.job_name.clone(),
                job_type: request.job_type,
                status: None,
                url: None,
            };
            self.lock().jobs.push(descriptor.clone());
            Ok(descriptor)
        })
    }

    fn list_jobs<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_type: Option<JobType>,
    ) -> ClientFuture<'a, Vec<JobDescriptor>, Self::Error> {
        Box::pin(async move {
            self.record(
                "list_jobs",
                WebJobCall::List {
                    site_name: site_name.to_owned(),
                    slot,
                    job_type,
                },
            )?;
            Ok(self
                .lock()
                .jobs
                .iter()
                .filter(|job| job_type.is_none_or(|kind| job.job_type == kind))
                .cloned()
                .collect())
        })
    }

    fn delete_job<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_name: &'a str,
        job_type: JobType,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(
                "delete_job",
                WebJobCall::Delete {
                    site_name: site_name.to_owned(),
                    slot,
                    job_name: job_name.to_owned(),
                    job_type,
                },
            )?;
            self.lock()
                .jobs
                .retain(|job| !(job.job_name == job_name && job.job_type == job_type));
            Ok(())
        })
    }
}

/// Call observed by [`RecordingExtensionManager`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExtensionCall {
    /// `deployment`.
    Deployment(DeploymentTarget),
    /// `storage_key`.
    StorageKey(String),
    /// `install`.
    Install {
        /// Deployment addressed.
        target: DeploymentTarget,
        /// Request handed over.
        request: ExtensionConfigurationRequest,
    },
    /// `apply`.
    Apply {
        /// Deployment addressed.
        target: DeploymentTarget,
        /// Configuration applied.
        configuration: ExtensionConfiguration,
    },
}

impl fmt::Display for ExtensionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment(target) => {
                write!(f, "deployment({:?}, {})", target.service_name, target.slot)
            }
            Self::StorageKey(account) => write!(f, "storage_key({account:?})"),
            Self::Install { target, request } => write!(
                f,
                "install({:?}, {}, {}, roles={:?})",
                target.service_name,
                target.slot,
                request.extension_type(),
                request.roles().role_names()
            ),
            Self::Apply {
                target,
                configuration,
            } => {
                let ids: Vec<&str> = configuration
                    .references()
                    .map(|reference| reference.id.as_str())
                    .collect();
                write!(
                    f,
                    "apply({:?}, {}, extensions={ids:?})",
                    target.service_name, target.slot
                )
            }
        }
    }
}

impl ExtensionCall {
    /// Reports whether the call changes remote state.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::Install { .. } | Self::Apply { .. })
    }
}

#[derive(Debug, Default)]
struct ExtensionState {
    calls: Vec<ExtensionCall>,
    deployments: BTreeMap<(String, Slot), Deployment>,
    storage_keys: BTreeMap<String, String>,
    reserved_ids: Vec<String>,
    failing: BTreeSet<&'static str>,
}

/// In-memory extension manager that records every call.
///
/// `install` merges the request into the existing configuration the same
/// way the REST client does, without uploading anything.
#[derive(Clone, Debug, Default)]
pub struct RecordingExtensionManager {
    state: Arc<Mutex<ExtensionState>>,
}

impl RecordingExtensionManager {
    /// Creates a manager that knows no deployments or storage accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deployment.
    #[must_use]
    pub fn with_deployment(self, service_name: &str, slot: Slot, deployment: Deployment) -> Self {
        self.lock()
            .deployments
            .insert((service_name.to_owned(), slot), deployment);
        self
    }

    /// Registers a storage account and its key.
    #[must_use]
    pub fn with_storage_key(self, account: &str, key: &str) -> Self {
        self.lock()
            .storage_keys
            .insert(account.to_owned(), key.to_owned());
        self
    }

    /// Marks extension identifiers as already registered with the service.
    #[must_use]
    pub fn with_reserved_ids(self, ids: &[&str]) -> Self {
        self.lock()
            .reserved_ids
            .extend(ids.iter().map(|id| (*id).to_owned()));
        self
    }

    /// Makes the named operation (`deployment`, `storage_key`, `install` or
    /// `apply`) fail.
    pub fn fail_operation(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Returns every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ExtensionCall> {
        self.lock().calls.clone()
    }

    /// Returns the number of calls that change remote state.
    #[must_use]
    pub fn mutating_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_mutating())
            .count()
    }

    /// Returns the last configuration passed to `apply`.
    #[must_use]
    pub fn applied_configuration(&self) -> Option<ExtensionConfiguration> {
        self.lock().calls.iter().rev().find_map(|call| match call {
            ExtensionCall::Apply { configuration, .. } => Some(configuration.clone()),
            _ => None,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExtensionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, operation: &'static str, call: ExtensionCall) -> Result<(), TestDoubleError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(TestDoubleError::Injected { operation });
        }
        Ok(())
    }
}

impl ExtensionManager for RecordingExtensionManager {
    type Error = TestDoubleError;

    fn deployment<'a>(
        &'a self,
        target: &'a DeploymentTarget,
    ) -> ClientFuture<'a, Option<Deployment>, Self::Error> {
        Box::pin(async move {
            self.record("deployment", ExtensionCall::Deployment(target.clone()))?;
            Ok(self
                .lock()
                .deployments
                .get(&(target.service_name.clone(), target.slot))
                .cloned())
        })
    }

    fn storage_key<'a>(
        &'a self,
        account: &'a str,
    ) -> ClientFuture<'a, Option<String>, Self::Error> {
        Box::pin(async move {
            self.record("storage_key", ExtensionCall::StorageKey(account.to_owned()))?;
            Ok(self.lock().storage_keys.get(account).cloned())
        })
    }

    fn install<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        request: &'a ExtensionConfigurationRequest,
        existing: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, ExtensionConfiguration, Self::Error> {
        Box::pin(async move {
            self.record(
                "install",
                ExtensionCall::Install {
                    target: target.clone(),
                    request: request.clone(),
                },
            )?;
            let mut state = self.lock();
            let plan = existing.plan_install(
                request.provider_namespace(),
                request.extension_type(),
                target.slot,
                request.roles(),
                &state.reserved_ids,
            );
            state.reserved_ids.extend(plan.new_ids);
            Ok(plan.configuration)
        })
    }

    fn apply<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        configuration: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, OperationStatus, Self::Error> {
        Box::pin(async move {
            self.record(
                "apply",
                ExtensionCall::Apply {
                    target: target.clone(),
                    configuration: configuration.clone(),
                },
            )?;
            let mut state = self.lock();
            let operation_id = format!("op-{}", state.calls.len());
            if let Some(deployment) = state
                .deployments
                .get_mut(&(target.service_name.clone(), target.slot))
            {
                deployment.extension_configuration = configuration.clone();
            }
            Ok(OperationStatus {
                operation_id,
                status: String::from("Succeeded"),
            })
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push((key.to_string(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
