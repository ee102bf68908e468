//! Web jobs of hosted websites and the client collaborator.
//!
//! A web job is a background task attached to a website, either run on
//! demand (`triggered`) or kept alive by the platform (`continuous`). The
//! commands in this module validate their parameters, build a
//! [`WebJobRequest`] and hand it to a [`WebJobClient`].

mod commands;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::ClientFuture;
use crate::params::ValidationError;
use crate::slot::Slot;

pub use commands::{GetWebJob, NewWebJob, RemoveWebJob, build_webjob_request};

/// How the platform runs a web job.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Runs when invoked or on a schedule.
    Triggered,
    /// Runs continuously.
    Continuous,
}

impl JobType {
    /// Accepted spellings, compared without regard to ASCII case.
    pub const NAMES: &'static [&'static str] = &["triggered", "continuous"];

    /// Lowercase name used on the wire and in output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Continuous => "continuous",
        }
    }

    /// Resolves an already validated job type parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAllowed`] when `value` names no job
    /// type.
    pub fn from_parameter(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        value
            .parse()
            .map_err(|UnknownJobType(value)| ValidationError::NotAllowed {
                field,
                value,
                allowed: Self::NAMES,
            })
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a job type name is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown web job type '{0}' (expected triggered or continuous)")]
pub struct UnknownJobType(pub String);

impl FromStr for JobType {
    type Err = UnknownJobType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("triggered") {
            Ok(Self::Triggered)
        } else if trimmed.eq_ignore_ascii_case("continuous") {
            Ok(Self::Continuous)
        } else {
            Err(UnknownJobType(trimmed.to_owned()))
        }
    }
}

/// Web job as reported by the service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JobDescriptor {
    /// Job name, unique per website and job type.
    pub job_name: String,
    /// How the job runs.
    pub job_type: JobType,
    /// Run status reported by the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Management URL of the job, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Fully validated request to create a web job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WebJobRequest {
    /// Website name.
    pub site_name: String,
    /// Website slot.
    pub slot: Slot,
    /// Name of the new job.
    pub job_name: String,
    /// How the job runs.
    pub job_type: JobType,
    /// Local path of the job's executable or archive.
    pub job_file: String,
}

/// Collaborator that manages the web jobs of a website.
pub trait WebJobClient {
    /// Provider specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Uploads the job file and creates the job.
    fn create_job<'a>(
        &'a self,
        request: &'a WebJobRequest,
    ) -> ClientFuture<'a, JobDescriptor, Self::Error>;

    /// Lists the jobs of a website, optionally restricted to one type.
    fn list_jobs<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_type: Option<JobType>,
    ) -> ClientFuture<'a, Vec<JobDescriptor>, Self::Error>;

    /// Deletes a job.
    fn delete_job<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_name: &'a str,
        job_type: JobType,
    ) -> ClientFuture<'a, (), Self::Error>;
}
