//! Web job commands.

use tracing::info;

use super::{JobDescriptor, JobType, WebJobClient, WebJobRequest};
use crate::dispatch::{CommandError, Invocation, Phase, forward};
use crate::output::OutputSink;
use crate::params::{
    CommandParameters, FieldSpec, ParameterBag, Rule, ValidatedParameters, ValidationError,
};
use crate::slot::Slot;

const NAME: &str = "name";
const SLOT: &str = "slot";
const JOB_NAME: &str = "job_name";
const JOB_TYPE: &str = "job_type";
const JOB_FILE: &str = "job_file";

/// Creates a web job on a website.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NewWebJob {
    /// Website name.
    pub name: Option<String>,
    /// Website slot; production when absent.
    pub slot: Option<String>,
    /// Name of the new job.
    pub job_name: Option<String>,
    /// `triggered` or `continuous`.
    pub job_type: Option<String>,
    /// Path of the job's executable or archive.
    pub job_file: Option<String>,
}

impl CommandParameters for NewWebJob {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(NAME, Rule::NonEmpty),
        FieldSpec::optional(SLOT, Rule::OneOf(Slot::NAMES)),
        FieldSpec::required(JOB_NAME, Rule::NonEmpty),
        FieldSpec::required(JOB_TYPE, Rule::OneOf(JobType::NAMES)),
        FieldSpec::required(JOB_FILE, Rule::NonEmpty),
    ];

    fn parameters(&self) -> ParameterBag {
        ParameterBag::new()
            .with_text(NAME, self.name.as_deref())
            .with_text(SLOT, self.slot.as_deref())
            .with_text(JOB_NAME, self.job_name.as_deref())
            .with_text(JOB_TYPE, self.job_type.as_deref())
            .with_text(JOB_FILE, self.job_file.as_deref())
    }
}

impl NewWebJob {
    /// Command name used in logs.
    pub const NAME: &'static str = "new-webjob";

    /// Creates the job through `client` and writes the returned descriptor
    /// to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] without calling `client` when a
    /// parameter is invalid, and [`CommandError::Collaborator`] when the
    /// client fails.
    pub async fn execute<C, S>(
        &self,
        client: &C,
        sink: &mut S,
    ) -> Result<JobDescriptor, CommandError<C::Error>>
    where
        C: WebJobClient,
        S: OutputSink,
    {
        let mut invocation = Invocation::start(Self::NAME);
        let result = self.run(client, sink, &mut invocation).await;
        invocation.finish(result)
    }

    async fn run<C, S>(
        &self,
        client: &C,
        sink: &mut S,
        invocation: &mut Invocation,
    ) -> Result<JobDescriptor, CommandError<C::Error>>
    where
        C: WebJobClient,
        S: OutputSink,
    {
        invocation.advance(Phase::Validating);
        let validated = self.validate()?;

        invocation.advance(Phase::Building);
        let request = build_webjob_request(&validated)?;

        invocation.advance(Phase::Dispatching);
        info!(
            site = %request.site_name,
            slot = %request.slot,
            job = %request.job_name,
            job_type = %request.job_type,
            "creating web job"
        );
        forward(client.create_job(&request), sink).await
    }
}

/// Builds the request consumed by [`WebJobClient::create_job`].
///
/// # Errors
///
/// Returns [`ValidationError`] when `validated` lacks a required value or
/// holds an unknown slot or job type.
pub fn build_webjob_request(
    validated: &ValidatedParameters,
) -> Result<WebJobRequest, ValidationError> {
    Ok(WebJobRequest {
        site_name: validated.require_text(NAME)?.to_owned(),
        slot: Slot::from_parameter(SLOT, validated.text(SLOT))?,
        job_name: validated.require_text(JOB_NAME)?.to_owned(),
        job_type: JobType::from_parameter(JOB_TYPE, validated.require_text(JOB_TYPE)?)?,
        job_file: validated.require_text(JOB_FILE)?.to_owned(),
    })
}

/// Lists the web jobs of a website.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GetWebJob {
    /// Website name.
    pub name: Option<String>,
    /// Website slot; production when absent.
    pub slot: Option<String>,
    /// Only report the job with this name.
    pub job_name: Option<String>,
    /// Only report jobs of this type.
    pub job_type: Option<String>,
}

impl CommandParameters for GetWebJob {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(NAME, Rule::NonEmpty),
        FieldSpec::optional(SLOT, Rule::OneOf(Slot::NAMES)),
        FieldSpec::optional(JOB_NAME, Rule::NonEmpty),
        FieldSpec::optional(JOB_TYPE, Rule::OneOf(JobType::NAMES)),
    ];

    fn parameters(&self) -> ParameterBag {
        ParameterBag::new()
            .with_text(NAME, self.name.as_deref())
            .with_text(SLOT, self.slot.as_deref())
            .with_text(JOB_NAME, self.job_name.as_deref())
            .with_text(JOB_TYPE, self.job_type.as_deref())
    }
}

impl GetWebJob {
    /// Command name used in logs.
    pub const NAME: &'static str = "get-webjob";

    /// Lists matching jobs and writes each descriptor to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] when a parameter is invalid,
    /// [`CommandError::Collaborator`] when the client fails and
    /// [`CommandError::Output`] when a descriptor cannot be written.
    pub async fn execute<C, S>(
        &self,
        client: &C,
        sink: &mut S,
    ) -> Result<Vec<JobDescriptor>, CommandError<C::Error>>
    where
        C: WebJobClient,
        S: OutputSink,
    {
        let mut invocation = Invocation::start(Self::NAME);
        let result = self.run(client, sink, &mut invocation).await;
        invocation.finish(result)
    }

    async fn run<C, S>(
        &self,
        client: &C,
        sink: &mut S,
        invocation: &mut Invocation,
    ) -> Result<Vec<JobDescriptor>, CommandError<C::Error>>
    where
        C: WebJobClient,
        S: OutputSink,
    {
        invocation.advance(Phase::Validating);
        let validated = self.validate()?;

        invocation.advance(Phase::Building);
        let site_name = validated.require_text(NAME)?;
        let slot = Slot::from_parameter(SLOT, validated.text(SLOT))?;
        let job_type = validated
            .text(JOB_TYPE)
            .map(|value| JobType::from_parameter(JOB_TYPE, value))
            .transpose()?;
        let job_name = validated.text(JOB_NAME);

        invocation.advance(Phase::Dispatching);
        info!(site = %site_name, slot = %slot, "listing web jobs");
        let jobs: Vec<JobDescriptor> = client
            .list_jobs(site_name, slot, job_type)
            .await
            .map_err(CommandError::Collaborator)?
            .into_iter()
            .filter(|job| job_name.is_none_or(|name| job.job_name.eq_ignore_ascii_case(name)))
            .collect();
        for job in &jobs {
            sink.write_object(job)?;
        }
        Ok(jobs)
    }
}

/// Deletes a web job from a website.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemoveWebJob {
    /// Website name.
    pub name: Option<String>,
    /// Website slot; production when absent.
    pub slot: Option<String>,
    /// Name of the job to delete.
    pub job_name: Option<String>,
    /// `triggered` or `continuous`.
    pub job_type: Option<String>,
}

impl CommandParameters for RemoveWebJob {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(NAME, Rule::NonEmpty),
        FieldSpec::optional(SLOT, Rule::OneOf(Slot::NAMES)),
        FieldSpec::required(JOB_NAME, Rule::NonEmpty),
        FieldSpec::required(JOB_TYPE, Rule::OneOf(JobType::NAMES)),
    ];

    fn parameters(&self) -> ParameterBag {
        ParameterBag::new()
            .with_text(NAME, self.name.as_deref())
            .with_text(SLOT, self.slot.as_deref())
            .with_text(JOB_NAME, self.job_name.as_deref())
            .with_text(JOB_TYPE, self.job_type.as_deref())
    }
}

impl RemoveWebJob {
    /// Command name used in logs.
    pub const NAME: &'static str = "remove-webjob";

    /// Deletes the job through `client`. Nothing is written on success.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] without calling `client` when a
    /// parameter is invalid, and [`CommandError::Collaborator`] when the
    /// client fails.
    pub async fn execute<C>(&self, client: &C) -> Result<(), CommandError<C::Error>>
    where
        C: WebJobClient,
    {
        let mut invocation = Invocation::start(Self::NAME);
        let result = self.run(client, &mut invocation).await;
        invocation.finish(result)
    }

    async fn run<C>(
        &self,
        client: &C,
        invocation: &mut Invocation,
    ) -> Result<(), CommandError<C::Error>>
    where
        C: WebJobClient,
    {
        invocation.advance(Phase::Validating);
        let validated = self.validate()?;

        invocation.advance(Phase::Building);
        let site_name = validated.require_text(NAME)?;
        let slot = Slot::from_parameter(SLOT, validated.text(SLOT))?;
        let job_name = validated.require_text(JOB_NAME)?;
        let job_type = JobType::from_parameter(JOB_TYPE, validated.require_text(JOB_TYPE)?)?;

        invocation.advance(Phase::Dispatching);
        info!(site = %site_name, slot = %slot, job = %job_name, "removing web job");
        client
            .delete_job(site_name, slot, job_name, job_type)
            .await
            .map_err(CommandError::Collaborator)
    }
}
