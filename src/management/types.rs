//! Request and response bodies exchanged with the management API.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::webjob::JobType;

#[derive(Debug, Deserialize)]
pub(super) struct StorageKeys {
    pub(super) primary: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct HostedExtension {
    pub(super) id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct HostedExtensionList {
    #[serde(default)]
    pub(super) extensions: Vec<HostedExtension>,
}

#[derive(Debug, Serialize)]
pub(super) struct CertificateUpload<'a> {
    pub(super) data: String,
    pub(super) thumbprint_algorithm: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadedCertificate {
    pub(super) thumbprint: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AddExtension<'a> {
    pub(super) id: &'a str,
    pub(super) provider_namespace: &'a str,
    #[serde(rename = "type")]
    pub(super) extension_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) thumbprint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) thumbprint_algorithm: Option<&'a str>,
    pub(super) public_configuration: &'a str,
    pub(super) private_configuration: &'a str,
}

/// Collection segment addressing the jobs of one type.
pub(super) const fn job_collection(job_type: Option<JobType>) -> &'static str {
    match job_type {
        Some(JobType::Triggered) => "triggeredwebjobs",
        Some(JobType::Continuous) => "continuouswebjobs",
        None => "webjobs",
    }
}

/// Content type used when uploading a job file.
pub(super) fn job_content_type(job_file: &str) -> &'static str {
    let is_zip = Utf8Path::new(job_file)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        "application/zip"
    } else {
        "application/octet-stream"
    }
}
