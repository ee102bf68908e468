//! Command-line interface definitions for the `mgmtctl` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.
//! Arguments stay optional here; the library's parameter tables decide what
//! is required.

use clap::Parser;

/// Top-level CLI for the `mgmtctl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "mgmtctl",
    about = "Manage cloud service extensions and website web jobs",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Install or update the diagnostics extension of a deployment.
    #[command(
        name = "set-diagnostics-extension",
        about = "Install or update the diagnostics extension of a deployment"
    )]
    SetDiagnosticsExtension(SetDiagnosticsArgs),
    /// Remove the diagnostics extension from a deployment.
    #[command(
        name = "remove-diagnostics-extension",
        about = "Remove the diagnostics extension from a deployment"
    )]
    RemoveDiagnosticsExtension(RemoveDiagnosticsArgs),
    /// Create a web job on a website.
    #[command(name = "new-webjob", about = "Create a web job on a website")]
    NewWebJob(NewWebJobArgs),
    /// List the web jobs of a website.
    #[command(name = "get-webjob", about = "List the web jobs of a website")]
    GetWebJob(GetWebJobArgs),
    /// Delete a web job from a website.
    #[command(name = "remove-webjob", about = "Delete a web job from a website")]
    RemoveWebJob(RemoveWebJobArgs),
}

/// Arguments for `mgmtctl set-diagnostics-extension`.
#[derive(Debug, Parser)]
pub(crate) struct SetDiagnosticsArgs {
    /// Hosted service name.
    #[arg(long, value_name = "NAME")]
    pub(crate) service_name: Option<String>,
    /// Deployment slot (production or staging). Defaults to production.
    #[arg(long, value_name = "SLOT")]
    pub(crate) slot: Option<String>,
    /// Role to configure; repeat for several roles. Defaults to every role.
    #[arg(long = "role", value_name = "ROLE")]
    pub(crate) roles: Option<Vec<String>>,
    /// Certificate file uploaded to encrypt the private configuration.
    #[arg(long, value_name = "PATH")]
    pub(crate) certificate_file: Option<String>,
    /// Thumbprint of a certificate already uploaded to the service.
    #[arg(long, value_name = "THUMBPRINT")]
    pub(crate) certificate_thumbprint: Option<String>,
    /// Algorithm of the certificate thumbprint. Defaults to sha1.
    #[arg(long, value_name = "ALGORITHM")]
    pub(crate) thumbprint_algorithm: Option<String>,
    /// Storage account that receives diagnostics data.
    #[arg(long, value_name = "ACCOUNT")]
    pub(crate) storage_account_name: Option<String>,
    /// XML diagnostics configuration file.
    #[arg(long, value_name = "PATH")]
    pub(crate) diagnostics_configuration_file: Option<String>,
}

/// Arguments for `mgmtctl remove-diagnostics-extension`.
#[derive(Debug, Parser)]
pub(crate) struct RemoveDiagnosticsArgs {
    /// Hosted service name.
    #[arg(long, value_name = "NAME")]
    pub(crate) service_name: Option<String>,
    /// Deployment slot (production or staging). Defaults to production.
    #[arg(long, value_name = "SLOT")]
    pub(crate) slot: Option<String>,
    /// Role to clear; repeat for several roles. Defaults to every role.
    #[arg(long = "role", value_name = "ROLE")]
    pub(crate) roles: Option<Vec<String>>,
}

/// Arguments for `mgmtctl new-webjob`.
#[derive(Debug, Parser)]
pub(crate) struct NewWebJobArgs {
    /// Website name.
    #[arg(long, value_name = "SITE")]
    pub(crate) name: Option<String>,
    /// Website slot (production or staging). Defaults to production.
    #[arg(long, value_name = "SLOT")]
    pub(crate) slot: Option<String>,
    /// Name of the new job.
    #[arg(long, value_name = "JOB")]
    pub(crate) job_name: Option<String>,
    /// Job type (triggered or continuous).
    #[arg(long, value_name = "TYPE")]
    pub(crate) job_type: Option<String>,
    /// Executable or zip archive uploaded as the job.
    #[arg(long, value_name = "PATH")]
    pub(crate) job_file: Option<String>,
}

/// Arguments for `mgmtctl get-webjob`.
#[derive(Debug, Parser)]
pub(crate) struct GetWebJobArgs {
    /// Website name.
    #[arg(long, value_name = "SITE")]
    pub(crate) name: Option<String>,
    /// Website slot (production or staging). Defaults to production.
    #[arg(long, value_name = "SLOT")]
    pub(crate) slot: Option<String>,
    /// Only report the job with this name.
    #[arg(long, value_name = "JOB")]
    pub(crate) job_name: Option<String>,
    /// Only report jobs of this type (triggered or continuous).
    #[arg(long, value_name = "TYPE")]
    pub(crate) job_type: Option<String>,
}

/// Arguments for `mgmtctl remove-webjob`.
#[derive(Debug, Parser)]
pub(crate) struct RemoveWebJobArgs {
    /// Website name.
    #[arg(long, value_name = "SITE")]
    pub(crate) name: Option<String>,
    /// Website slot (production or staging). Defaults to production.
    #[arg(long, value_name = "SLOT")]
    pub(crate) slot: Option<String>,
    /// Name of the job to delete.
    #[arg(long, value_name = "JOB")]
    pub(crate) job_name: Option<String>,
    /// Job type (triggered or continuous).
    #[arg(long, value_name = "TYPE")]
    pub(crate) job_type: Option<String>,
}
