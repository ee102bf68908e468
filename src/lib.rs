//! Core library for the `mgmtctl` cloud management tool.
//!
//! Each command runs through the same pipeline: its raw parameters are
//! checked against a declarative field table, turned into a typed request,
//! dispatched to a collaborator ([`ExtensionManager`] or [`WebJobClient`])
//! and the result is forwarded to an [`OutputSink`]. [`ManagementClient`]
//! implements both collaborators over the service management REST API.

pub mod config;
pub mod dispatch;
pub mod extension;
pub mod management;
pub mod output;
pub mod params;
pub mod payload;
pub mod slot;
pub mod test_support;
pub mod webjob;

pub use config::{ConfigError, DEFAULT_ENDPOINT, ManagementConfig};
pub use dispatch::{ClientFuture, CommandError, Invocation, Phase};
pub use extension::{
    Deployment, DeploymentTarget, ExtensionConfiguration, ExtensionConfigurationRequest,
    ExtensionManager, OperationStatus, RemoveDiagnosticsExtension, RoleSelector,
    SetDiagnosticsExtension,
};
pub use management::{ClientError, ManagementClient};
pub use output::{JsonSink, OutputError, OutputSink};
pub use params::{CommandParameters, ValidationError};
pub use payload::{PayloadError, read_binary_file, read_text_file};
pub use slot::Slot;
pub use webjob::{
    GetWebJob, JobDescriptor, JobType, NewWebJob, RemoveWebJob, WebJobClient, WebJobRequest,
};
