//! Service extension model and the manager collaborator.
//!
//! An extension is a provider-namespaced add-on (for example diagnostics
//! collection) registered with a hosted service and mapped onto the roles of
//! one deployment. Commands build an [`ExtensionConfigurationRequest`] and
//! hand it to an [`ExtensionManager`], which installs the extension and
//! returns the deployment's new [`ExtensionConfiguration`].

mod configuration;
mod diagnostics;

use serde::{Deserialize, Serialize};

use crate::dispatch::ClientFuture;
use crate::slot::Slot;

pub use configuration::{ExtensionConfiguration, ExtensionReference, InstallPlan, RoleExtensions};
pub use diagnostics::{
    DIAGNOSTICS_CONFIGURATION_NAMESPACE, DIAGNOSTICS_EXTENSION_TYPE, DIAGNOSTICS_PROVIDER_NAMESPACE,
    RemoveDiagnosticsExtension, SetDiagnosticsExtension, build_diagnostics_request,
};

/// Roles an extension applies to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoleSelector {
    /// Every role in the deployment, including roles added later.
    AllRoles,
    /// The listed roles, in the order supplied.
    Named(Vec<String>),
}

impl RoleSelector {
    /// Normalises a validated role list. Absent input selects every role.
    ///
    /// Role names compare case-insensitively; repeats after the first
    /// occurrence are dropped.
    #[must_use]
    pub fn from_roles(roles: Option<&[String]>) -> Self {
        match roles {
            Some(names) if !names.is_empty() => Self::Named(distinct_roles(names)),
            _ => Self::AllRoles,
        }
    }

    /// Returns the named roles; empty for [`RoleSelector::AllRoles`].
    #[must_use]
    pub fn role_names(&self) -> &[String] {
        match self {
            Self::AllRoles => &[],
            Self::Named(names) => names,
        }
    }
}

pub(crate) fn distinct_roles(names: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !distinct
            .iter()
            .any(|seen| seen.eq_ignore_ascii_case(name))
        {
            distinct.push(name.clone());
        }
    }
    distinct
}

/// Certificate supplied by value; uploaded to the service on install.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Certificate {
    /// Encoded certificate content as read from disk.
    pub data: Vec<u8>,
    /// Thumbprint algorithm reported alongside the uploaded certificate.
    pub algorithm: String,
}

/// Certificate already known to the service, identified by thumbprint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thumbprint {
    /// Certificate thumbprint.
    pub value: String,
    /// Algorithm that produced the thumbprint.
    pub algorithm: String,
}

/// Identity material used to encrypt the private configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertificateSource {
    /// Certificate by value.
    Value(Certificate),
    /// Certificate by thumbprint.
    Thumbprint(Thumbprint),
}

/// Fully validated request to configure an extension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtensionConfigurationRequest {
    provider_namespace: String,
    extension_type: String,
    certificate: Option<CertificateSource>,
    public_configuration: String,
    private_configuration: String,
    roles: RoleSelector,
}

impl ExtensionConfigurationRequest {
    /// Assembles a request from already validated parts.
    #[must_use]
    pub const fn new(
        provider_namespace: String,
        extension_type: String,
        certificate: Option<CertificateSource>,
        public_configuration: String,
        private_configuration: String,
        roles: RoleSelector,
    ) -> Self {
        Self {
            provider_namespace,
            extension_type,
            certificate,
            public_configuration,
            private_configuration,
            roles,
        }
    }

    /// Provider namespace, for example `Microsoft.Windows.Azure.Extensions`.
    #[must_use]
    pub fn provider_namespace(&self) -> &str {
        &self.provider_namespace
    }

    /// Extension type within the namespace.
    #[must_use]
    pub fn extension_type(&self) -> &str {
        &self.extension_type
    }

    /// Certificate used to encrypt the private configuration.
    #[must_use]
    pub const fn certificate(&self) -> Option<&CertificateSource> {
        self.certificate.as_ref()
    }

    /// Public configuration document.
    #[must_use]
    pub fn public_configuration(&self) -> &str {
        &self.public_configuration
    }

    /// Private configuration document.
    #[must_use]
    pub fn private_configuration(&self) -> &str {
        &self.private_configuration
    }

    /// Roles the extension applies to.
    #[must_use]
    pub const fn roles(&self) -> &RoleSelector {
        &self.roles
    }
}

/// Deployment addressed by a command.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DeploymentTarget {
    /// Hosted service name.
    pub service_name: String,
    /// Deployment slot within the service.
    pub slot: Slot,
}

/// Deployment details returned by the management API.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deployment {
    /// Deployment name.
    pub name: String,
    /// Names of the roles in the deployment.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Extensions currently mapped onto the deployment's roles.
    #[serde(default)]
    pub extension_configuration: ExtensionConfiguration,
}

impl Deployment {
    /// Reports whether the deployment contains `role`, ignoring ASCII case.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(role))
    }
}

/// Result of an asynchronous management operation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationStatus {
    /// Identifier assigned by the service.
    pub operation_id: String,
    /// Status reported by the service, for example `Succeeded`.
    pub status: String,
}

/// Collaborator that reads deployments and installs extensions.
pub trait ExtensionManager {
    /// Provider specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up the deployment in `target`; `None` when it does not exist.
    fn deployment<'a>(
        &'a self,
        target: &'a DeploymentTarget,
    ) -> ClientFuture<'a, Option<Deployment>, Self::Error>;

    /// Returns the primary key of a storage account; `None` when the account
    /// does not exist.
    fn storage_key<'a>(&'a self, account: &'a str)
    -> ClientFuture<'a, Option<String>, Self::Error>;

    /// Registers the extension described by `request` and returns `existing`
    /// with the extension mapped onto the selected roles.
    fn install<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        request: &'a ExtensionConfigurationRequest,
        existing: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, ExtensionConfiguration, Self::Error>;

    /// Applies `configuration` to the deployment in `target`.
    fn apply<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        configuration: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, OperationStatus, Self::Error>;
}
