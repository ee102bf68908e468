//! Commands that configure the diagnostics extension of a deployment.

use quick_xml::escape::escape;
use tracing::info;

use super::{
    Certificate, CertificateSource, Deployment, DeploymentTarget, ExtensionConfigurationRequest,
    ExtensionManager, OperationStatus, RoleSelector, Thumbprint,
};
use crate::dispatch::{CommandError, Invocation, Phase, forward};
use crate::output::OutputSink;
use crate::params::{
    CommandParameters, FieldSpec, ParameterBag, Rule, ValidatedParameters, ValidationError,
};
use crate::payload::{XmlDocument, parse_xml_document};
use crate::slot::Slot;

/// Provider namespace of the diagnostics extension.
pub const DIAGNOSTICS_PROVIDER_NAMESPACE: &str = "Microsoft.Windows.Azure.Extensions";
/// Extension type of the diagnostics extension.
pub const DIAGNOSTICS_EXTENSION_TYPE: &str = "Diagnostics";
/// XML namespace of the public and private configuration documents.
pub const DIAGNOSTICS_CONFIGURATION_NAMESPACE: &str =
    "http://schemas.microsoft.com/ServiceHosting/2010/10/DiagnosticsConfiguration";

const DEFAULT_THUMBPRINT_ALGORITHM: &str = "sha1";
const WAD_ROOT: &str = "WadCfg";

const SERVICE_NAME: &str = "service_name";
const SLOT: &str = "slot";
const ROLE: &str = "role";
const CERTIFICATE: &str = "certificate";
const CERTIFICATE_THUMBPRINT: &str = "certificate_thumbprint";
const THUMBPRINT_ALGORITHM: &str = "thumbprint_algorithm";
const STORAGE_ACCOUNT_NAME: &str = "storage_account_name";
const DIAGNOSTICS_CONFIGURATION: &str = "diagnostics_configuration";
const CERTIFICATE_GROUP: &str = "certificate";

/// Installs or updates the diagnostics extension on a deployment.
///
/// Fields hold the raw values supplied by the caller; nothing is checked
/// until [`SetDiagnosticsExtension::execute`] runs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SetDiagnosticsExtension {
    /// Hosted service name.
    pub service_name: Option<String>,
    /// Deployment slot; production when absent.
    pub slot: Option<String>,
    /// Target roles; every role when absent.
    pub roles: Option<Vec<String>>,
    /// Certificate content, mutually exclusive with the thumbprint.
    pub certificate: Option<Vec<u8>>,
    /// Thumbprint of a certificate already uploaded to the service.
    pub certificate_thumbprint: Option<String>,
    /// Algorithm of the thumbprint; `sha1` when absent.
    pub thumbprint_algorithm: Option<String>,
    /// Storage account receiving diagnostics data.
    pub storage_account_name: Option<String>,
    /// XML diagnostics configuration document.
    pub diagnostics_configuration: Option<String>,
}

impl CommandParameters for SetDiagnosticsExtension {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(SERVICE_NAME, Rule::NonEmpty),
        FieldSpec::optional(SLOT, Rule::OneOf(Slot::NAMES)),
        FieldSpec::optional(ROLE, Rule::NonEmptyList),
        FieldSpec::optional(CERTIFICATE, Rule::NonEmptyBytes).in_group(CERTIFICATE_GROUP),
        FieldSpec::optional(CERTIFICATE_THUMBPRINT, Rule::NonEmpty).in_group(CERTIFICATE_GROUP),
        FieldSpec::optional(THUMBPRINT_ALGORITHM, Rule::NonEmpty),
        FieldSpec::required(STORAGE_ACCOUNT_NAME, Rule::NonEmpty),
        FieldSpec::optional(DIAGNOSTICS_CONFIGURATION, Rule::WellFormedXml),
    ];

    fn parameters(&self) -> ParameterBag {
        ParameterBag::new()
            .with_text(SERVICE_NAME, self.service_name.as_deref())
            .with_text(SLOT, self.slot.as_deref())
            .with_list(ROLE, self.roles.as_deref())
            .with_bytes(CERTIFICATE, self.certificate.as_deref())
            .with_text(CERTIFICATE_THUMBPRINT, self.certificate_thumbprint.as_deref())
            .with_text(THUMBPRINT_ALGORITHM, self.thumbprint_algorithm.as_deref())
            .with_text(STORAGE_ACCOUNT_NAME, self.storage_account_name.as_deref())
            .with_text(
                DIAGNOSTICS_CONFIGURATION,
                self.diagnostics_configuration.as_deref(),
            )
    }
}

impl SetDiagnosticsExtension {
    /// Command name used in logs.
    pub const NAME: &'static str = "set-diagnostics-extension";

    /// Validates the parameters, installs the extension through `manager`,
    /// applies the resulting configuration and writes the operation status
    /// to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] before any mutating call when a
    /// parameter is invalid or does not resolve, and
    /// [`CommandError::Collaborator`] when the manager fails.
    pub async fn execute<M, S>(
        &self,
        manager: &M,
        sink: &mut S,
    ) -> Result<OperationStatus, CommandError<M::Error>>
    where
        M: ExtensionManager,
        S: OutputSink,
    {
        let mut invocation = Invocation::start(Self::NAME);
        let result = self.run(manager, sink, &mut invocation).await;
        invocation.finish(result)
    }

    async fn run<M, S>(
        &self,
        manager: &M,
        sink: &mut S,
        invocation: &mut Invocation,
    ) -> Result<OperationStatus, CommandError<M::Error>>
    where
        M: ExtensionManager,
        S: OutputSink,
    {
        invocation.advance(Phase::Validating);
        let validated = self.validate()?;
        let target = deployment_target(&validated)?;
        let deployment = resolve_deployment(manager, &target).await?;
        check_roles(&validated, &deployment, &target)?;
        let account = validated.require_text(STORAGE_ACCOUNT_NAME)?;
        let storage_key = manager
            .storage_key(account)
            .await
            .map_err(CommandError::Collaborator)?
            .ok_or_else(|| ValidationError::Unresolved {
                field: STORAGE_ACCOUNT_NAME,
                value: account.to_owned(),
                reason: String::from("storage account not found"),
            })?;

        invocation.advance(Phase::Building);
        let request = build_diagnostics_request(&validated, &storage_key)?;

        invocation.advance(Phase::Dispatching);
        info!(
            service = %target.service_name,
            slot = %target.slot,
            "installing diagnostics extension"
        );
        let configuration = manager
            .install(&target, &request, &deployment.extension_configuration)
            .await
            .map_err(CommandError::Collaborator)?;
        forward(manager.apply(&target, &configuration), sink).await
    }
}

/// Removes the diagnostics extension from some or all roles of a deployment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemoveDiagnosticsExtension {
    /// Hosted service name.
    pub service_name: Option<String>,
    /// Deployment slot; production when absent.
    pub slot: Option<String>,
    /// Roles to clear; every role when absent.
    pub roles: Option<Vec<String>>,
}

impl CommandParameters for RemoveDiagnosticsExtension {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(SERVICE_NAME, Rule::NonEmpty),
        FieldSpec::optional(SLOT, Rule::OneOf(Slot::NAMES)),
        FieldSpec::optional(ROLE, Rule::NonEmptyList),
    ];

    fn parameters(&self) -> ParameterBag {
        ParameterBag::new()
            .with_text(SERVICE_NAME, self.service_name.as_deref())
            .with_text(SLOT, self.slot.as_deref())
            .with_list(ROLE, self.roles.as_deref())
    }
}

impl RemoveDiagnosticsExtension {
    /// Command name used in logs.
    pub const NAME: &'static str = "remove-diagnostics-extension";

    /// Removes the extension from the deployment's configuration, applies
    /// it and writes the operation status to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Validation`] when a parameter is invalid or
    /// does not resolve, and [`CommandError::Collaborator`] when the manager
    /// fails.
    pub async fn execute<M, S>(
        &self,
        manager: &M,
        sink: &mut S,
    ) -> Result<OperationStatus, CommandError<M::Error>>
    where
        M: ExtensionManager,
        S: OutputSink,
    {
        let mut invocation = Invocation::start(Self::NAME);
        let result = self.run(manager, sink, &mut invocation).await;
        invocation.finish(result)
    }

    async fn run<M, S>(
        &self,
        manager: &M,
        sink: &mut S,
        invocation: &mut Invocation,
    ) -> Result<OperationStatus, CommandError<M::Error>>
    where
        M: ExtensionManager,
        S: OutputSink,
    {
        invocation.advance(Phase::Validating);
        let validated = self.validate()?;
        let target = deployment_target(&validated)?;
        let deployment = resolve_deployment(manager, &target).await?;
        check_roles(&validated, &deployment, &target)?;

        invocation.advance(Phase::Building);
        let roles = RoleSelector::from_roles(validated.list(ROLE));
        let configuration = deployment.extension_configuration.without_kind(
            DIAGNOSTICS_PROVIDER_NAMESPACE,
            DIAGNOSTICS_EXTENSION_TYPE,
            &roles,
        );

        invocation.advance(Phase::Dispatching);
        info!(
            service = %target.service_name,
            slot = %target.slot,
            "removing diagnostics extension"
        );
        forward(manager.apply(&target, &configuration), sink).await
    }
}

/// Builds the request consumed by [`ExtensionManager::install`].
///
/// The same validated input always yields an equal request.
///
/// # Errors
///
/// Returns [`ValidationError`] when `validated` lacks the storage account,
/// holds a malformed configuration document, or does not carry exactly one
/// certificate source.
pub fn build_diagnostics_request(
    validated: &ValidatedParameters,
    storage_key: &str,
) -> Result<ExtensionConfigurationRequest, ValidationError> {
    let account = validated.require_text(STORAGE_ACCOUNT_NAME)?;
    let document = validated
        .text(DIAGNOSTICS_CONFIGURATION)
        .map(parse_xml_document)
        .transpose()
        .map_err(|err| ValidationError::Malformed {
            field: DIAGNOSTICS_CONFIGURATION,
            message: err.to_string(),
        })?;

    let algorithm = validated
        .text(THUMBPRINT_ALGORITHM)
        .unwrap_or(DEFAULT_THUMBPRINT_ALGORITHM)
        .to_owned();
    let certificate = match (
        validated.bytes(CERTIFICATE),
        validated.text(CERTIFICATE_THUMBPRINT),
    ) {
        (Some(data), None) => CertificateSource::Value(Certificate {
            data: data.to_vec(),
            algorithm,
        }),
        (None, Some(value)) => CertificateSource::Thumbprint(Thumbprint {
            value: value.to_owned(),
            algorithm,
        }),
        (Some(_), Some(_)) => {
            return Err(ValidationError::Conflict {
                group: CERTIFICATE_GROUP,
                fields: vec![CERTIFICATE, CERTIFICATE_THUMBPRINT],
            });
        }
        (None, None) => {
            return Err(ValidationError::MissingOneOf {
                group: CERTIFICATE_GROUP,
                fields: vec![CERTIFICATE, CERTIFICATE_THUMBPRINT],
            });
        }
    };

    Ok(ExtensionConfigurationRequest::new(
        DIAGNOSTICS_PROVIDER_NAMESPACE.to_owned(),
        DIAGNOSTICS_EXTENSION_TYPE.to_owned(),
        Some(certificate),
        public_configuration(account, document.as_ref()),
        private_configuration(account, storage_key),
        RoleSelector::from_roles(validated.list(ROLE)),
    ))
}

fn public_configuration(account: &str, document: Option<&XmlDocument>) -> String {
    let wad = match document {
        Some(doc) if doc.root == WAD_ROOT => doc.body.clone(),
        Some(doc) => format!("<{WAD_ROOT}>{}</{WAD_ROOT}>", doc.body),
        None => String::new(),
    };
    format!(
        "<PublicConfig xmlns=\"{DIAGNOSTICS_CONFIGURATION_NAMESPACE}\">{wad}<StorageAccount>{}</StorageAccount></PublicConfig>",
        escape(account)
    )
}

fn private_configuration(account: &str, storage_key: &str) -> String {
    format!(
        "<PrivateConfig xmlns=\"{DIAGNOSTICS_CONFIGURATION_NAMESPACE}\"><StorageAccount name=\"{}\" key=\"{}\" /></PrivateConfig>",
        escape(account),
        escape(storage_key)
    )
}

fn deployment_target(validated: &ValidatedParameters) -> Result<DeploymentTarget, ValidationError> {
    Ok(DeploymentTarget {
        service_name: validated.require_text(SERVICE_NAME)?.to_owned(),
        slot: Slot::from_parameter(SLOT, validated.text(SLOT))?,
    })
}

async fn resolve_deployment<M>(
    manager: &M,
    target: &DeploymentTarget,
) -> Result<Deployment, CommandError<M::Error>>
where
    M: ExtensionManager,
{
    manager
        .deployment(target)
        .await
        .map_err(CommandError::Collaborator)?
        .ok_or_else(|| {
            CommandError::Validation(ValidationError::Unresolved {
                field: SERVICE_NAME,
                value: target.service_name.clone(),
                reason: format!("no {} deployment found", target.slot),
            })
        })
}

fn check_roles(
    validated: &ValidatedParameters,
    deployment: &Deployment,
    target: &DeploymentTarget,
) -> Result<(), ValidationError> {
    let Some(roles) = validated.list(ROLE) else {
        return Ok(());
    };
    match roles.iter().find(|role| !deployment.has_role(role)) {
        Some(missing) => Err(ValidationError::Unresolved {
            field: ROLE,
            value: missing.clone(),
            reason: format!(
                "role does not exist in the {} deployment of {}",
                target.slot, target.service_name
            ),
        }),
        None => Ok(()),
    }
}
