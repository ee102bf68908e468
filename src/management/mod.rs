//! REST client for the cloud management API.
//!
//! [`ManagementClient`] implements both collaborator traits. Hosted service
//! resources live under `{endpoint}/{subscription}/services/...` and website
//! resources under `{endpoint}/{subscription}/sites/...`. Bodies are JSON
//! except for web job uploads, which send the job file as-is.

mod error;
mod types;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8Path;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ManagementConfig;
use crate::dispatch::ClientFuture;
use crate::extension::{
    Certificate, CertificateSource, Deployment, DeploymentTarget, ExtensionConfiguration,
    ExtensionConfigurationRequest, ExtensionManager, OperationStatus, Thumbprint,
};
use crate::payload::read_binary_file;
use crate::slot::Slot;
use crate::webjob::{JobDescriptor, JobType, WebJobClient, WebJobRequest};
use types::{
    AddExtension, CertificateUpload, HostedExtensionList, StorageKeys, UploadedCertificate,
    job_collection, job_content_type,
};

pub use error::ClientError;

const HOSTED_SERVICES: [&str; 2] = ["services", "hostedservices"];

/// Client that talks to the management API over HTTPS.
#[derive(Clone, Debug)]
pub struct ManagementClient {
    http: reqwest::Client,
    base: Url,
    subscription_id: String,
    access_token: String,
}

impl ManagementClient {
    /// Constructs a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the configuration fails
    /// validation or the HTTP client cannot be built, and
    /// [`ClientError::Endpoint`] when the endpoint is not a usable base URL.
    pub fn new(config: &ManagementConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let endpoint = config.endpoint.trim();
        let endpoint_error = |message: String| ClientError::Endpoint {
            endpoint: endpoint.to_owned(),
            message,
        };
        let base = Url::parse(endpoint).map_err(|err| endpoint_error(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(endpoint_error(String::from(
                "endpoint cannot address API paths",
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            http,
            base,
            subscription_id: config.subscription_id.trim().to_owned(),
            access_token: config.access_token.trim().to_owned(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Endpoint {
                endpoint: self.base.to_string(),
                message: String::from("endpoint cannot address API paths"),
            })?
            .pop_if_empty()
            .push(&self.subscription_id)
            .extend(segments);
        Ok(url)
    }

    fn service_url(&self, service_name: &str, tail: &[&str]) -> Result<Url, ClientError> {
        let mut segments: Vec<&str> = HOSTED_SERVICES.to_vec();
        segments.push(service_name);
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    fn site_url(&self, site_name: &str, slot: Slot, tail: &[&str]) -> Result<Url, ClientError> {
        let mut segments = vec!["sites", site_name, "slots", slot.as_str()];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: &Method,
        url: &Url,
    ) -> Result<Vec<u8>, ClientError> {
        debug!(%method, %url, "sending management request");
        let transport_error = |err: reqwest::Error| ClientError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            message: err.to_string(),
        };
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ClientError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_owned(),
            });
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let body = self
            .execute(self.http.get(url.clone()), &Method::GET, &url)
            .await?;
        decode(&url, &body)
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ClientError> {
        match self.get_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &Url,
        body: &B,
    ) -> Result<Vec<u8>, ClientError> {
        let request = self.http.request(method.clone(), url.clone()).json(body);
        self.execute(request, &method, url).await
    }

    async fn fetch_deployment(
        &self,
        target: &DeploymentTarget,
    ) -> Result<Option<Deployment>, ClientError> {
        let url = self.service_url(
            &target.service_name,
            &["deploymentslots", target.slot.as_str()],
        )?;
        self.get_optional(url).await
    }

    async fn fetch_storage_key(&self, account: &str) -> Result<Option<String>, ClientError> {
        let url = self.url(&["services", "storageservices", account, "keys"])?;
        let keys: Option<StorageKeys> = self.get_optional(url).await?;
        Ok(keys.map(|found| found.primary))
    }

    async fn upload_certificate(
        &self,
        service_name: &str,
        certificate: &Certificate,
    ) -> Result<Thumbprint, ClientError> {
        let url = self.service_url(service_name, &["certificates"])?;
        info!(service = service_name, "uploading certificate");
        let body = CertificateUpload {
            data: STANDARD.encode(&certificate.data),
            thumbprint_algorithm: &certificate.algorithm,
        };
        let response = self.send_json(Method::POST, &url, &body).await?;
        let uploaded: UploadedCertificate = decode(&url, &response)?;
        Ok(Thumbprint {
            value: uploaded.thumbprint,
            algorithm: certificate.algorithm.clone(),
        })
    }

    async fn install_extension(
        &self,
        target: &DeploymentTarget,
        request: &ExtensionConfigurationRequest,
        existing: &ExtensionConfiguration,
    ) -> Result<ExtensionConfiguration, ClientError> {
        let service_name = target.service_name.as_str();
        let thumbprint = match request.certificate() {
            Some(CertificateSource::Value(certificate)) => {
                Some(self.upload_certificate(service_name, certificate).await?)
            }
            Some(CertificateSource::Thumbprint(thumbprint)) => Some(thumbprint.clone()),
            None => None,
        };

        let extensions_url = self.service_url(service_name, &["extensions"])?;
        let registered: HostedExtensionList = self.get_json(extensions_url.clone()).await?;
        let reserved: Vec<String> = registered
            .extensions
            .into_iter()
            .map(|extension| extension.id)
            .collect();
        let plan = existing.plan_install(
            request.provider_namespace(),
            request.extension_type(),
            target.slot,
            request.roles(),
            &reserved,
        );

        for id in &plan.new_ids {
            info!(service = service_name, id = %id, "registering extension");
            let body = AddExtension {
                id,
                provider_namespace: request.provider_namespace(),
                extension_type: request.extension_type(),
                thumbprint: thumbprint.as_ref().map(|found| found.value.as_str()),
                thumbprint_algorithm: thumbprint.as_ref().map(|found| found.algorithm.as_str()),
                public_configuration: request.public_configuration(),
                private_configuration: request.private_configuration(),
            };
            self.send_json(Method::POST, &extensions_url, &body).await?;
        }
        Ok(plan.configuration)
    }

    async fn apply_configuration(
        &self,
        target: &DeploymentTarget,
        configuration: &ExtensionConfiguration,
    ) -> Result<OperationStatus, ClientError> {
        let url = self.service_url(
            &target.service_name,
            &["deploymentslots", target.slot.as_str(), "extensionconfiguration"],
        )?;
        let response = self.send_json(Method::PUT, &url, configuration).await?;
        decode(&url, &response)
    }

    async fn upload_job(&self, request: &WebJobRequest) -> Result<JobDescriptor, ClientError> {
        let contents = read_binary_file(&request.job_file)?;
        let file_name = Utf8Path::new(&request.job_file)
            .file_name()
            .unwrap_or(request.job_file.as_str());
        let url = self.site_url(
            &request.site_name,
            request.slot,
            &[
                job_collection(Some(request.job_type)),
                request.job_name.as_str(),
            ],
        )?;
        let builder = self
            .http
            .put(url.clone())
            .header(CONTENT_TYPE, job_content_type(&request.job_file))
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            )
            .body(contents);
        let response = self.execute(builder, &Method::PUT, &url).await?;
        decode(&url, &response)
    }

    async fn fetch_jobs(
        &self,
        site_name: &str,
        slot: Slot,
        job_type: Option<JobType>,
    ) -> Result<Vec<JobDescriptor>, ClientError> {
        let url = self.site_url(site_name, slot, &[job_collection(job_type)])?;
        self.get_json(url).await
    }

    async fn remove_job(
        &self,
        site_name: &str,
        slot: Slot,
        job_name: &str,
        job_type: JobType,
    ) -> Result<(), ClientError> {
        let url = self.site_url(site_name, slot, &[job_collection(Some(job_type)), job_name])?;
        self.execute(self.http.delete(url.clone()), &Method::DELETE, &url)
            .await
            .map(drop)
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|err| ClientError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

impl ExtensionManager for ManagementClient {
    type Error = ClientError;

    fn deployment<'a>(
        &'a self,
        target: &'a DeploymentTarget,
    ) -> ClientFuture<'a, Option<Deployment>, Self::Error> {
        Box::pin(self.fetch_deployment(target))
    }

    fn storage_key<'a>(
        &'a self,
        account: &'a str,
    ) -> ClientFuture<'a, Option<String>, Self::Error> {
        Box::pin(self.fetch_storage_key(account))
    }

    fn install<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        request: &'a ExtensionConfigurationRequest,
        existing: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, ExtensionConfiguration, Self::Error> {
        Box::pin(self.install_extension(target, request, existing))
    }

    fn apply<'a>(
        &'a self,
        target: &'a DeploymentTarget,
        configuration: &'a ExtensionConfiguration,
    ) -> ClientFuture<'a, OperationStatus, Self::Error> {
        Box::pin(self.apply_configuration(target, configuration))
    }
}

impl WebJobClient for ManagementClient {
    type Error = ClientError;

    fn create_job<'a>(
        &'a self,
        request: &'a WebJobRequest,
    ) -> ClientFuture<'a, JobDescriptor, Self::Error> {
        Box::pin(self.upload_job(request))
    }

    fn list_jobs<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_type: Option<JobType>,
    ) -> ClientFuture<'a, Vec<JobDescriptor>, Self::Error> {
        Box::pin(self.fetch_jobs(site_name, slot, job_type))
    }

    fn delete_job<'a>(
        &'a self,
        site_name: &'a str,
        slot: Slot,
        job_name: &'a str,
        job_type: JobType,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(self.remove_job(site_name, slot, job_name, job_type))
    }
}
