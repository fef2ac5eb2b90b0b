/// License server collaborator
///
/// Fetches the current license status document from the licensing authority
/// and forwards uploaded license documents to it. Responses are returned raw;
/// interpretation belongs to the normalizer.
use super::error::TransportError;
use super::types::RawStatusDocument;
use crate::settings::ConsoleSettings;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const STATUS_PATH: &str = "api/license/status/";
const UPLOAD_PATH: &str = "api/license/upload/";

/// Boundary to the remote licensing authority
#[async_trait]
pub trait LicenseClient: Send + Sync {
    /// Read the current status document
    async fn fetch_license_status(&self) -> Result<RawStatusDocument, TransportError>;

    /// Submit a license document; returns the status document for it
    async fn upload_license_document(
        &self,
        document: &Value,
    ) -> Result<RawStatusDocument, TransportError>;
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    license: &'a Value,
}

/// reqwest-backed client for the licensing authority's HTTP API
#[derive(Debug, Clone)]
pub struct HttpLicenseClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpLicenseClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("license-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn from_settings(settings: &ConsoleSettings) -> Result<Self, TransportError> {
        let base_url = settings
            .server_url()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Self::new(base_url, Duration::from_secs(settings.request_timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::Client(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl LicenseClient for HttpLicenseClient {
    async fn fetch_license_status(&self) -> Result<RawStatusDocument, TransportError> {
        let url = self.endpoint(STATUS_PATH)?;
        tracing::debug!(%url, "Fetching license status");

        let response = self.http.get(url).send().await?;
        read_document(response).await
    }

    async fn upload_license_document(
        &self,
        document: &Value,
    ) -> Result<RawStatusDocument, TransportError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        tracing::debug!(%url, "Uploading license document");

        let response = self
            .http
            .post(url)
            .json(&UploadRequest { license: document })
            .send()
            .await?;
        read_document(response).await
    }
}

async fn read_document(response: reqwest::Response) -> Result<RawStatusDocument, TransportError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(TransportError::Http {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "status_message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
