//! reqwest-backed provider of the classification service contract.
//!
//! Every response body goes through an explicit parse step at this
//! boundary; malformed payloads surface as typed `ServiceError`s instead of
//! propagating undefined fields into the controller.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::services::{
    ClassificationService, ServiceError, ServiceHealth, StatusReport, UploadReceipt,
    UploadRequest,
};
use crate::domain::stats::ClassificationStats;
use crate::infrastructure::config::ServiceConfig;

/// Error body shape shared by every endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the remote classification service.
pub struct HttpClassificationService {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpClassificationService {
    /// Create a client from the service configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        // Validates the configured URL up front; requests use plain string
        // joining against the normalized base.
        let parsed = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid service base URL: {}", config.base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Extract the server-supplied error message from a non-2xx response,
    /// falling back to the HTTP status line.
    async fn rejection(response: Response) -> ServiceError {
        let status = response.status();
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.error)
                .unwrap_or_else(|_| Self::status_message(status)),
            Err(_) => Self::status_message(status),
        };
        ServiceError::Rejected { message }
    }

    fn status_message(status: StatusCode) -> String {
        format!("Server returned {status}")
    }

    /// Read a 2xx response body and parse it against the expected shape.
    async fn parse_body<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ServiceError> {
        let body = response
            .text()
            .await
            .map_err(|error| ServiceError::Network(error.to_string()))?;
        parse_json(&body)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|error| ServiceError::MalformedResponse(error.to_string()))
}

#[async_trait]
impl ClassificationService for HttpClassificationService {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError> {
        let part = Part::bytes(request.payload).file_name(request.file_name.clone());
        let form = Form::new().part("file", part);

        debug!("POST {} ({})", self.endpoint("api/upload"), request.file_name);
        let response = self
            .client
            .post(self.endpoint("api/upload"))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|error| ServiceError::Network(error.to_string()))?;

        if response.status().is_success() {
            Self::parse_body(response).await
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn status(&self, file_id: &str) -> Result<StatusReport, ServiceError> {
        let url = self.endpoint(&format!("api/status/{file_id}"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| ServiceError::Network(error.to_string()))?;

        if response.status().is_success() {
            Self::parse_body(response).await
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn stats(&self, file_id: &str) -> Result<ClassificationStats, ServiceError> {
        let url = self.endpoint(&format!("api/stats/{file_id}"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| ServiceError::Network(error.to_string()))?;

        if response.status().is_success() {
            Self::parse_body(response).await
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("api/health"))
            .send()
            .await
            .map_err(|error| ServiceError::Network(error.to_string()))?;

        if response.status().is_success() {
            Self::parse_body(response).await
        } else {
            Err(Self::rejection(response).await)
        }
    }

    fn download_url(&self, file_id: &str) -> String {
        self.endpoint(&format!("api/download/{file_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::ServerStatus;

    fn service() -> HttpClassificationService {
        HttpClassificationService::new(&ServiceConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = ServiceConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(HttpClassificationService::new(&config).is_err());
    }

    #[test]
    fn builds_endpoint_urls_without_double_slashes() {
        let service = service();
        assert_eq!(
            service.download_url("abc123"),
            "http://localhost:5000/api/download/abc123"
        );
    }

    #[test]
    fn parses_status_bodies() {
        let report: StatusReport = parse_json(r#"{"status":"running"}"#).unwrap();
        assert_eq!(report.status, ServerStatus::Running);
        assert!(report.error.is_none());

        let report: StatusReport =
            parse_json(r#"{"status":"error","error":"disk full"}"#).unwrap();
        assert_eq!(report.status, ServerStatus::Error);
        assert_eq!(report.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn malformed_bodies_become_typed_errors() {
        let result: Result<StatusReport, ServiceError> = parse_json("not json");
        assert!(matches!(result, Err(ServiceError::MalformedResponse(_))));

        let result: Result<ClassificationStats, ServiceError> = parse_json(r#"{"status":"ok"}"#);
        assert!(matches!(result, Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn parses_upload_receipts_with_extra_fields() {
        let receipt: UploadReceipt = parse_json(
            r#"{
                "status": "success",
                "message": "File uploaded and classification started",
                "input_file": "cloud.las",
                "output_file": "cloud_classified.las",
                "file_id": "cloud",
                "file_size_mb": 12.34
            }"#,
        )
        .unwrap();
        assert_eq!(receipt.file_id, "cloud");
        assert_eq!(receipt.file_size_mb, Some(12.34));
    }
}
