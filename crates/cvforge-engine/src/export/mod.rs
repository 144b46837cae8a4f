//! Export of the document to PDF through an HTTP export service.
//!
//! The client sends raw section markdown; the service renders it. Failures
//! come back as one [`ExportError`] and never touch the document.

pub mod print;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::Snapshot;
use crate::models::ContentSection;

pub use print::render_print_html;

/// Route the export service listens on
pub const EXPORT_ROUTE: &str = "/api/export/pdf";

pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Body of an export request: the snapshot without its selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub global_styles: String,
    pub sections: Vec<ContentSection>,
}

impl From<&Snapshot> for ExportRequest {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            global_styles: snapshot.global_style.clone(),
            sections: snapshot
                .sections
                .iter()
                .map(|section| section.as_ref().clone())
                .collect(),
        }
    }
}

impl From<ExportRequest> for Snapshot {
    fn from(request: ExportRequest) -> Self {
        Snapshot::new(request.sections, request.global_styles, None)
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not reach export service: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Export timed out after {0:?}")]
    Timeout(Duration),

    #[error("Export failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Export service sent an unexpected response: {0}")]
    MalformedResponse(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the export service
#[derive(Debug, Clone)]
pub struct PdfExporter {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl PdfExporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExportError::Http)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request a PDF for `snapshot` and return its bytes
    pub async fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
        let request = ExportRequest::from(snapshot);
        log::info!(
            "Exporting {} sections to {}",
            request.sections.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(ExportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/pdf") {
            return Err(ExportError::MalformedResponse(format!(
                "expected application/pdf, got '{content_type}'"
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ExportError::MalformedResponse(
                "body is not a PDF document".to_string(),
            ));
        }

        log::info!("Export produced {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    fn classify(&self, error: reqwest::Error) -> ExportError {
        if error.is_timeout() {
            ExportError::Timeout(self.timeout)
        } else {
            ExportError::Http(error)
        }
    }
}
