use reqwest::multipart::{Form, Part};

use crate::error::{Result, ServiceError};

/// Route of Gotenberg's Chromium HTML converter
pub const CONVERT_HTML_ROUTE: &str = "/forms/chromium/convert/html";

/// Page setup sent with every conversion: A4 in inches, half-inch margins
pub const PAGE_OPTIONS: [(&str, &str); 9] = [
    ("marginTop", "0.5"),
    ("marginBottom", "0.5"),
    ("marginLeft", "0.5"),
    ("marginRight", "0.5"),
    ("paperWidth", "8.27"),
    ("paperHeight", "11.7"),
    ("preferCssPageSize", "false"),
    ("printBackground", "true"),
    ("scale", "1"),
];

/// Converts HTML pages to PDF through a Gotenberg instance
#[derive(Debug, Clone)]
pub struct GotenbergClient {
    client: reqwest::Client,
    base_url: String,
}

impl GotenbergClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn convert_html(&self, html: String) -> Result<Vec<u8>> {
        let page = Part::text(html)
            .file_name("index.html")
            .mime_str("text/html")?;
        let form = PAGE_OPTIONS
            .iter()
            .fold(Form::new().part("files", page), |form, (name, value)| {
                form.text(*name, *value)
            });

        let response = self
            .client
            .post(format!("{}{CONVERT_HTML_ROUTE}", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Conversion {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
