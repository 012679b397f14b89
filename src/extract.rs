use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::config::{ExtractionConfig, ExtractionProvider};

/// Text extraction backend for PDF assets linked from material bodies
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the plain text of one asset (path or URL as it appears in
    /// the markdown link)
    async fn extract_text(&self, asset: &str) -> Result<String>;

    fn provider_type(&self) -> ExtractionProvider;
}

/// Create the extractor selected by configuration
pub fn create_extractor(config: &ExtractionConfig) -> Result<Box<dyn TextExtractor>> {
    match config.provider {
        ExtractionProvider::Pdftotext => Ok(Box::new(PdftotextExtractor::new(
            config.assets_dir.clone(),
        ))),
        ExtractionProvider::Remote => Ok(Box::new(RemoteExtractor::new(config)?)),
    }
}

/// Local extraction via the poppler pdftotext tool
pub struct PdftotextExtractor {
    assets_dir: Option<PathBuf>,
}

impl PdftotextExtractor {
    pub fn new(assets_dir: Option<PathBuf>) -> Self {
        Self { assets_dir }
    }

    /// Resolve a relative asset link against the configured assets dir
    fn resolve(&self, asset: &str) -> PathBuf {
        let path = PathBuf::from(asset);
        if path.is_relative() {
            if let Some(ref dir) = self.assets_dir {
                return dir.join(path);
            }
        }
        path
    }
}

#[async_trait]
impl TextExtractor for PdftotextExtractor {
    async fn extract_text(&self, asset: &str) -> Result<String> {
        let path = self.resolve(asset);
        debug!("Extracting text from {}", path.display());

        // "-" sends the extracted text to stdout
        let output = tokio::process::Command::new("pdftotext")
            .arg(&path)
            .arg("-")
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow!("pdftotext failed for {}", path.display()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn provider_type(&self) -> ExtractionProvider {
        ExtractionProvider::Pdftotext
    }
}

/// Remote OCR / text-extraction service
pub struct RemoteExtractor {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    source: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    text: String,
}

impl RemoteExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("remote extraction endpoint not configured"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TextExtractor for RemoteExtractor {
    async fn extract_text(&self, asset: &str) -> Result<String> {
        debug!("Sending {} to extraction service at {}", asset, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ExtractionRequest { source: asset })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("extraction service error {}: {}", status, text));
        }

        let extraction: ExtractionResponse = response.json().await?;
        Ok(extraction.text)
    }

    fn provider_type(&self) -> ExtractionProvider {
        ExtractionProvider::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_provider() {
        let config = ExtractionConfig::default();
        let extractor = create_extractor(&config).unwrap();
        assert_eq!(extractor.provider_type(), ExtractionProvider::Pdftotext);
    }

    #[test]
    fn test_remote_requires_endpoint() {
        let mut config = ExtractionConfig::default();
        config.provider = ExtractionProvider::Remote;
        assert!(create_extractor(&config).is_err());

        config.endpoint = Some("http://localhost:8080/extract".to_string());
        let extractor = create_extractor(&config).unwrap();
        assert_eq!(extractor.provider_type(), ExtractionProvider::Remote);
    }

    #[test]
    fn test_relative_asset_resolution() {
        let extractor = PdftotextExtractor::new(Some(PathBuf::from("/data/assets")));
        assert_eq!(
            extractor.resolve("sheets/subnetting.pdf"),
            PathBuf::from("/data/assets/sheets/subnetting.pdf")
        );
        assert_eq!(
            extractor.resolve("/abs/other.pdf"),
            PathBuf::from("/abs/other.pdf")
        );
    }
}
