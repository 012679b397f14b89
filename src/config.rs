use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the materials analyzer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Enrichment pipeline settings
    pub enrichment: EnrichmentConfig,

    /// Embedded video duration lookup settings
    pub video: VideoConfig,

    /// PDF text extraction settings
    pub extraction: ExtractionConfig,

    /// Completion time estimate settings
    pub estimate: EstimateConfig,

    /// CSV report settings
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Abort the whole run on the first malformed material
    pub fail_fast: bool,

    /// Extract and count words from linked PDF assets
    pub extract_pdf_text: bool,

    /// Probe directly linked media files (.mp4 etc.) with ffprobe
    pub probe_media_links: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            extract_pdf_text: false,
            probe_media_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Look up the duration of embedded videos
    pub enable_lookup: bool,

    /// YouTube Data API v3 key
    pub youtube_api_key: Option<String>,

    /// Probe with yt-dlp when no API key is set (or the API fails)
    pub ytdlp_fallback: bool,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enable_lookup: true,
            youtube_api_key: None,
            ytdlp_fallback: true,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExtractionProvider {
    /// Local pdftotext subprocess
    Pdftotext,
    /// Remote OCR / text-extraction HTTP endpoint
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extraction backend
    pub provider: ExtractionProvider,

    /// Endpoint for the remote provider
    pub endpoint: Option<String>,

    /// Directory that relative asset links resolve against
    pub assets_dir: Option<PathBuf>,

    /// Request / subprocess timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ExtractionProvider::Pdftotext,
            endpoint: None,
            assets_dir: None,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Reading speed used for the completion estimate
    pub words_per_minute: u64,

    /// Viewing time budgeted per embedded picture
    pub seconds_per_picture: u64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            seconds_per_picture: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Column whitelist for the CSV report, in output order
    pub columns: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                "_id".to_string(),
                "materialType".to_string(),
                "video_minutes".to_string(),
                "pics".to_string(),
                "words".to_string(),
                "estimated_minutes".to_string(),
                "completed".to_string(),
                "material_id".to_string(),
                "user_id".to_string(),
                "assignedAt".to_string(),
                "submitedAt".to_string(),
                "score".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration, trying the usual locations
    pub fn load() -> Result<Self> {
        let config_paths = [
            "materials-analyzer.toml",
            "config/materials-analyzer.toml",
            "~/.config/materials-analyzer/config.toml",
            "/etc/materials-analyzer/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from an explicit path (--config)
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Cannot parse config {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("MATERIALS_ANALYZER_YOUTUBE_API_KEY") {
            self.video.youtube_api_key = Some(api_key);
        }

        if let Ok(wpm) = std::env::var("MATERIALS_ANALYZER_WORDS_PER_MINUTE") {
            if let Ok(wpm) = wpm.parse() {
                self.estimate.words_per_minute = wpm;
            }
        }

        if let Ok(endpoint) = std::env::var("MATERIALS_ANALYZER_EXTRACTION_ENDPOINT") {
            self.extraction.provider = ExtractionProvider::Remote;
            self.extraction.endpoint = Some(endpoint);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.estimate.words_per_minute == 0 {
            return Err(anyhow!("words_per_minute must be greater than 0"));
        }

        if self.report.columns.is_empty() {
            return Err(anyhow!("report column whitelist must not be empty"));
        }

        if self.extraction.provider == ExtractionProvider::Remote
            && self.extraction.endpoint.is_none()
        {
            return Err(anyhow!("endpoint required for remote extraction provider"));
        }

        if self.video.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Materials Analyzer Configuration:\n\
            - Video lookup: {} (API key: {}, yt-dlp fallback: {})\n\
            - PDF extraction: {} ({:?})\n\
            - Reading speed: {} wpm\n\
            - Seconds per picture: {}\n\
            - Report columns: {}",
            self.video.enable_lookup,
            if self.video.youtube_api_key.is_some() {
                "set"
            } else {
                "unset"
            },
            self.video.ytdlp_fallback,
            self.enrichment.extract_pdf_text,
            self.extraction.provider,
            self.estimate.words_per_minute,
            self.estimate.seconds_per_picture,
            self.report.columns.join(", ")
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_youtube_api_key(mut self, api_key: String) -> Self {
        self.config.video.youtube_api_key = Some(api_key);
        self
    }

    pub fn with_words_per_minute(mut self, wpm: u64) -> Self {
        self.config.estimate.words_per_minute = wpm;
        self
    }

    pub fn with_report_columns(mut self, columns: Vec<String>) -> Self {
        self.config.report.columns = columns;
        self
    }

    pub fn enable_video_lookup(mut self, enable: bool) -> Self {
        self.config.video.enable_lookup = enable;
        self
    }

    pub fn enable_pdf_extraction(mut self, enable: bool) -> Self {
        self.config.enrichment.extract_pdf_text = enable;
        self
    }

    pub fn fail_fast(mut self, enable: bool) -> Self {
        self.config.enrichment.fail_fast = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
