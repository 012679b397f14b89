use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, EstimateConfig};
use crate::extract::{create_extractor, TextExtractor};
use crate::material::{Material, MaterialError};
use crate::scrub::{ScrubOutcome, TextScrubber};
use crate::video::DurationProber;

/// What happened to one material during enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    Enriched,
    /// Container types (course, learning-path) carry no text of their own
    Skipped,
}

/// Aggregated results of one enrichment run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentStats {
    pub total: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub video_lookups: usize,
    pub files: usize,
    pub started_at: DateTime<Utc>,
    pub total_time: Duration,
}

impl EnrichmentStats {
    fn new() -> Self {
        Self {
            total: 0,
            enriched: 0,
            skipped: 0,
            failed: 0,
            video_lookups: 0,
            files: 0,
            started_at: Utc::now(),
            total_time: Duration::from_secs(0),
        }
    }

    fn merge(&mut self, other: &EnrichmentStats) {
        self.total += other.total;
        self.enriched += other.enriched;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.video_lookups += other.video_lookups;
        self.files += other.files;
    }
}

/// Estimated completion time in minutes: reading time plus video playtime
/// plus picture viewing time, each rounded up to whole minutes
pub fn estimate_minutes(
    config: &EstimateConfig,
    words: u64,
    pics: u64,
    video_minutes: u64,
) -> u64 {
    let reading = (words + config.words_per_minute - 1) / config.words_per_minute;
    let viewing = (pics * config.seconds_per_picture + 59) / 60;
    reading + viewing + video_minutes
}

/// Single-pass enricher for material dumps.
///
/// Materials are processed strictly sequentially: the pipeline is I/O
/// bound on a handful of per-item lookups and the dumps are small, so
/// there is nothing to win from parallelism here.
pub struct MaterialEnricher {
    config: Config,
    scrubber: TextScrubber,
    prober: DurationProber,
    extractor: Option<Box<dyn TextExtractor>>,
}

impl MaterialEnricher {
    pub fn new(config: Config) -> Result<Self> {
        let scrubber = TextScrubber::new()?;
        let prober = DurationProber::new(config.video.clone())?;

        let extractor = if config.enrichment.extract_pdf_text {
            Some(create_extractor(&config.extraction)?)
        } else {
            None
        };

        Ok(Self {
            config,
            scrubber,
            prober,
            extractor,
        })
    }

    /// Enrich a dump file or every `*.json` dump under a directory
    pub async fn enrich_path(&self, input: &Path, update: bool) -> Result<EnrichmentStats> {
        if input.is_dir() {
            let mut dumps: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry.file_type().is_file()
                        && entry.path().extension().map_or(false, |ext| ext == "json")
                })
                .map(|entry| entry.into_path())
                .collect();
            dumps.sort();

            if dumps.is_empty() {
                return Err(anyhow!("no JSON dumps found in {}", input.display()));
            }

            info!("📦 Found {} dumps in {}", dumps.len(), input.display());

            let mut stats = EnrichmentStats::new();
            let start = Instant::now();
            for dump in &dumps {
                let file_stats = self.enrich_file(dump, update).await?;
                stats.merge(&file_stats);
            }
            stats.total_time = start.elapsed();
            Ok(stats)
        } else {
            self.enrich_file(input, update).await
        }
    }

    /// Enrich one dump file, optionally writing the result back
    pub async fn enrich_file(&self, path: &Path, update: bool) -> Result<EnrichmentStats> {
        info!("📄 Processing dump: {}", path.display());

        let raw = tokio::fs::read_to_string(path).await?;
        let mut materials: Vec<Material> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("cannot parse {}: {}", path.display(), e))?;

        let mut stats = self.enrich_all(&mut materials).await?;
        stats.files = 1;

        if update {
            write_pretty(path, &materials).await?;
            info!("💾 Metadata updated in: {}", path.display());
        }

        Ok(stats)
    }

    /// Enrich an already-loaded collection in place
    pub async fn enrich_all(&self, materials: &mut [Material]) -> Result<EnrichmentStats> {
        let start = Instant::now();
        let mut stats = EnrichmentStats::new();
        stats.total = materials.len();

        for material in materials.iter_mut() {
            match self.enrich_material(material, &mut stats).await {
                Ok(EnrichOutcome::Enriched) => stats.enriched += 1,
                Ok(EnrichOutcome::Skipped) => stats.skipped += 1,
                Err(e) => {
                    if self.config.enrichment.fail_fast {
                        return Err(e);
                    }
                    warn!("❌ Failed to enrich {}: {}", material.id, e);
                    stats.failed += 1;
                }
            }
        }

        stats.total_time = start.elapsed();
        Ok(stats)
    }

    /// Run the full pipeline over one material
    async fn enrich_material(
        &self,
        material: &mut Material,
        stats: &mut EnrichmentStats,
    ) -> Result<EnrichOutcome> {
        if material.material_type.is_container() {
            debug!("⏭️ Skipping {} ({})", material.id, material.material_type);
            return Ok(EnrichOutcome::Skipped);
        }

        info!("📘 {} ({})", material.id, material.material_type);

        if material.material_type.is_test() {
            debug!(" |-- {} questions", material.question_count());
            material.text = Some(material.synthesize_question_text()?);
        }

        let body = material
            .text
            .as_deref()
            .ok_or_else(|| MaterialError::MissingText {
                oid: material.id.oid.clone(),
            })?;

        let outcome = self.scrubber.scrub(body);

        let video_minutes = self.resolve_video_minutes(&outcome, stats).await;
        let mut words = outcome.words;

        if let Some(ref extractor) = self.extractor {
            for asset in &outcome.pdf_assets {
                match extractor.extract_text(asset).await {
                    Ok(text) => words += self.scrubber.plain_word_count(&text),
                    Err(e) => warn!("⚠️ Text extraction failed for {}: {}", asset, e),
                }
            }
        }

        let estimated = estimate_minutes(&self.config.estimate, words, outcome.pics, video_minutes);

        material.words = Some(words);
        material.pics = Some(outcome.pics);
        material.links = Some(outcome.links);
        material.video_minutes = Some(video_minutes);
        material.estimated_minutes = Some(estimated);

        info!(
            " |-- {} words, {} pics, {} links, {} video minutes, ~{} minutes total",
            words, outcome.pics, outcome.links, video_minutes, estimated
        );

        Ok(EnrichOutcome::Enriched)
    }

    /// Accumulate video minutes: one base minute per embed plus each
    /// video's looked-up playtime. A failed lookup keeps the base minute
    /// and the run moves on.
    async fn resolve_video_minutes(
        &self,
        outcome: &ScrubOutcome,
        stats: &mut EnrichmentStats,
    ) -> u64 {
        let mut minutes = outcome.video_urls.len() as u64;

        if !self.config.video.enable_lookup {
            return minutes;
        }

        for url in &outcome.video_urls {
            stats.video_lookups += 1;
            match self.prober.youtube_minutes(url).await {
                Ok(length) => minutes += length,
                Err(e) => warn!("⚠️ Video lookup failed for {}: {}", url, e),
            }
        }

        if self.config.enrichment.probe_media_links {
            for asset in &outcome.media_assets {
                match self.prober.media_minutes(asset).await {
                    Ok(length) => minutes += length,
                    Err(e) => warn!("⚠️ Media probe failed for {}: {}", asset, e),
                }
            }
        }

        minutes
    }
}

/// Write a dump back with the upstream format: UTF-8, 4-space indent
pub async fn write_pretty(path: &Path, materials: &[Material]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    materials.serialize(&mut serializer)?;
    tokio::fs::write(path, buf).await?;
    Ok(())
}
