/// Learning Materials Metadata Analyzer
///
/// Enriches JSON dumps of learning materials (lectures, labs, tests) with
/// derived metadata — word counts, embedded-video minutes, picture and
/// link counts, estimated completion time — and flattens a whitelisted
/// subset of that metadata into CSV reports.

pub mod config;
pub mod enrich;
pub mod extract;
pub mod material;
pub mod report;
pub mod scrub;
pub mod video;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::enrich::{EnrichmentStats, MaterialEnricher};
pub use crate::extract::{create_extractor, TextExtractor};
pub use crate::material::{Material, MaterialType, Question};
pub use crate::report::{CsvReporter, ReportStats};
pub use crate::scrub::{ScrubOutcome, TextScrubber};
pub use crate::video::DurationProber;
