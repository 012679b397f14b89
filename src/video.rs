use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::VideoConfig;

/// Duration prober for videos embedded in material bodies.
///
/// YouTube embeds are resolved through the Data API v3 when an API key is
/// configured, otherwise through a `yt-dlp` metadata probe. Directly
/// linked media files fall back to `ffprobe`.
pub struct DurationProber {
    client: reqwest::Client,
    config: VideoConfig,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

impl DurationProber {
    pub fn new(config: VideoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    /// Resolve the playtime of a YouTube watch URL, rounded to minutes
    pub async fn youtube_minutes(&self, watch_url: &str) -> Result<u64> {
        let video_id = youtube_video_id(watch_url)?;

        if let Some(ref api_key) = self.config.youtube_api_key {
            match self.lookup_data_api(&video_id, api_key).await {
                Ok(minutes) => return Ok(minutes),
                Err(e) => {
                    if !self.config.ytdlp_fallback {
                        return Err(e);
                    }
                    warn!("⚠️ Data API lookup failed for {}: {}", video_id, e);
                }
            }
        }

        if self.config.ytdlp_fallback {
            return self.probe_with_ytdlp(watch_url).await;
        }

        Err(anyhow!("no lookup method configured for video {}", video_id))
    }

    /// Query the YouTube Data API v3 for a video's duration
    async fn lookup_data_api(&self, video_id: &str, api_key: &str) -> Result<u64> {
        let endpoint = format!(
            "https://www.googleapis.com/youtube/v3/videos?part=contentDetails&id={}&key={}",
            video_id, api_key
        );

        debug!("Looking up video {} via Data API", video_id);

        let response = self.client.get(&endpoint).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("YouTube API error {}: {}", status, text));
        }

        let videos: VideosResponse = response.json().await?;
        let item = videos
            .items
            .first()
            .ok_or_else(|| anyhow!("video {} not found", video_id))?;

        let duration = parse_iso8601_duration(&item.content_details.duration)?;
        Ok(round_minutes(duration.as_secs_f64()))
    }

    /// Probe a YouTube URL with yt-dlp (no API key required)
    async fn probe_with_ytdlp(&self, watch_url: &str) -> Result<u64> {
        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", watch_url])
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow!("yt-dlp failed for {}", watch_url));
        }

        let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let seconds = metadata["duration"]
            .as_f64()
            .ok_or_else(|| anyhow!("yt-dlp returned no duration for {}", watch_url))?;

        Ok(round_minutes(seconds))
    }

    /// Probe a directly linked media file (or URL) with ffprobe
    pub async fn media_minutes(&self, target: &str) -> Result<u64> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                target,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed for {}", target));
        }

        let probe: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let seconds: f64 = probe["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("ffprobe returned no duration for {}", target))?;

        Ok(round_minutes(seconds))
    }
}

/// Extract the video id from a YouTube watch URL
pub fn youtube_video_id(watch_url: &str) -> Result<String> {
    let url = Url::parse(watch_url)?;
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| anyhow!("no video id in {}", watch_url))
}

/// Parse an ISO-8601 duration as returned by the YouTube Data API
/// (e.g. "PT1H2M30S", "PT45S", "P1DT2H")
pub fn parse_iso8601_duration(input: &str) -> Result<Duration> {
    let rest = input
        .strip_prefix('P')
        .ok_or_else(|| anyhow!("invalid ISO-8601 duration: {}", input))?;

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut seconds: u64 = 0;
    let mut number = String::new();

    for c in date_part.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else {
            let value: u64 = number
                .parse()
                .map_err(|_| anyhow!("invalid ISO-8601 duration: {}", input))?;
            number.clear();
            match c {
                'D' => seconds += value * 86_400,
                _ => {
                    return Err(anyhow!(
                        "unsupported duration designator {} in {}",
                        c,
                        input
                    ))
                }
            }
        }
    }

    for c in time_part.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else {
            let value: u64 = number
                .parse()
                .map_err(|_| anyhow!("invalid ISO-8601 duration: {}", input))?;
            number.clear();
            match c {
                'H' => seconds += value * 3_600,
                'M' => seconds += value * 60,
                'S' => seconds += value,
                _ => {
                    return Err(anyhow!(
                        "unsupported duration designator {} in {}",
                        c,
                        input
                    ))
                }
            }
        }
    }

    if !number.is_empty() {
        return Err(anyhow!("invalid ISO-8601 duration: {}", input));
    }

    Ok(Duration::from_secs(seconds))
}

/// Round a playtime in seconds to whole minutes, ties to the even minute
pub fn round_minutes(seconds: f64) -> u64 {
    let minutes = seconds / 60.0;
    let floor = minutes.floor();
    if minutes - floor == 0.5 {
        let base = floor as u64;
        if base % 2 == 0 {
            base
        } else {
            base + 1
        }
    } else {
        minutes.round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_extraction() {
        let id = youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_with_extra_params() {
        let id = youtube_video_id("https://www.youtube.com/watch?v=abc123&t=42s").unwrap();
        assert_eq!(id, "abc123");
    }

    #[test]
    fn test_video_id_missing() {
        assert!(youtube_video_id("https://www.youtube.com/playlist?list=xyz").is_err());
    }

    #[test]
    fn test_iso8601_parsing() {
        assert_eq!(
            parse_iso8601_duration("PT1H2M30S").unwrap(),
            Duration::from_secs(3750)
        );
        assert_eq!(
            parse_iso8601_duration("PT45S").unwrap(),
            Duration::from_secs(45)
        );
        assert_eq!(
            parse_iso8601_duration("PT15M").unwrap(),
            Duration::from_secs(900)
        );
        assert_eq!(
            parse_iso8601_duration("P1DT2H").unwrap(),
            Duration::from_secs(93_600)
        );
    }

    #[test]
    fn test_iso8601_rejects_garbage() {
        assert!(parse_iso8601_duration("1H2M").is_err());
        assert!(parse_iso8601_duration("PT1X").is_err());
        assert!(parse_iso8601_duration("PT90").is_err());
    }

    #[test]
    fn test_minute_rounding() {
        assert_eq!(round_minutes(0.0), 0);
        assert_eq!(round_minutes(29.0), 0);
        assert_eq!(round_minutes(31.0), 1);
        assert_eq!(round_minutes(3751.0), 63);
    }

    #[test]
    fn test_half_minute_rounds_to_even() {
        assert_eq!(round_minutes(30.0), 0);
        assert_eq!(round_minutes(90.0), 2);
        assert_eq!(round_minutes(150.0), 2);
        assert_eq!(round_minutes(210.0), 4);
        assert_eq!(round_minutes(270.0), 4);
    }
}
