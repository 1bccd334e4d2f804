//! Video transcript ingestion: YouTube URL -> plain text.
//!
//! The actual transcript extraction is an external collaborator. We parse
//! out the video id ourselves (so a bad URL fails fast with a 4xx) and hand
//! the id to a configurable transcript endpoint that returns plain text.

use std::time::Duration;

use tracing::instrument;

use crate::error::TutorError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pull the 11-character video id out of the common YouTube URL shapes:
/// `youtube.com/watch?v=ID`, `youtu.be/ID`, `youtube.com/embed/ID`.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let candidate = if let Some(tail) = rest.strip_prefix("youtu.be/") {
        Some(tail)
    } else if let Some(tail) = rest.strip_prefix("youtube.com/") {
        if let Some(q) = tail.split_once('?').map(|(_, q)| q) {
            q.split('&').find_map(|kv| kv.strip_prefix("v="))
        } else {
            tail.strip_prefix("embed/")
        }
    } else {
        None
    };

    let id: String = candidate?
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if id.len() == 11 {
        Some(id)
    } else {
        None
    }
}

/// Thin client for the transcript-fetching service.
#[derive(Clone)]
pub struct TranscriptClient {
    client: reqwest::Client,
    /// e.g. "http://localhost:9000/transcript" — the video id is appended
    /// as a query parameter. Unset means transcript ingestion is disabled.
    base_url: Option<String>,
}

impl TranscriptClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("TRANSCRIPT_API_URL").ok();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// Fetch the transcript text for a video URL. `InvalidUrl` when no video
    /// id can be parsed; upstream failures surface uninterpreted.
    #[instrument(level = "info", skip(self, url), fields(url_len = url.len()))]
    pub async fn fetch(&self, url: &str) -> Result<String, TutorError> {
        let video_id =
            youtube_video_id(url).ok_or_else(|| TutorError::InvalidUrl(url.to_string()))?;
        let base = self.base_url.as_deref().ok_or_else(|| {
            TutorError::UpstreamGeneration("transcript service not configured (TRANSCRIPT_API_URL)".into())
        })?;

        let res = self
            .client
            .get(base)
            .query(&[("video_id", video_id.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { TutorError::UpstreamTimeout } else { TutorError::UpstreamGeneration(e.to_string()) }
            })?;

        if !res.status().is_success() {
            return Err(TutorError::UpstreamGeneration(format!(
                "transcript service HTTP {}",
                res.status()
            )));
        }
        res.text()
            .await
            .map_err(|e| TutorError::UpstreamGeneration(e.to_string()))
    }
}
