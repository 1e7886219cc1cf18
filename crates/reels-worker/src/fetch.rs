//! Recitation audio and verse text clients.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Source of per-verse recitation audio.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Raw audio bytes for one verse.
    async fn fetch_audio(&self, reciter: &str, surah: u32, ayah: u32) -> WorkerResult<Vec<u8>>;
}

/// Source of verse text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, surah: u32, ayah: u32) -> WorkerResult<String>;
}

/// Build the shared HTTP client.
pub fn build_http_client(timeout: Duration) -> WorkerResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("reels-worker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WorkerError::config(format!("HTTP client: {}", e)))
}

/// Audio service laid out as `{base}/{reciter}/{SSS}{AAA}.mp3`.
#[derive(Debug, Clone)]
pub struct HttpAudioSource {
    client: Client,
    base_url: String,
}

impl HttpAudioSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, reciter: &str, surah: u32, ayah: u32) -> String {
        format!("{}/{}/{:03}{:03}.mp3", self.base_url, reciter, surah, ayah)
    }
}

#[async_trait]
impl AudioSource for HttpAudioSource {
    async fn fetch_audio(&self, reciter: &str, surah: u32, ayah: u32) -> WorkerResult<Vec<u8>> {
        let url = self.url_for(reciter, surah, ayah);
        debug!(url = %url, "Fetching verse audio");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::fetch(format!("audio {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::fetch(format!("audio {} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::fetch(format!("audio {}: {}", url, e)))?;
        if bytes.is_empty() {
            return Err(WorkerError::fetch(format!("audio {} was empty", url)));
        }
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct AyahResponse {
    data: AyahData,
}

#[derive(Debug, Deserialize)]
struct AyahData {
    text: String,
}

/// Text service answering `{base}/ayah/{surah}:{ayah}/{edition}` with `{"data": {"text": ..}}`.
#[derive(Debug, Clone)]
pub struct HttpTextSource {
    client: Client,
    base_url: String,
    edition: String,
}

impl HttpTextSource {
    pub fn new(client: Client, base_url: impl Into<String>, edition: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            edition: edition.into(),
        }
    }

    pub fn url_for(&self, surah: u32, ayah: u32) -> String {
        format!("{}/ayah/{}:{}/{}", self.base_url, surah, ayah, self.edition)
    }
}

#[async_trait]
impl TextSource for HttpTextSource {
    async fn fetch_text(&self, surah: u32, ayah: u32) -> WorkerResult<String> {
        let url = self.url_for(surah, ayah);
        debug!(url = %url, "Fetching verse text");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::fetch(format!("text {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::fetch(format!("text {} returned {}", url, status)));
        }

        let body: AyahResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::fetch(format!("text {}: invalid body: {}", url, e)))?;
        let text = body.data.text.trim().to_string();
        if text.is_empty() {
            return Err(WorkerError::fetch(format!("text {} was empty", url)));
        }
        Ok(text)
    }
}
