//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API. The studio only needs the lyric text, so
//! lookups fall back from the exact `get` endpoint to free-text search.
//! API Documentation: https://lrclib.net/docs

use anyhow::Context;
use serde::Deserialize;

/// LRCLIB API response
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibResponse {
    pub id: i64,
    #[serde(rename = "trackName")]
    pub track_name: String,
    #[serde(rename = "artistName")]
    pub artist_name: String,
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = concat!("singsync/", env!("CARGO_PKG_VERSION"));

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build lrclib http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get lyrics by track info
    pub async fn get_lyrics(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> anyhow::Result<Option<LrclibResponse>> {
        // First try the "get" endpoint with exact match
        if let Some(lyrics) = self.get_exact(track_name, artist_name).await? {
            return Ok(Some(lyrics));
        }

        // Fall back to search
        self.search(track_name, artist_name).await
    }

    fn get_url(&self, track_name: &str, artist_name: &str) -> String {
        format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        )
    }

    async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> anyhow::Result<Option<LrclibResponse>> {
        let url = self.get_url(track_name, artist_name);

        tracing::debug!(%url, "lrclib get");
        let response = self.client.get(&url).send().await.context("lrclib get")?;

        if response.status().is_success() {
            let lyrics: LrclibResponse = response.json().await.context("decode lrclib get")?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }

    async fn search(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> anyhow::Result<Option<LrclibResponse>> {
        let query = format!("{track_name} {artist_name}");
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&query));

        tracing::debug!(%url, "lrclib search");
        let response = self.client.get(&url).send().await.context("lrclib search")?;

        if response.status().is_success() {
            let results: Vec<LrclibResponse> =
                response.json().await.context("decode lrclib search")?;

            // Prefer a result that actually has plain text
            let best = results
                .iter()
                .find(|r| r.plain_lyrics.as_deref().is_some_and(|p| !p.is_empty()))
                .or_else(|| results.first());

            Ok(best.cloned())
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }
    }
}
