//! Remote catalog reached over HTTP.
//!
//! POST {endpoint}/songs with the artifact as JSON; the server answers with
//! `{"id": "..."}` and queues the song for review.

use super::{Artifact, Catalog, SongId};
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    #[serde(flatten)]
    artifact: &'a Artifact,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct SubmitReply {
    id: String,
}

impl HttpCatalog {
    pub fn new(endpoint: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("singsync/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("build catalog http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn songs_url(&self) -> String {
        format!("{}/songs", self.endpoint)
    }
}

impl Catalog for HttpCatalog {
    async fn submit(&self, artifact: Artifact) -> anyhow::Result<SongId> {
        let body = SubmitBody {
            artifact: &artifact,
            status: "pending_review",
        };
        let mut req = self.client.post(self.songs_url()).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::info!(url = %self.songs_url(), title = %artifact.title, "submitting song");
        let response = req.send().await.context("send catalog request")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("catalog returned {status}: {}", text.trim());
        }

        let reply: SubmitReply = response.json().await.context("decode catalog reply")?;
        Ok(SongId(reply.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::{SingerPart, SyncedLyricLine};

    #[test]
    fn test_submit_body_shape() {
        let artifact = Artifact {
            title: "Song".into(),
            artist: "Duo".into(),
            audio: "https://cdn/a.mp3".into(),
            cover: None,
            lyrics: vec![SyncedLyricLine {
                timestamp_ms: 1000,
                text: "Hi".into(),
                singer: SingerPart::B,
            }],
        };
        let body = SubmitBody { artifact: &artifact, status: "pending_review" };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["status"], "pending_review");
        assert_eq!(v["title"], "Song");
        assert_eq!(v["cover"], serde_json::Value::Null);
        assert_eq!(v["lyrics"][0]["time"], 1000);
        assert_eq!(v["lyrics"][0]["singer"], "B");
    }

    #[test]
    fn test_songs_url() {
        let c = HttpCatalog::new("https://api.example.com/v1/", None).unwrap();
        assert_eq!(c.songs_url(), "https://api.example.com/v1/songs");
    }
}
