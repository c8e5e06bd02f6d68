//! Handing a finished sync to the catalog.

pub mod http;

use crate::lyrics::SyncedLyricLine;
use crate::storage::LocalCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

pub use http::HttpCatalog;

/// Identifier the catalog assigned to a published song.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub String);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the catalog needs to create a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub title: String,
    pub artist: String,
    pub audio: String,
    pub cover: Option<String>,
    pub lyrics: Vec<SyncedLyricLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    Published(SongId),
    Failed(String),
}

/// A place synced songs can be submitted to.
pub trait Catalog: Clone + Send + Sync + 'static {
    fn submit(&self, artifact: Artifact) -> impl Future<Output = anyhow::Result<SongId>> + Send;
}

/// Catalog picked from config: remote when an endpoint is set, local otherwise.
#[derive(Debug, Clone)]
pub enum AnyCatalog {
    Local(LocalCatalog),
    Remote(HttpCatalog),
}

impl Catalog for AnyCatalog {
    async fn submit(&self, artifact: Artifact) -> anyhow::Result<SongId> {
        match self {
            AnyCatalog::Local(c) => c.submit(artifact).await,
            AnyCatalog::Remote(c) => c.submit(artifact).await,
        }
    }
}

impl AnyCatalog {
    pub fn describe(&self) -> String {
        match self {
            AnyCatalog::Local(c) => format!("local catalog {}", c.path().display()),
            AnyCatalog::Remote(c) => format!("remote catalog {}", c.endpoint()),
        }
    }
}
