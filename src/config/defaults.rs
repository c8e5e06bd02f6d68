use super::{CatalogConfig, Config, LyricsConfig, PathsConfig, PlayerConfig, SyncConfig};

/// Config written on first run.
pub fn defaults() -> Config {
    Config {
        paths: PathsConfig::default(),
        player: PlayerConfig::default(),
        sync: SyncConfig::default(),
        catalog: CatalogConfig::default(),
        lyrics: LyricsConfig::default(),
    }
}
