//! Content-addressed copies of local media files.
//!
//! A local audio or cover file is copied to `media/<sha1>.<ext>` so catalog
//! rows never point at a path the user may later move. Stashing the same
//! bytes twice finds the existing copy, which keeps publish retries cheap.

use anyhow::Context;
use sha1::{Digest, Sha1};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Return the reference to store for `reference`.
///
/// URIs (anything with a scheme) are kept verbatim; local paths are stashed.
pub fn stash(media_dir: &Path, reference: &str) -> anyhow::Result<String> {
    if reference.contains("://") {
        return Ok(reference.to_string());
    }

    let src = Path::new(reference);
    let digest = hash_file(src)?;
    let name = match src.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{digest}.{}", ext.to_ascii_lowercase()),
        None => digest,
    };
    let dest = media_dir.join(name);

    if dest.exists() {
        tracing::debug!(dest = %dest.display(), "media already stashed");
    } else {
        fs::create_dir_all(media_dir)
            .with_context(|| format!("create dir {}", media_dir.display()))?;
        // Copy under a temp name so a crash never leaves a truncated hash file.
        let tmp = dest.with_extension("part");
        fs::copy(src, &tmp).with_context(|| format!("copy {}", src.display()))?;
        fs::rename(&tmp, &dest).with_context(|| format!("rename {}", tmp.display()))?;
        tracing::info!(src = %src.display(), dest = %dest.display(), "media stashed");
    }

    Ok(dest.display().to_string())
}

fn hash_file(path: &Path) -> anyhow::Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("singsync-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_uri_kept() {
        let dir = scratch_dir("media-uri");
        let r = stash(&dir.join("media"), "https://cdn.example.com/a.mp3").unwrap();
        assert_eq!(r, "https://cdn.example.com/a.mp3");
        assert!(!dir.join("media").exists());
    }

    #[test]
    fn test_stash_is_idempotent() {
        let dir = scratch_dir("media-stash");
        let src = dir.join("Track.MP3");
        fs::write(&src, b"not really audio").unwrap();
        let media = dir.join("media");

        let first = stash(&media, src.to_str().unwrap()).unwrap();
        let second = stash(&media, src.to_str().unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with(".mp3"));
        assert_eq!(fs::read(&first).unwrap(), b"not really audio");
        assert_eq!(fs::read_dir(&media).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = scratch_dir("media-missing");
        let err = stash(&dir, dir.join("nope.ogg").to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.ogg"));
    }
}
