//! Object storage uploads.
//!
//! `ObjectStore` is the seam for tests; `SupabaseStorage` is the real
//! implementation over the Supabase storage REST API. Uploads are blocking
//! round trips with no retries and no timeouts; a failure means the caller
//! skips that file.

use crate::config::Config;
use crate::sanitize::sanitize_filename;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;

/// A bucket that accepts raw bytes under a key and hands back a public URL.
pub trait ObjectStore {
    fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;
}

/// Supabase storage client for a single bucket.
pub struct SupabaseStorage {
    agent: ureq::Agent,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(cfg: &Config) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: cfg.storage_url.clone(),
            service_key: cfg.service_key.clone(),
            bucket: cfg.bucket.clone(),
        }
    }

    /// Public (unauthenticated) URL for a key. The Supabase SDK derives this
    /// client-side from the project URL; we do the same.
    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

impl ObjectStore for SupabaseStorage {
    fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);
        self.agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.service_key))
            .set("apikey", &self.service_key)
            .set("Content-Type", content_type)
            .send_bytes(bytes)
            .with_context(|| format!("upload of '{key}' failed"))?;

        Ok(normalize_public_url(&self.public_url(key)))
    }
}

/// Strip a trailing query-string marker and force the secure scheme.
pub fn normalize_public_url(url: &str) -> String {
    let url = url.trim_end_matches('?');
    if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else if url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Storage key for a song file: fixed folder plus the sanitized original name.
pub fn song_key(folder: &str, original_name: &str) -> String {
    format!("{}/{}", folder, sanitize_filename(original_name))
}

/// Storage key for artwork: sanitized song title plus a timestamp suffix,
/// to avoid collisions between runs.
pub fn picture_key(song_name: &str) -> String {
    format!(
        "{}_{}.jpg",
        sanitize_filename(song_name),
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Upload a raw audio file and return its public URL.
pub fn upload_song(store: &dyn ObjectStore, cfg: &Config, path: &Path) -> Result<String> {
    let original_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("non-UTF-8 file name: {}", path.display()))?;
    let key = song_key(&cfg.upload_folder, original_name);

    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let url = store.upload(&key, &bytes, "audio/mpeg")?;

    println!("Uploaded: {} -> {}", path.display(), url);
    Ok(url)
}

/// Upload album artwork and return its public URL.
///
/// Not called from the main flow: extracted cover images are left as local
/// scratch files for an operator to wire up by hand.
pub fn upload_picture(store: &dyn ObjectStore, path: &Path, song_name: &str) -> Result<String> {
    let key = picture_key(song_name);

    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let url = store.upload(&key, &bytes, "image/jpeg")?;

    println!("Uploaded album art: {} -> {}", path.display(), url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::RefCell;

    struct FakeStore {
        calls: RefCell<Vec<(String, usize, String)>>,
        fail: bool,
    }

    impl FakeStore {
        fn new(fail: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail,
            }
        }
    }

    impl ObjectStore for FakeStore {
        fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
            if self.fail {
                bail!("storage unavailable");
            }
            self.calls
                .borrow_mut()
                .push((key.to_string(), bytes.len(), content_type.to_string()));
            Ok(format!("https://fake.store/{key}"))
        }
    }

    fn test_config() -> Config {
        Config {
            storage_url: "https://example.supabase.co".to_string(),
            service_key: "key".to_string(),
            bucket: "albums".to_string(),
            upload_folder: "SOUR".to_string(),
            album_art_url: "https://example.com/art.jpg".to_string(),
        }
    }

    #[test]
    fn test_normalize_public_url() {
        assert_eq!(
            normalize_public_url("https://x.co/storage/v1/object/public/albums/a.mp3?"),
            "https://x.co/storage/v1/object/public/albums/a.mp3"
        );
        assert_eq!(
            normalize_public_url("http://x.co/file.mp3"),
            "https://x.co/file.mp3"
        );
        assert_eq!(normalize_public_url("x.co/file.mp3"), "https://x.co/file.mp3");
    }

    #[test]
    fn test_song_key_sanitizes_name() {
        assert_eq!(
            song_key("SOUR", "Đêm Sài Gòn.mp3"),
            "SOUR/Dem-Sai-Gon.mp3"
        );
    }

    #[test]
    fn test_picture_key_shape() {
        let key = picture_key("Đêm Sài Gòn");
        assert!(key.starts_with("Dem-Sai-Gon_"), "unexpected key: {key}");
        assert!(key.ends_with(".jpg"));
        // timestamp is 15 chars: YYYYMMDD_HHMMSS
        assert_eq!(key.len(), "Dem-Sai-Gon_".len() + 15 + ".jpg".len());
    }

    #[test]
    fn test_upload_song_uses_folder_and_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("My  Song!!.mp3");
        std::fs::write(&song, b"bytes").unwrap();

        let store = FakeStore::new(false);
        let cfg = test_config();
        let url = upload_song(&store, &cfg, &song).unwrap();
        assert_eq!(url, "https://fake.store/SOUR/My-Song.mp3");

        let calls = store.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("SOUR/My-Song.mp3".to_string(), 5, "audio/mpeg".to_string()));
    }

    #[test]
    fn test_upload_picture_uses_timestamped_jpg_key() {
        let dir = tempfile::tempdir().unwrap();
        let art = dir.path().join("cover.jpg");
        std::fs::write(&art, b"jpeg bytes").unwrap();

        let store = FakeStore::new(false);
        let url = upload_picture(&store, &art, "Đêm Sài Gòn").unwrap();
        assert!(url.starts_with("https://fake.store/Dem-Sai-Gon_"), "unexpected url: {url}");
        assert!(url.ends_with(".jpg"));

        let calls = store.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "image/jpeg");
    }

    #[test]
    fn test_upload_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("track.mp3");
        std::fs::write(&song, b"bytes").unwrap();

        let store = FakeStore::new(true);
        assert!(upload_song(&store, &test_config(), &song).is_err());
    }
}
