//! Runtime configuration for Supabase storage and PostgREST access.
//!
//! All settings come from the process environment (a `.env` file is loaded
//! by main before this runs). The two credentials are required; the rest
//! have defaults so a one-album run works out of the box.

use anyhow::{bail, Result};

/// Default storage bucket for uploaded audio.
const DEFAULT_BUCKET: &str = "albums";

/// Default folder inside the bucket under which song files are keyed.
const DEFAULT_FOLDER: &str = "SOUR";

/// Placeholder artwork URL emitted for singer/album/song rows.
/// Operators are expected to replace this before executing the SQL.
const DEFAULT_ALBUM_ART_URL: &str =
    "https://lgnvhovprubrxohnhwph.supabase.co/storage/v1/object/public/picture/Album/SOUR.jpg";

/// Explicit configuration object passed into each component, so tests can
/// substitute fake collaborators instead of relying on process-wide state.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Supabase project, e.g. `https://xyz.supabase.co`.
    pub storage_url: String,
    /// Service-role credential used for both storage and table queries.
    pub service_key: String,
    /// Storage bucket receiving uploads.
    pub bucket: String,
    /// Folder prefix for song keys inside the bucket.
    pub upload_folder: String,
    /// Placeholder artwork URL written into the generated SQL.
    pub album_art_url: String,
}

impl Config {
    /// Build a config from the environment.
    ///
    /// `SUPABASE_URL` and `SUPABASE_SERVICE_KEY` are required; missing
    /// either is fatal with a descriptive message.
    pub fn from_env() -> Result<Self> {
        let storage_url = std::env::var("SUPABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let service_key = std::env::var("SUPABASE_SERVICE_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let (Some(storage_url), Some(service_key)) = (storage_url, service_key) else {
            bail!(
                "SUPABASE_URL and SUPABASE_SERVICE_KEY must be set in the environment or .env file\n\
                 Expected:\n\
                 SUPABASE_URL=your_supabase_url\n\
                 SUPABASE_SERVICE_KEY=your_service_role_key"
            );
        };

        Ok(Self {
            storage_url: storage_url.trim().trim_end_matches('/').to_string(),
            service_key: service_key.trim().to_string(),
            bucket: env_or("SUPABASE_BUCKET", DEFAULT_BUCKET),
            upload_folder: env_or("SUPABASE_FOLDER", DEFAULT_FOLDER),
            album_art_url: env_or("ALBUM_ART_URL", DEFAULT_ALBUM_ART_URL),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("CATALOG_SEED_UNSET_VAR_XYZ", "fallback"), "fallback");
    }

    #[test]
    fn test_defaults_are_sane() {
        assert_eq!(DEFAULT_BUCKET, "albums");
        assert!(DEFAULT_ALBUM_ART_URL.starts_with("https://"));
    }
}
