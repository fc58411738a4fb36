//! Audio metadata extraction using lofty.
//!
//! Reads ID3v2 (TIT2/TPE1/TALB/TCON/APIC) and generic Vorbis-comment style
//! tags (title/artist/album/genre) through lofty's unified accessors, plus
//! duration from stream properties and embedded cover art.

use anyhow::{Context, Result};
use lofty::picture::PictureType;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for one audio file. Produced once per file, never mutated.
#[derive(Clone, Debug, Default)]
pub struct AudioMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    /// Stream duration in whole seconds, 0 when absent.
    pub duration_sec: u64,
    /// Scratch file holding embedded cover art bytes, when present.
    pub picture_path: Option<PathBuf>,
}

/// Extract metadata from an audio file.
///
/// File type is detected from content, not extension. Unrecognized or
/// unreadable files are an `Err`; callers log and skip.
///
/// If the tag carries an embedded picture, its raw bytes are written to
/// `<pictures_dir>/<file stem>.jpg` and that path is recorded. An empty or
/// missing tag title falls back to the file stem.
pub fn extract(path: &Path, pictures_dir: &Path) -> Result<AudioMetadata> {
    let tagged_file = Probe::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .guess_file_type()
        .with_context(|| format!("failed to detect file type of {}", path.display()))?
        .read()
        .with_context(|| format!("failed to read tags from {}", path.display()))?;

    let duration_sec = tagged_file.properties().duration().as_secs();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();

    let mut meta = AudioMetadata {
        duration_sec,
        ..AudioMetadata::default()
    };

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        meta.title = tag.title().map(|s| s.to_string()).unwrap_or_default();
        meta.artist = tag.artist().map(|s| s.to_string()).unwrap_or_default();
        meta.album = tag.album().map(|s| s.to_string()).unwrap_or_default();
        meta.genre = tag.genre().map(|s| s.to_string()).unwrap_or_default();
        meta.picture_path = save_embedded_picture(tag.pictures(), &stem, pictures_dir)?;
    }

    // Filename fallback for a missing title
    if meta.title.trim().is_empty() {
        meta.title = stem;
    }

    Ok(meta)
}

/// Write embedded cover art bytes to a local scratch file named after the
/// track's stem. Prefers the front cover, falls back to the first picture.
fn save_embedded_picture(
    pictures: &[lofty::picture::Picture],
    stem: &str,
    pictures_dir: &Path,
) -> Result<Option<PathBuf>> {
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first());

    let Some(picture) = picture else {
        return Ok(None);
    };

    fs::create_dir_all(pictures_dir)
        .with_context(|| format!("failed to create {}", pictures_dir.display()))?;
    let out_path = pictures_dir.join(format!("{stem}.jpg"));
    fs::write(&out_path, picture.data())
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    Ok(Some(out_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Write a minimal one-second 16-bit mono PCM WAV file.
    fn write_test_wav(path: &Path) {
        let sample_rate: u32 = 44100;
        let data = vec![0u8; (sample_rate * 2) as usize];

        let mut bytes = Vec::with_capacity(44 + data.len());
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_untagged_file_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("SoloTrack.wav");
        write_test_wav(&wav);

        let meta = extract(&wav, &dir.path().join("pictures")).unwrap();
        assert_eq!(meta.title, "SoloTrack");
        assert_eq!(meta.artist, "");
        assert_eq!(meta.genre, "");
        assert_eq!(meta.duration_sec, 1);
        assert!(meta.picture_path.is_none());
    }

    #[test]
    fn test_unrecognized_format_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("garbage.mp3");
        std::fs::write(&bogus, b"this is not audio").unwrap();

        assert!(extract(&bogus, &dir.path().join("pictures")).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mp3");
        assert!(extract(&missing, &dir.path().join("pictures")).is_err());
    }
}
