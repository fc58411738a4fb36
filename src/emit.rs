//! SQL emission and the per-file processing loop.
//!
//! Drives the other components in sequence: allocate IDs once, then for each
//! audio file extract metadata, upload, and append one songs INSERT plus one
//! album_songs mapping INSERT. Any per-file failure is logged and the file is
//! skipped without consuming a song identifier.

use crate::config::Config;
use crate::ids::{self, TabularStore};
use crate::metadata;
use crate::storage::{self, ObjectStore};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extensions accepted by the folder scan (case-insensitive).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg"];

/// Scratch directory for embedded cover images, relative to the working
/// directory. Never uploaded automatically.
const PICTURES_DIR: &str = "pictures";

/// Counts reported back to the CLI after a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub songs_written: usize,
    pub files_skipped: usize,
}

/// Display title for the emitted SQL, derived from the filename stem.
/// For "artist - title" shaped names, everything after the first hyphen.
pub fn derive_title(stem: &str) -> String {
    match stem.split_once('-') {
        Some((_, rest)) => rest.trim().to_string(),
        None => stem.trim().to_string(),
    }
}

/// Audio files in the folder, in directory-enumeration order.
/// Deliberately unsorted: statements come out in whatever order the
/// filesystem returns entries.
fn audio_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("failed to read folder {}", folder.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    Ok(files)
}

fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(msg.to_string());
    pb
}

/// Process a folder of audio files and write the SQL artifact.
///
/// The singer and album IDs are allocated exactly once; the song ID counter
/// advances only after a file's statement pair has been written, so skipped
/// files leave no gaps.
pub fn run(
    folder: &Path,
    output: &Path,
    cfg: &Config,
    store: &dyn ObjectStore,
    tables: &dyn TabularStore,
) -> Result<RunSummary> {
    // Three independent queries, not transactionally consistent with each
    // other or with later writes.
    let singer_id = ids::next_singer_id(tables);
    let mut song_id = ids::next_song_id(tables);
    let album_id = ids::next_album_id(tables);

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);

    let display_name = folder
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Unknown")
        .to_string();
    let art_url = &cfg.album_art_url;

    writeln!(
        out,
        "-- Review the singer name, the artwork URLs, and the album description before executing"
    )?;
    writeln!(out, "-- Insert singer")?;
    writeln!(
        out,
        "INSERT INTO singer (id_singer, name_singer, picture_singer) VALUES ({singer_id}, '{display_name}', '{art_url}');"
    )?;
    writeln!(out)?;
    writeln!(out, "-- Insert album")?;
    writeln!(
        out,
        "INSERT INTO albums (id_album, name_album, picture_album, description) VALUES ({album_id}, '{display_name}', '{art_url}', 'Album {display_name}');"
    )?;
    writeln!(out)?;
    writeln!(out, "-- Insert songs")?;

    let files = audio_files(folder)?;
    let pb = create_progress_bar(files.len() as u64, "Processing songs");
    let mut summary = RunSummary::default();

    for path in files {
        // Unreadable files are skipped before any upload happens.
        let meta = match metadata::extract(&path, Path::new(PICTURES_DIR)) {
            Ok(m) => m,
            Err(e) => {
                pb.println(format!("Could not read metadata from {}: {e:#}", path.display()));
                summary.files_skipped += 1;
                pb.inc(1);
                continue;
            }
        };

        // The emitted title comes from the filename, not the tag.
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let title = derive_title(stem);

        let file_url = match storage::upload_song(store, cfg, &path) {
            Ok(url) => url,
            Err(e) => {
                pb.println(format!("Skipping {} due to upload error: {e:#}", path.display()));
                summary.files_skipped += 1;
                pb.inc(1);
                continue;
            }
        };

        let duration = meta.duration_sec;
        write!(
            out,
            "INSERT INTO songs (
    id_song,
    picture_song,
    name_song,
    id_singer,
    the_loai,
    am_thanh,
    duration,
    luot_nghe,
    danh_gia,
    volume
) VALUES (
    {song_id},
    '{art_url}',
    '{title}',
    {singer_id},
    'Pop',
    '{file_url}',
    {duration},
    0,
    1,
    100
);

"
        )?;
        writeln!(
            out,
            "INSERT INTO album_songs (id_album, id_song) VALUES ({album_id}, {song_id});"
        )?;
        writeln!(out)?;

        song_id += 1;
        summary.songs_written += 1;
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "Processed {} songs ({} skipped)",
        summary.songs_written, summary.files_skipped
    ));

    out.flush().context("failed to flush output file")?;
    Ok(summary)
}
