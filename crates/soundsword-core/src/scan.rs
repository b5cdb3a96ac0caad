use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::song::Song;
use crate::uri::Uri;
use crate::PlayableMedia;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    pub paths: Vec<String>,
    /// Resolve relative paths against this directory instead of the working directory
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Skip inputs whose extension does not look like audio
    #[serde(default)]
    pub audio_only: bool,
}

/// One distinct song found by [`scan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedSong {
    pub song: Song,
    pub uri: Uri,
    pub mime: Option<String>,
    /// How many inputs named this song
    pub occurrences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub songs: Vec<ScannedSong>,
    pub duplicates_removed: u64,
    pub skipped: u64,
}

/// Turn input paths into distinct songs, in first-seen order.
///
/// Fails on the first path that is not a valid song location.
pub fn scan(options: &ScanOptions) -> Result<ScanResult> {
    // uri -> index into songs
    let mut index: HashMap<Uri, usize> = HashMap::with_capacity(options.paths.len());
    let mut songs: Vec<ScannedSong> = Vec::with_capacity(options.paths.len());
    let mut duplicates_removed = 0;
    let mut skipped = 0;

    for path in &options.paths {
        let song = Song::from_file_path(path)?;
        if options.audio_only && !song.is_audio() {
            tracing::debug!("skipping non-audio input {}", song);
            skipped += 1;
            continue;
        }

        // Same URI as song equality when no base directory is given
        let uri = match &options.base_dir {
            Some(base) => song.uri_in(base)?,
            None => song.uri()?,
        };

        if let Some(&i) = index.get(&uri) {
            duplicates_removed += 1;
            songs[i].occurrences += 1;
            continue;
        }

        tracing::trace!("{} -> {}", song, uri);
        index.insert(uri.clone(), songs.len());
        songs.push(ScannedSong {
            mime: song.mime_type().map(|m| m.essence_str().to_string()),
            song,
            uri,
            occurrences: 1,
        });
    }

    Ok(ScanResult {
        songs,
        duplicates_removed,
        skipped,
    })
}
