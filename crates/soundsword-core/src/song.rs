use std::ffi::OsStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mime_guess::mime::Mime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::media_type;
use crate::uri::Uri;
use crate::PlayableMedia;

/// A single song stored on disk. No IO occurs at construction.
///
/// Two songs are equal when their URIs are equal, and hash the same URI, so
/// `"/music//a.mp3"` and `"/music/a.mp3"` are the same song while `"a.mp3"`
/// and `"./a.mp3"` are not.
///
/// A relative song is resolved against the working directory each time it is
/// compared or hashed. Changing the working directory while relative songs
/// sit in a `HashSet` or `HashMap` key changes their identity and leaves the
/// collection inconsistent; resolve them first with [`Song::uri_in`] or
/// build songs from absolute paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SongRecord", into = "SongRecord")]
pub struct Song {
    /// The file on disk containing this song, relative or absolute.
    location: PathBuf,
}

/// Serialized form of a [`Song`].
#[derive(Serialize, Deserialize)]
struct SongRecord {
    path: PathBuf,
}

/// What equality and hashing compare.
#[derive(PartialEq, Eq, Hash)]
enum Identity<'a> {
    Uri(Uri),
    /// Used when a relative path cannot be resolved.
    Raw(&'a Path),
}

impl Song {
    /// Create a song from a path string (relative or absolute). The file at
    /// `path` is not accessed.
    ///
    /// Fails with [`Error::InvalidArgument`] if `path` is empty or contains a
    /// NUL byte. An empty path counts as absent; it never names the working
    /// directory.
    pub fn from_file_path(path: &str) -> Result<Self> {
        Self::from_file(PathBuf::from(path))
    }

    /// Create a song from an existing path value. The file is not accessed.
    pub fn from_file(location: impl Into<PathBuf>) -> Result<Self> {
        let location = location.into();
        validate(&location)?;
        Ok(Self { location })
    }

    /// Create a song from a local `file` URI.
    pub fn from_uri(uri: &Uri) -> Result<Self> {
        Self::from_file(uri.to_file_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.location
    }

    pub fn into_path(self) -> PathBuf {
        self.location
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.location.file_name()
    }

    /// URI of this song with a relative path resolved against `base`, which
    /// must be absolute.
    pub fn uri_in(&self, base: &Path) -> Result<Uri> {
        Uri::from_file_path_in(&self.location, base)
    }

    /// Media type guessed from the file extension.
    pub fn mime_type(&self) -> Option<Mime> {
        media_type::guess(&self.location)
    }

    pub fn is_audio(&self) -> bool {
        media_type::is_audio(&self.location)
    }

    fn identity(&self) -> Identity<'_> {
        match self.uri() {
            Ok(uri) => Identity::Uri(uri),
            Err(e) => {
                tracing::warn!(
                    "comparing {} by raw path: {}",
                    self.location.display(),
                    e
                );
                Identity::Raw(&self.location)
            }
        }
    }
}

fn validate(location: &Path) -> Result<()> {
    let bytes = location.as_os_str().as_encoded_bytes();
    if bytes.is_empty() {
        return Err(Error::InvalidArgument("path cannot be empty".to_string()));
    }
    if bytes.contains(&0) {
        return Err(Error::InvalidArgument(format!(
            "path cannot contain a NUL byte: {}",
            location.display()
        )));
    }
    Ok(())
}

impl PlayableMedia for Song {
    fn uri(&self) -> Result<Uri> {
        Uri::from_file_path(&self.location)
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.identity() == other.identity()
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}

impl AsRef<Path> for Song {
    fn as_ref(&self) -> &Path {
        &self.location
    }
}

impl FromStr for Song {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_file_path(s)
    }
}

impl TryFrom<&str> for Song {
    type Error = Error;

    fn try_from(path: &str) -> Result<Self> {
        Self::from_file_path(path)
    }
}

impl TryFrom<String> for Song {
    type Error = Error;

    fn try_from(path: String) -> Result<Self> {
        Self::from_file(path)
    }
}

impl TryFrom<PathBuf> for Song {
    type Error = Error;

    fn try_from(location: PathBuf) -> Result<Self> {
        Self::from_file(location)
    }
}

impl TryFrom<SongRecord> for Song {
    type Error = Error;

    fn try_from(record: SongRecord) -> Result<Self> {
        Self::from_file(record.path)
    }
}

impl From<Song> for SongRecord {
    fn from(song: Song) -> Self {
        SongRecord {
            path: song.location,
        }
    }
}
