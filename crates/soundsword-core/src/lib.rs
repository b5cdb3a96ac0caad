//! # soundsword
//!
//! Song file references for media playback. A [`Song`] wraps a path on local
//! storage and hands it to a player as a `file://` [`Uri`]; nothing touches
//! the filesystem until the URI is needed.
//!
//! ```
//! use soundsword_core::{PlayableMedia, Song};
//!
//! let song = Song::from_file_path("/music/song.mp3")?;
//! # #[cfg(unix)]
//! assert_eq!(song.uri()?.as_str(), "file:///music/song.mp3");
//! # Ok::<(), soundsword_core::Error>(())
//! ```

pub mod error;
pub mod media_type;
pub mod scan;
pub mod song;
pub mod uri;

pub use error::{Error, Result};
pub use scan::{scan, ScanOptions, ScanResult, ScannedSong};
pub use song::Song;
pub use uri::{Uri, FILE_SCHEME};

/// Something a player can be pointed at.
pub trait PlayableMedia {
    /// The URI a player should open for this media.
    fn uri(&self) -> Result<Uri>;
}

impl<T: PlayableMedia + ?Sized> PlayableMedia for &T {
    fn uri(&self) -> Result<Uri> {
        (**self).uri()
    }
}

impl<T: PlayableMedia + ?Sized> PlayableMedia for Box<T> {
    fn uri(&self) -> Result<Uri> {
        (**self).uri()
    }
}
