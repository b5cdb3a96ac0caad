use std::path::Path;

use mime_guess::mime::{self, Mime};

/// Guess the media type of a file from its extension. The file is not read.
pub fn guess(path: &Path) -> Option<Mime> {
    mime_guess::from_path(path).first()
}

/// Check if the extension of `path` guesses as an `audio/*` type.
pub fn is_audio(path: &Path) -> bool {
    guess(path).map_or(false, |m| m.type_() == mime::AUDIO)
}
