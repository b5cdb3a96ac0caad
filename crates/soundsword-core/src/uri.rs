use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scheme of every URI built from a local path.
pub const FILE_SCHEME: &str = "file";

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// An absolute, scheme-qualified identifier such as `file:///music/song.mp3`.
///
/// The URI is stored in its encoded form; equality, ordering and hashing all
/// work on that text, so two URIs are equal exactly when they print the same.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    text: String,
}

/// Borrowed view of the parts of a URI.
struct Parts<'a> {
    scheme: &'a str,
    authority: Option<&'a str>,
    path: &'a str,
}

impl Uri {
    /// Build a `file` URI for `path`, resolving a relative path against the
    /// current working directory. The file itself is never accessed.
    pub fn from_file_path(path: &Path) -> Result<Self> {
        if path.is_absolute() {
            return Ok(Self::from_absolute(path));
        }
        let cwd = std::env::current_dir()?;
        tracing::trace!("resolving {} against {}", path.display(), cwd.display());
        Self::from_file_path_in(path, &cwd)
    }

    /// Build a `file` URI for `path`, resolving a relative path against `base`.
    ///
    /// `base` must be absolute.
    pub fn from_file_path_in(path: &Path, base: &Path) -> Result<Self> {
        if path.is_absolute() {
            return Ok(Self::from_absolute(path));
        }
        if !base.is_absolute() {
            return Err(Error::InvalidArgument(format!(
                "base directory must be absolute: {}",
                base.display()
            )));
        }

        let mut encoded = String::new();
        push_segments(&mut encoded, base);
        push_segments(&mut encoded, path);
        Ok(Self::with_encoded_path(encoded))
    }

    fn from_absolute(path: &Path) -> Self {
        let mut encoded = String::new();
        push_segments(&mut encoded, path);
        Self::with_encoded_path(encoded)
    }

    fn with_encoded_path(mut encoded: String) -> Self {
        if encoded.is_empty() {
            encoded.push('/');
        }
        Self {
            text: format!("{}://{}", FILE_SCHEME, encoded),
        }
    }

    /// Parse URI text. Requires a scheme and well-formed `%XX` escapes.
    pub fn parse(text: &str) -> Result<Self> {
        let Some(colon) = text.find(':') else {
            return Err(Error::InvalidUri(format!("missing scheme: {}", text)));
        };
        let scheme = &text[..colon];
        if !is_valid_scheme(scheme) {
            return Err(Error::InvalidUri(format!("bad scheme {:?} in {}", scheme, text)));
        }

        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if !b.is_ascii() || b.is_ascii_control() || b == b' ' {
                return Err(Error::InvalidUri(format!(
                    "unencoded character at byte {} in {}",
                    i, text
                )));
            }
            if b == b'%' {
                let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
                if !valid {
                    return Err(Error::InvalidUri(format!(
                        "malformed escape at byte {} in {}",
                        i, text
                    )));
                }
                i += 3;
                continue;
            }
            i += 1;
        }

        Ok(Self {
            text: text.to_string(),
        })
    }

    fn parts(&self) -> Parts<'_> {
        // `text` always holds a validated "scheme:" prefix
        let colon = self.text.find(':').unwrap_or(0);
        let scheme = &self.text[..colon];
        let rest = &self.text[colon + 1..];
        let rest = match rest.find(['?', '#']) {
            Some(end) => &rest[..end],
            None => rest,
        };

        match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                Parts {
                    scheme,
                    authority: Some(&after[..end]),
                    path: &after[end..],
                }
            }
            None => Parts {
                scheme,
                authority: None,
                path: rest,
            },
        }
    }

    pub fn scheme(&self) -> &str {
        self.parts().scheme
    }

    /// The authority component, `Some("")` for `file:///...` URIs.
    pub fn authority(&self) -> Option<&str> {
        self.parts().authority
    }

    /// The path component, still percent-encoded.
    pub fn path(&self) -> &str {
        self.parts().path
    }

    pub fn is_file(&self) -> bool {
        self.scheme().eq_ignore_ascii_case(FILE_SCHEME)
    }

    /// The path component with escapes decoded into raw bytes.
    pub fn decoded_path(&self) -> Vec<u8> {
        percent_decode(self.path())
    }

    /// Convert a local `file` URI back into an absolute path.
    pub fn to_file_path(&self) -> Result<PathBuf> {
        let parts = self.parts();
        if !parts.scheme.eq_ignore_ascii_case(FILE_SCHEME) {
            return Err(Error::InvalidArgument(format!("not a file URI: {}", self)));
        }
        match parts.authority {
            None | Some("") | Some("localhost") => {}
            Some(host) => {
                return Err(Error::InvalidArgument(format!(
                    "file URI names a remote host {:?}: {}",
                    host, self
                )))
            }
        }
        if !parts.path.starts_with('/') {
            return Err(Error::InvalidArgument(format!(
                "file URI has no absolute path: {}",
                self
            )));
        }
        path_from_bytes(percent_decode(parts.path))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Uri {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.text
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Characters left as-is in an encoded path segment: ASCII alphanumerics and
/// `-_.!~*'()`, the same allow-list Android's `Uri.encode` uses.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

fn is_separator(b: u8) -> bool {
    b == b'/' || (cfg!(windows) && b == b'\\')
}

/// Append `/segment` for every non-empty segment of `path`. Empty segments
/// (doubled or trailing separators) are dropped; `.` and `..` are kept.
fn push_segments(out: &mut String, path: &Path) {
    let bytes = path_bytes(path);
    for segment in bytes.split(|b| is_separator(*b)).filter(|s| !s.is_empty()) {
        out.push('/');
        for &b in segment {
            if is_unreserved(b) {
                out.push(b as char);
            } else {
                out.push('%');
                out.push(HEX_UPPER[(b >> 4) as usize] as char);
                out.push(HEX_UPPER[(b & 0x0f) as usize] as char);
            }
        }
    }
}

fn percent_decode(encoded: &str) -> Vec<u8> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf> {
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf> {
    String::from_utf8(bytes)
        .map(PathBuf::from)
        .map_err(|e| Error::InvalidUri(format!("path is not UTF-8: {}", e)))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path() {
        let uri = Uri::from_file_path(Path::new("/music/song.mp3")).unwrap();
        assert_eq!(uri.as_str(), "file:///music/song.mp3");
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.authority(), Some(""));
        assert_eq!(uri.path(), "/music/song.mp3");
    }

    #[test]
    fn test_root_path() {
        let uri = Uri::from_file_path(Path::new("/")).unwrap();
        assert_eq!(uri.as_str(), "file:///");
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        let uri = Uri::from_file_path(Path::new("/music/my song#1?.mp3")).unwrap();
        assert_eq!(uri.as_str(), "file:///music/my%20song%231%3F.mp3");

        let uri = Uri::from_file_path(Path::new("/música/(live)!.flac")).unwrap();
        assert_eq!(uri.as_str(), "file:///m%C3%BAsica/(live)!.flac");
    }

    #[test]
    fn test_separators_collapse() {
        let a = Uri::from_file_path(Path::new("/music//albums///song.mp3/")).unwrap();
        assert_eq!(a.as_str(), "file:///music/albums/song.mp3");
    }

    #[test]
    fn test_relative_path_keeps_dot_segments() {
        let base = Path::new("/home/user");
        let plain = Uri::from_file_path_in(Path::new("a.mp3"), base).unwrap();
        let dotted = Uri::from_file_path_in(Path::new("./a.mp3"), base).unwrap();
        let parent = Uri::from_file_path_in(Path::new("../a.mp3"), base).unwrap();

        assert_eq!(plain.as_str(), "file:///home/user/a.mp3");
        assert_eq!(dotted.as_str(), "file:///home/user/./a.mp3");
        assert_eq!(parent.as_str(), "file:///home/user/../a.mp3");
        assert_ne!(plain, dotted);
    }

    #[test]
    fn test_relative_base_rejected() {
        let err = Uri::from_file_path_in(Path::new("a.mp3"), Path::new("music")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_absolute_path_ignores_base() {
        let uri = Uri::from_file_path_in(Path::new("/x/y.ogg"), Path::new("relative")).unwrap();
        assert_eq!(uri.as_str(), "file:///x/y.ogg");
    }

    #[test]
    fn test_parse_and_back_to_path() {
        let uri = Uri::from_file_path(Path::new("/music/my song.mp3")).unwrap();
        let parsed: Uri = uri.as_str().parse().unwrap();
        assert_eq!(parsed, uri);
        assert_eq!(parsed.decoded_path(), b"/music/my song.mp3");
        assert_eq!(parsed.to_file_path().unwrap(), PathBuf::from("/music/my song.mp3"));
    }

    #[test]
    fn test_non_utf8_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/music/\xff.mp3"));
        let uri = Uri::from_file_path(path).unwrap();
        assert_eq!(uri.as_str(), "file:///music/%FF.mp3");
        assert_eq!(uri.to_file_path().unwrap(), path);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(Uri::parse("no scheme here"), Err(Error::InvalidUri(_))));
        assert!(matches!(Uri::parse("1abc:/x"), Err(Error::InvalidUri(_))));
        assert!(matches!(Uri::parse("file:///a%2"), Err(Error::InvalidUri(_))));
        assert!(matches!(Uri::parse("file:///a%zz"), Err(Error::InvalidUri(_))));
        assert!(matches!(Uri::parse("file:///a b"), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_non_file_uris() {
        let uri = Uri::parse("https://example.com/stream.mp3?x=1").unwrap();
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.authority(), Some("example.com"));
        assert_eq!(uri.path(), "/stream.mp3");
        assert!(!uri.is_file());
        assert!(matches!(uri.to_file_path(), Err(Error::InvalidArgument(_))));

        let remote = Uri::parse("file://server/share/a.mp3").unwrap();
        assert!(remote.to_file_path().is_err());

        let local = Uri::parse("file://localhost/a.mp3").unwrap();
        assert_eq!(local.to_file_path().unwrap(), PathBuf::from("/a.mp3"));
    }

    #[test]
    fn test_serde_as_string() {
        let uri = Uri::from_file_path(Path::new("/a b.mp3")).unwrap();
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"file:///a%20b.mp3\"");
        let back: Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
        assert!(serde_json::from_str::<Uri>("\"not a uri\"").is_err());
    }
}
