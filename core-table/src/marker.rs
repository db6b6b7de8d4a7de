//! `[sound:<filename>]` cell markers.
//!
//! Anki resolves the filename against its media folder, so the marker text
//! must survive a load/save cycle byte for byte.

use std::fmt;

const PREFIX: &str = "[sound:";
const SUFFIX: &str = "]";

/// Reference from a cell to an audio asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SoundMarker {
    filename: String,
}

impl SoundMarker {
    /// Returns `None` for filenames that would break the marker syntax.
    pub fn new(filename: impl Into<String>) -> Option<Self> {
        let filename = filename.into();
        if filename.is_empty() || filename.contains(']') || filename.contains('\n') {
            return None;
        }
        Some(Self { filename })
    }

    /// Parses a whole cell. Surrounding text is not allowed; the filename is
    /// kept exactly as written.
    pub fn parse(cell: &str) -> Option<Self> {
        let filename = cell.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        Self::new(filename)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn into_filename(self) -> String {
        self.filename
    }
}

impl fmt::Display for SoundMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", PREFIX, self.filename, SUFFIX)
    }
}
