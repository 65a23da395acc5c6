//! Typed errors for save/load operations.

use std::fmt;

use terrain::TerrainError;

/// Errors that can occur while saving or loading a map.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full).
    Io(std::io::Error),
    /// Bitcode encoding failed.
    Encode(String),
    /// Bitcode decoding or decompression failed.
    Decode(String),
    /// The file does not start with the save magic bytes.
    BadMagic,
    /// The file claims to carry a header but is shorter than one.
    HeaderTooShort { len: usize },
    /// The save was written by a newer build than this one.
    VersionMismatch { expected_max: u32, found: u32 },
    /// The payload does not hash to the checksum in the header.
    ChecksumMismatch { expected: u32, computed: u32 },
    /// The decoded state does not describe a well-formed grid.
    Restore(TerrainError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Encode(msg) => write!(f, "encoding error: {msg}"),
            SaveError::Decode(msg) => write!(f, "decoding error: {msg}"),
            SaveError::BadMagic => write!(f, "not a terrain save file (bad magic bytes)"),
            SaveError::HeaderTooShort { len } => {
                write!(f, "save file is truncated: {len} bytes is shorter than the header")
            }
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "save is format v{found}, but this build only reads up to v{expected_max}"
            ),
            SaveError::ChecksumMismatch { expected, computed } => write!(
                f,
                "save file is corrupted: checksum mismatch (expected {expected:#010X}, got {computed:#010X})"
            ),
            SaveError::Restore(e) => write!(f, "restored state is malformed: {e}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            SaveError::Restore(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

impl From<TerrainError> for SaveError {
    fn from(e: TerrainError) -> Self {
        SaveError::Restore(e)
    }
}
