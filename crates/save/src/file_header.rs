//! Save file header with magic bytes, version, flags, and checksum.
//!
//! Header layout (28 bytes, fixed-size, little-endian):
//!   [0..4]   Magic bytes: "TGRD"
//!   [4..8]   Header format version (u32)
//!   [8..12]  Flags (u32: bit 0 = lz4 compressed payload)
//!   [12..20] Timestamp (Unix epoch seconds, u64)
//!   [20..24] Uncompressed payload size (u32)
//!   [24..28] xxHash32 checksum of the payload (everything after the header)
//!
//! The checksum covers the payload exactly as stored, so corruption is
//! detected before any decompression or decoding is attempted.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a terrain grid save file.
pub const MAGIC: [u8; 4] = *b"TGRD";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Current header layout version, distinct from the payload schema version.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Flag bit: the payload is lz4 compressed with a prepended size.
pub const FLAG_COMPRESSED: u32 = 1;

const XXHASH_SEED: u32 = 0;

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Prepends a header to an encoded payload.
///
/// `uncompressed_size` is the payload's size before compression; it equals
/// `payload.len()` when the compressed flag is unset.
pub fn wrap_with_header(payload: &[u8], flags: u32, uncompressed_size: u32) -> Vec<u8> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parses and validates the header, returning it and the payload bytes.
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::HeaderTooShort { len: bytes.len() });
    }

    let format_version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let flags = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let timestamp = u64::from_le_bytes([
        bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
    ]);
    let uncompressed_size = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    let checksum = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

    if format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: checksum,
            computed,
        });
    }

    Ok((
        FileHeader {
            format_version,
            flags,
            timestamp,
            uncompressed_size,
            checksum,
        },
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_unwrap_round_trip() {
        let data = b"terrain payload bytes";
        let wrapped = wrap_with_header(data, FLAG_COMPRESSED, 999);

        assert_eq!(&wrapped[..4], &MAGIC);
        assert_eq!(wrapped.len(), HEADER_SIZE + data.len());

        let (header, payload) = unwrap_header(&wrapped).unwrap();
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert!(header.is_compressed());
        assert_eq!(header.uncompressed_size, 999);
        assert_eq!(payload, data);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let err = unwrap_header(b"\x00\x01\x02\x03rest of the file").unwrap_err();
        assert!(matches!(err, SaveError::BadMagic));
        assert!(matches!(unwrap_header(b""), Err(SaveError::BadMagic)));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let err = unwrap_header(b"TGRD\x01\x00").unwrap_err();
        assert!(matches!(err, SaveError::HeaderTooShort { len: 6 }));
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut wrapped = wrap_with_header(b"test payload", 0, 12);
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;

        let err = unwrap_header(&wrapped).unwrap_err();
        assert!(matches!(err, SaveError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_future_header_version_rejected() {
        let mut wrapped = wrap_with_header(b"test payload", 0, 12);
        wrapped[4..8].copy_from_slice(&999u32.to_le_bytes());

        let err = unwrap_header(&wrapped).unwrap_err();
        assert!(matches!(
            err,
            SaveError::VersionMismatch {
                expected_max: HEADER_FORMAT_VERSION,
                found: 999,
            }
        ));
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let wrapped = wrap_with_header(b"", 0, 0);
        assert_eq!(wrapped.len(), HEADER_SIZE);
        let (header, payload) = unwrap_header(&wrapped).unwrap();
        assert!(!header.is_compressed());
        assert!(payload.is_empty());
    }
}
