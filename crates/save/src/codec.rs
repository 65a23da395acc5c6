//! Encoding pipeline: bitcode, lz4, header, disk.

use std::path::Path;

use bevy::prelude::*;

use terrain::city::CityGrid;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_header, wrap_with_header, FLAG_COMPRESSED};
use crate::save_error::SaveError;
use crate::save_state::{CitySaveState, CURRENT_SAVE_VERSION};

/// Encodes a snapshot to framed bytes: bitcode, then lz4, then the header.
pub fn encode_save(state: &CitySaveState) -> Vec<u8> {
    let encoded = bitcode::encode(state);
    let compressed = lz4_flex::compress_prepend_size(&encoded);
    debug!(
        "encoded save: {} bytes raw, {} bytes compressed",
        encoded.len(),
        compressed.len()
    );
    wrap_with_header(&compressed, FLAG_COMPRESSED, encoded.len() as u32)
}

/// Decodes framed bytes back to a snapshot, validating the header checksum
/// and the payload schema version.
pub fn decode_save(bytes: &[u8]) -> Result<CitySaveState, SaveError> {
    let (header, payload) = unwrap_header(bytes)?;

    let encoded = if header.is_compressed() {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| SaveError::Decode(e.to_string()))?
    } else {
        payload.to_vec()
    };

    let state: CitySaveState = bitcode::decode(&encoded)?;
    if state.version > CURRENT_SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: CURRENT_SAVE_VERSION,
            found: state.version,
        });
    }
    Ok(state)
}

/// Snapshots the grid and writes it to `path` atomically.
pub fn save_to_file(city: &CityGrid, path: &Path) -> Result<(), SaveError> {
    let state = CitySaveState::capture(city);
    let bytes = encode_save(&state);
    atomic_write(path, &bytes)?;
    info!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Reads, decodes, and rebuilds a grid from `path`.
pub fn load_from_file(path: &Path) -> Result<CityGrid, SaveError> {
    let bytes = std::fs::read(path)?;
    let state = decode_save(&bytes)?;
    let city = CityGrid::restore(state.into_restore())?;
    info!(
        "loaded {}x{} map from {}",
        city.count_x(),
        city.count_z(),
        path.display()
    );
    Ok(city)
}
