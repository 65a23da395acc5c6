//! Persistence for terrain grids.
//!
//! A save file is a 28-byte header (magic, version, flags, checksum) followed
//! by a bitcode-encoded, lz4-compressed [`save_state::CitySaveState`]. Writes
//! go through a write-rename so an interrupted save never destroys the
//! previous file.

pub mod atomic_write;
pub mod codec;
pub mod file_header;
pub mod save_error;
pub mod save_state;

pub use codec::{decode_save, encode_save, load_from_file, save_to_file};
pub use save_error::SaveError;
pub use save_state::{CitySaveState, TerrainSaveState, CURRENT_SAVE_VERSION};
