//! Utilities for applications that persist their pacing settings between runs. Feature-gated.

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use bincode::{Decode, Encode};
use log::warn;

use crate::types::PacingSettings;

/// Save to file, using Bincode. We use this for preference files.
pub fn save<T: Encode>(path: &Path, data: &T) -> io::Result<()> {
    let config = bincode::config::standard();

    let encoded: Vec<u8> = bincode::encode_to_vec(data, config).map_err(io::Error::other)?;

    let mut file = File::create(path)?;
    file.write_all(&encoded)?;
    Ok(())
}

/// Load from file, using Bincode. We use this for preference files.
pub fn load<T: Decode<()>>(path: &Path) -> io::Result<T> {
    let config = bincode::config::standard();

    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let (decoded, _len) = bincode::decode_from_slice(&buffer, config).map_err(|e| {
        warn!("Error loading from {}. Did the format change? {e}", path.display());
        io::Error::other(e)
    })?;
    Ok(decoded)
}

/// Load pacing settings, falling back to defaults if the file is missing or unreadable.
pub fn load_pacing_or_default(path: &Path) -> PacingSettings {
    match load(path) {
        Ok(s) => s,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Unable to load pacing settings; using defaults: {e}");
            }
            PacingSettings::default()
        }
    }
}
