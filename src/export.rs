// Local download: write the flattened PNG under a file name.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Default name for a downloaded sketch.
pub const DEFAULT_FILE_NAME: &str = "image.png";

/// Save `bytes` to `path`, creating parent directories as needed.
pub fn save_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    log::info!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
