//! Client-local persistence of the joined player's name, used for
//! auto-rejoin on restart and for detecting forced removal.

use std::io;
use std::path::Path;

/// The remembered player name, if any
pub(super) fn recall(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|contents| contents.trim().to_string())
        .filter(|name| !name.is_empty())
}

pub(super) fn remember(path: &Path, name: &str) -> io::Result<()> {
    std::fs::write(path, name)
}

/// Forget the remembered name. Missing file is fine.
pub(super) fn forget(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to clear remembered name: {}", e);
        }
    }
}
