//! Atomic file writes.

use std::io::{self, Write};
use std::path::Path;

/// Write `bytes` to a uniquely named temp file next to `path`, fsync it, then
/// rename over `path`. The rename is the commit point.
///
/// Temp names are `.<random>.tmp`, so concurrent writers to the same target
/// never share a temp file and never look like `*.json` archives. The temp
/// file is removed if any step fails.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp_file = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp_file.write_all(bytes)?;
    tmp_file.as_file().sync_all()?;
    tmp_file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
