//! Platform-specific directories.
use std::path::PathBuf;

/// Log directory for the bot.
///
/// - macOS: `~/Library/Caches/chocoblast/logs`
/// - Linux: `~/.cache/chocoblast/logs` (or `$XDG_CACHE_HOME/chocoblast/logs`)
/// - Windows: `%LOCALAPPDATA%\chocoblast\cache\logs`
/// - Fallback: `/tmp/chocoblast/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "chocoblast")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/chocoblast"))
        .join("logs")
}
