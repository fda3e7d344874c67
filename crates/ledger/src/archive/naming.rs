//! Deterministic archive file names.
//!
//! Names are derived from the capture date only, so re-running the same kind
//! of archive within its period targets the same file. The scheduler relies
//! on this to detect "already archived this month".

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Subdirectory of the archive root that holds pre-reset archives.
pub const RESET_SUBDIR: &str = "reset_score";

/// Flavor of archive, which decides its file name and directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ArchiveKind {
    /// Written by the scheduler on the first day of a month.
    Monthly,
    /// Requested by an administrator.
    Manual,
    /// Written right before the live stores are reset.
    PreReset,
}

impl ArchiveKind {
    /// File name for an archive of this kind captured at `now`.
    ///
    /// - Monthly: `chocoblast_01_<YYYY-MM>.json`
    /// - Manual: `chocoblast_<DD_MM_YYYY>.json`
    /// - PreReset: `sauv_mise_a_zero_<YYYY_MM_DD>.json`
    pub fn file_name(self, now: NaiveDateTime) -> String {
        match self {
            Self::Monthly => format!("chocoblast_01_{}.json", now.format("%Y-%m")),
            Self::Manual => format!("chocoblast_{}.json", now.format("%d_%m_%Y")),
            Self::PreReset => format!("sauv_mise_a_zero_{}.json", now.format("%Y_%m_%d")),
        }
    }

    /// Directory, relative to the archive root, that receives this kind.
    pub fn directory(self, base_dir: &Path) -> PathBuf {
        match self {
            Self::Monthly | Self::Manual => base_dir.to_path_buf(),
            Self::PreReset => base_dir.join(RESET_SUBDIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        let now = at(2025, 3, 7);
        assert_eq!(ArchiveKind::Monthly.file_name(now), "chocoblast_01_2025-03.json");
        assert_eq!(ArchiveKind::Manual.file_name(now), "chocoblast_07_03_2025.json");
        assert_eq!(
            ArchiveKind::PreReset.file_name(now),
            "sauv_mise_a_zero_2025_03_07.json"
        );
    }

    #[test]
    fn test_monthly_name_is_stable_within_month() {
        assert_eq!(
            ArchiveKind::Monthly.file_name(at(2025, 11, 1)),
            ArchiveKind::Monthly.file_name(at(2025, 11, 30))
        );
    }

    #[test]
    fn test_directories() {
        let base = Path::new("archives_chocoblast");
        assert_eq!(ArchiveKind::Manual.directory(base), base);
        assert_eq!(
            ArchiveKind::PreReset.directory(base),
            base.join("reset_score")
        );
    }
}
