//! Archive manager: timestamped snapshots of both counter stores.
//!
//! # Directory Structure
//!
//! ```text
//! {archive_dir}/
//!   ├── chocoblast_01_2025-03.json      # monthly (scheduler)
//!   ├── chocoblast_14_03_2025.json      # manual
//!   └── reset_score/
//!       └── sauv_mise_a_zero_2025_03_20.json
//! ```

mod error;
mod manager;
mod naming;
mod record;

pub use error::{ArchiveError, Result};
pub use manager::ArchiveManager;
pub use naming::{ArchiveKind, RESET_SUBDIR};
pub use record::ArchiveRecord;
