//! Value types shared between the ledger and its callers.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveKind;

/// Opaque user identifier supplied by the chat platform.
///
/// The ledger never interprets the contents; it only needs the value to be
/// stable across sessions so counters keep accumulating.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Leaderboard category.
///
/// Exactly two counter stores exist: one for users who were chocoblasted and
/// one for the authors of the joke.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    /// Users credited as having been pranked.
    #[strum(serialize = "chocoblasteds")]
    Chocoblasted,
    /// Users credited as authors of a prank.
    #[strum(serialize = "blagueurs")]
    Blagueur,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Chocoblasted, Category::Blagueur];

    /// File name of the durable store backing this category.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_ref())
    }
}

/// Per-category score mapping. Absence of a key means a score of zero.
pub type Scores = BTreeMap<UserId, u64>;

/// Result of an accepted scoring transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// User credited as chocoblasted.
    pub credited: UserId,
    /// New chocoblasted total of `credited`.
    pub credited_total: u64,
    /// Co-actors credited as blagueurs, de-duplicated, in invocation order.
    pub co_actors: Vec<UserId>,
}

/// Result of writing an archive file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub kind: ArchiveKind,
    pub path: PathBuf,
}

impl ArchiveOutcome {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of restoring the live stores from an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub archived_at: Option<NaiveDateTime>,
    /// Number of users restored into the chocoblasted store.
    pub chocoblasteds: usize,
    /// Number of users restored into the blagueur store.
    pub blagueurs: usize,
}

/// Result of one scheduled monthly check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonthlyOutcome {
    /// Today is not the first day of the month.
    NotDue,
    /// This month's archive already exists.
    AlreadyArchived(PathBuf),
    /// This month's archive was written by this check.
    Archived(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Chocoblasted.to_string(), "chocoblasteds");
        assert_eq!(Category::Blagueur.file_name(), "blagueurs.json");
        assert_eq!(
            Category::from_str("Blagueurs").unwrap(),
            Category::Blagueur
        );
        assert!(Category::from_str("croissants").is_err());
    }

    #[test]
    fn test_user_id_serializes_transparently() {
        let mut scores = Scores::new();
        scores.insert(UserId::new("42"), 3);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"42":3}"#);
    }
}
