//! File-based CounterRepository implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::api::{Category, Scores, UserId};
use crate::repository::{CounterRepository, RepositoryError, Result};
use crate::utils::fs::write_atomic;

/// File-based implementation of CounterRepository.
///
/// Stores each category as a flat JSON object in `<data_dir>/<category>.json`:
///
/// ```text
/// { "<user_id>": <score>, ... }
/// ```
pub struct FileCounterRepository {
    data_dir: PathBuf,
}

impl FileCounterRepository {
    /// Create a new file-based counter repository rooted at `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Get the path to a category's store.
    pub fn store_path(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.file_name())
    }
}

impl CounterRepository for FileCounterRepository {
    fn load(&self, category: Category) -> Scores {
        let path = self.store_path(category);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Scores::new(),
            Err(e) => {
                tracing::warn!(
                    "Unreadable {} store at {}, treating as empty: {}",
                    category,
                    path.display(),
                    e
                );
                return Scores::new();
            }
        };

        let entries = match serde_json::from_str::<serde_json::Value>(&json) {
            Ok(serde_json::Value::Object(entries)) => entries,
            Ok(_) => {
                tracing::warn!(
                    "Corrupt {} store at {} (not an object), treating as empty; the next save overwrites it",
                    category,
                    path.display()
                );
                return Scores::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Corrupt {} store at {}, treating as empty; the next save overwrites it: {}",
                    category,
                    path.display(),
                    e
                );
                return Scores::new();
            }
        };

        let total = entries.len();
        let scores: Scores = entries
            .into_iter()
            .filter_map(|(user, score)| Some((UserId::new(user), score.as_u64()?)))
            .collect();

        if scores.len() < total {
            tracing::warn!(
                "Dropped {} invalid entries from {} store at {}; the next save removes them",
                total - scores.len(),
                category,
                path.display()
            );
        }

        scores
    }

    fn save(&self, category: Category, scores: &Scores) -> Result<()> {
        let path = self.store_path(category);

        let json = serde_json::to_string_pretty(scores)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;
        write_atomic(&path, json.as_bytes())?;

        tracing::debug!(
            "Saved {} store ({} entries) to {}",
            category,
            scores.len(),
            path.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserId;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileCounterRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCounterRepository::new(temp_dir.path()).unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_save_and_load() {
        let (_temp, repo) = setup();

        let mut scores = Scores::new();
        scores.insert(UserId::new("111"), 4);
        scores.insert(UserId::new("222"), 0);
        repo.save(Category::Chocoblasted, &scores).unwrap();

        assert_eq!(repo.load(Category::Chocoblasted), scores);
        assert!(repo.load(Category::Blagueur).is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_temp, repo) = setup();
        assert!(repo.load(Category::Blagueur).is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let (_temp, repo) = setup();

        fs::write(repo.store_path(Category::Blagueur), "{ not json").unwrap();
        assert!(repo.load(Category::Blagueur).is_empty());

        fs::write(repo.store_path(Category::Blagueur), "[1, 2]").unwrap();
        assert!(repo.load(Category::Blagueur).is_empty());
    }

    #[test]
    fn test_invalid_entries_do_not_erase_valid_scores() {
        let (_temp, repo) = setup();

        fs::write(
            repo.store_path(Category::Blagueur),
            r#"{"1": -3, "2": 4, "3": "five", "4": 1.5, "5": 0}"#,
        )
        .unwrap();

        let scores = repo.load(Category::Blagueur);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&UserId::new("2")], 4);
        assert_eq!(scores[&UserId::new("5")], 0);

        // A later write keeps the surviving scores.
        repo.increment(Category::Blagueur, &UserId::new("6"), 1)
            .unwrap();
        let raw = fs::read_to_string(repo.store_path(Category::Blagueur)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "2": 4, "5": 0, "6": 1 }));
    }

    #[test]
    fn test_file_format_is_flat_object() {
        let (_temp, repo) = setup();

        repo.increment(Category::Blagueur, &UserId::new("42"), 2)
            .unwrap();

        let raw = fs::read_to_string(repo.store_path(Category::Blagueur)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "42": 2 }));
    }

    #[test]
    fn test_increment_accumulates() {
        let (_temp, repo) = setup();
        let user = UserId::new("7");

        for _ in 0..5 {
            repo.increment(Category::Chocoblasted, &user, 1).unwrap();
        }

        assert_eq!(repo.load(Category::Chocoblasted)[&user], 5);
    }

    #[test]
    fn test_decrement_never_goes_negative() {
        let (_temp, repo) = setup();
        let user = UserId::new("7");

        repo.increment(Category::Blagueur, &user, 2).unwrap();
        assert_eq!(repo.increment(Category::Blagueur, &user, -10).unwrap(), 0);
        assert_eq!(repo.increment(Category::Blagueur, &user, -1).unwrap(), 0);

        let fresh = UserId::new("8");
        assert_eq!(repo.increment(Category::Blagueur, &fresh, -1).unwrap(), 0);
    }

    #[test]
    fn test_top_sorted_and_truncated() {
        let (_temp, repo) = setup();

        let mut scores = Scores::new();
        for (id, score) in [("a", 3), ("b", 9), ("c", 1), ("d", 9), ("e", 5)] {
            scores.insert(UserId::new(id), score);
        }
        repo.save(Category::Chocoblasted, &scores).unwrap();

        let top = repo.top(Category::Chocoblasted, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(top[0], (UserId::new("b"), 9));
        assert_eq!(top[1], (UserId::new("d"), 9));
        assert_eq!(top[2], (UserId::new("e"), 5));

        assert_eq!(repo.top(Category::Chocoblasted, 50).len(), 5);
    }
}
