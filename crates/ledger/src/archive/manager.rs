use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::NaiveDateTime;

use crate::api::{ArchiveOutcome, Category, RestoreOutcome, Scores};
use crate::archive::{ArchiveError, ArchiveKind, ArchiveRecord, RESET_SUBDIR, Result};
use crate::repository::CounterRepository;
use crate::utils::fs::write_atomic;

/// Writes archive files and restores the live stores from them.
///
/// Archives are immutable once written and never deleted by the ledger.
/// Writes go through a temp file and rename, so an existing archive of the
/// same name is replaced whole or not at all.
pub struct ArchiveManager {
    counters: Arc<dyn CounterRepository>,
    base_dir: PathBuf,
}

impl ArchiveManager {
    pub fn new(counters: Arc<dyn CounterRepository>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            counters,
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn reset_dir(&self) -> PathBuf {
        self.base_dir.join(RESET_SUBDIR)
    }

    /// Directories scanned by [`restore_latest_default`](Self::restore_latest_default).
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        vec![self.base_dir.clone(), self.reset_dir()]
    }

    /// Create the archive root and its `reset_score` subdirectory if missing.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in self.search_dirs() {
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| ArchiveError::io(&dir, e))?;
                tracing::info!("Created archive directory {}", dir.display());
            }
        }
        Ok(())
    }

    /// Full path an archive of `kind` captured at `now` would be written to.
    pub fn path_for(&self, kind: ArchiveKind, now: NaiveDateTime) -> PathBuf {
        kind.directory(&self.base_dir).join(kind.file_name(now))
    }

    pub fn exists(&self, kind: ArchiveKind, now: NaiveDateTime) -> bool {
        self.path_for(kind, now).exists()
    }

    /// Capture both stores and write them to `target_dir/file_name`.
    ///
    /// Creates `target_dir` recursively if needed.
    pub fn snapshot(
        &self,
        target_dir: &Path,
        file_name: &str,
        now: NaiveDateTime,
    ) -> Result<ArchiveRecord> {
        let record = ArchiveRecord::capture(self.counters.as_ref(), now);

        fs::create_dir_all(target_dir).map_err(|e| ArchiveError::io(target_dir, e))?;

        let path = target_dir.join(file_name);
        let json = serde_json::to_string_pretty(&record).map_err(ArchiveError::Encode)?;
        write_atomic(&path, json.as_bytes()).map_err(|e| ArchiveError::io(&path, e))?;

        tracing::info!(
            "Archived {} chocoblasted and {} blagueur entries to {}",
            record.chocoblasteds.len(),
            record.blagueurs.len(),
            path.display()
        );

        Ok(record)
    }

    /// Write an archive of the given kind using its deterministic name.
    pub fn archive(&self, kind: ArchiveKind, now: NaiveDateTime) -> Result<ArchiveOutcome> {
        let dir = kind.directory(&self.base_dir);
        let file_name = kind.file_name(now);
        self.snapshot(&dir, &file_name, now)?;

        Ok(ArchiveOutcome {
            kind,
            path: dir.join(file_name),
        })
    }

    /// Restore from the most recent archive across the default directories.
    pub fn restore_latest_default(&self) -> Result<RestoreOutcome> {
        self.restore_latest(&self.search_dirs())
    }

    /// Overwrite both live stores with the most recently modified archive
    /// found directly inside any of `search_dirs`.
    ///
    /// Nothing is written unless the selected archive holds both categories.
    pub fn restore_latest(&self, search_dirs: &[PathBuf]) -> Result<RestoreOutcome> {
        let path = latest_archive(search_dirs)?;
        let content = fs::read_to_string(&path).map_err(|e| ArchiveError::io(&path, e))?;
        let (archived_at, chocoblasteds, blagueurs) = parse_archive(&path, &content)?;

        self.replace_stores(&chocoblasteds, &blagueurs)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(
            "Restored {} chocoblasted and {} blagueur entries from {}",
            chocoblasteds.len(),
            blagueurs.len(),
            path.display()
        );

        Ok(RestoreOutcome {
            file_name,
            path,
            archived_at,
            chocoblasteds: chocoblasteds.len(),
            blagueurs: blagueurs.len(),
        })
    }

    /// Overwrite both stores. If the second save fails, the first store is
    /// put back to its previous content.
    fn replace_stores(&self, chocoblasteds: &Scores, blagueurs: &Scores) -> Result<()> {
        let previous = self.counters.load(Category::Chocoblasted);
        self.counters.save(Category::Chocoblasted, chocoblasteds)?;

        if let Err(e) = self.counters.save(Category::Blagueur, blagueurs) {
            if let Err(rollback) = self.counters.save(Category::Chocoblasted, &previous) {
                tracing::error!(
                    "Failed to roll back {} store after aborted restore: {}",
                    Category::Chocoblasted,
                    rollback
                );
            }
            return Err(e.into());
        }

        Ok(())
    }
}

/// Pick the `*.json` file with the newest modification time.
///
/// Directories that do not exist are skipped. Equal timestamps fall back to
/// the path so the choice is deterministic.
fn latest_archive(search_dirs: &[PathBuf]) -> Result<PathBuf> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for dir in search_dirs {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(ArchiveError::io(dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
            let path = entry.path();

            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| ArchiveError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            let modified = metadata
                .modified()
                .map_err(|e| ArchiveError::io(&path, e))?;

            let candidate = (modified, path);
            if latest.as_ref().is_none_or(|current| candidate > *current) {
                latest = Some(candidate);
            }
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| ArchiveError::NoArchiveFound {
            searched: search_dirs.to_vec(),
        })
}

type ParsedArchive = (Option<NaiveDateTime>, Scores, Scores);

fn parse_archive(path: &Path, content: &str) -> Result<ParsedArchive> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|source| ArchiveError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let corrupt = |reason: String| ArchiveError::CorruptArchive {
        path: path.to_path_buf(),
        reason,
    };

    let object = value
        .as_object()
        .ok_or_else(|| corrupt("top-level value is not an object".to_string()))?;

    let mut stores = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let field = object
            .get(category.as_ref())
            .ok_or_else(|| corrupt(format!("missing \"{}\"", category)))?;
        let scores: Scores = serde_json::from_value(field.clone())
            .map_err(|e| corrupt(format!("invalid \"{}\": {}", category, e)))?;
        stores.push(scores);
    }

    let archived_at = object
        .get("date_archive")
        .and_then(|value| serde_json::from_value(value.clone()).ok());

    let blagueurs = stores.pop().unwrap_or_default();
    let chocoblasteds = stores.pop().unwrap_or_default();

    Ok((archived_at, chocoblasteds, blagueurs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserId;
    use crate::repository::InMemoryCounterRepo;
    use chrono::NaiveDate;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(18, 5, 0)
            .unwrap()
    }

    fn scores(entries: &[(&str, u64)]) -> Scores {
        entries
            .iter()
            .map(|(id, score)| (UserId::new(*id), *score))
            .collect()
    }

    fn setup() -> (TempDir, Arc<InMemoryCounterRepo>, ArchiveManager) {
        let temp_dir = TempDir::new().unwrap();
        let counters = Arc::new(InMemoryCounterRepo::new());
        let manager = ArchiveManager::new(counters.clone(), temp_dir.path().join("archives"));
        (temp_dir, counters, manager)
    }

    fn write_archive(path: &Path, json: &str, age_secs: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_snapshot_creates_directory_and_file() {
        let (_temp, counters, manager) = setup();
        counters
            .save(Category::Chocoblasted, &scores(&[("a", 2)]))
            .unwrap();
        counters
            .save(Category::Blagueur, &scores(&[("b", 1), ("c", 4)]))
            .unwrap();

        let target = manager.base_dir().join("nested").join("deeper");
        assert!(!target.exists());

        let record = manager.snapshot(&target, "snap.json", now()).unwrap();

        let raw = fs::read_to_string(target.join("snap.json")).unwrap();
        let parsed: ArchiveRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.chocoblasteds, scores(&[("a", 2)]));
        assert_eq!(parsed.blagueurs, scores(&[("b", 1), ("c", 4)]));
        assert_eq!(parsed.date_archive, now());
    }

    #[test]
    fn test_archive_kinds_land_in_their_directories() {
        let (_temp, _counters, manager) = setup();

        let manual = manager.archive(ArchiveKind::Manual, now()).unwrap();
        let reset = manager.archive(ArchiveKind::PreReset, now()).unwrap();

        assert_eq!(
            manual.path,
            manager.base_dir().join("chocoblast_14_03_2025.json")
        );
        assert_eq!(
            reset.path,
            manager.reset_dir().join("sauv_mise_a_zero_2025_03_14.json")
        );
        assert!(manager.exists(ArchiveKind::Manual, now()));
        assert!(!manager.exists(ArchiveKind::Monthly, now()));
    }

    #[test]
    fn test_ensure_layout_creates_both_directories() {
        let (_temp, _counters, manager) = setup();

        manager.ensure_layout().unwrap();
        manager.ensure_layout().unwrap();

        assert!(manager.base_dir().is_dir());
        assert!(manager.reset_dir().is_dir());
    }

    #[test]
    fn test_restore_latest_picks_newest_modification() {
        let (_temp, counters, manager) = setup();
        let base = manager.base_dir().to_path_buf();

        write_archive(
            &base.join("chocoblast_01_2025-01.json"),
            r#"{"date_archive":"2025-01-01T00:00:00","chocoblasteds":{"old":1},"blagueurs":{}}"#,
            300,
        );
        write_archive(
            &manager.reset_dir().join("sauv_mise_a_zero_2025_02_10.json"),
            r#"{"date_archive":"2025-02-10T12:00:00.5","chocoblasteds":{"new":7},"blagueurs":{"x":2,"y":3}}"#,
            10,
        );
        write_archive(
            &base.join("chocoblast_05_02_2025.json"),
            r#"{"date_archive":"2025-02-05T00:00:00","chocoblasteds":{"mid":4},"blagueurs":{}}"#,
            100,
        );

        counters
            .save(Category::Chocoblasted, &scores(&[("live", 9)]))
            .unwrap();

        let outcome = manager.restore_latest_default().unwrap();

        assert_eq!(outcome.file_name, "sauv_mise_a_zero_2025_02_10.json");
        assert_eq!(outcome.chocoblasteds, 1);
        assert_eq!(outcome.blagueurs, 2);
        assert!(outcome.archived_at.is_some());
        assert_eq!(counters.load(Category::Chocoblasted), scores(&[("new", 7)]));
        assert_eq!(
            counters.load(Category::Blagueur),
            scores(&[("x", 2), ("y", 3)])
        );
    }

    #[test]
    fn test_restore_ignores_non_json_files() {
        let (_temp, counters, manager) = setup();
        let base = manager.base_dir().to_path_buf();

        write_archive(
            &base.join("chocoblast_01_2025-01.json"),
            r#"{"chocoblasteds":{"a":1},"blagueurs":{"b":1}}"#,
            100,
        );
        write_archive(&base.join("chocoblast_01_2025-02.json.tmp"), "{", 0);
        write_archive(&base.join("notes.txt"), "hello", 0);

        let outcome = manager.restore_latest_default().unwrap();
        assert_eq!(outcome.file_name, "chocoblast_01_2025-01.json");
        assert_eq!(counters.load(Category::Blagueur), scores(&[("b", 1)]));
    }

    #[test]
    fn test_restore_missing_field_is_corrupt_and_leaves_stores() {
        let (_temp, counters, manager) = setup();
        write_archive(
            &manager.base_dir().join("chocoblast_01_2025-01.json"),
            r#"{"date_archive":"2025-01-01T00:00:00","chocoblasteds":{"a":1}}"#,
            0,
        );

        let live = scores(&[("live", 3)]);
        counters.save(Category::Chocoblasted, &live).unwrap();
        counters.save(Category::Blagueur, &live).unwrap();

        let err = manager.restore_latest_default().unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptArchive { .. }));
        assert_eq!(counters.load(Category::Chocoblasted), live);
        assert_eq!(counters.load(Category::Blagueur), live);
    }

    #[test]
    fn test_restore_invalid_json_is_parse_failure() {
        let (_temp, counters, manager) = setup();
        write_archive(
            &manager.base_dir().join("chocoblast_01_2025-01.json"),
            "{\"chocoblasteds\": {",
            0,
        );

        let err = manager.restore_latest_default().unwrap_err();
        assert!(matches!(err, ArchiveError::Parse { .. }));
        assert!(counters.load(Category::Chocoblasted).is_empty());
    }

    #[test]
    fn test_restore_without_archives() {
        let (_temp, _counters, manager) = setup();

        let err = manager.restore_latest_default().unwrap_err();
        assert!(matches!(err, ArchiveError::NoArchiveFound { .. }));

        manager.ensure_layout().unwrap();
        let err = manager.restore_latest_default().unwrap_err();
        assert!(matches!(err, ArchiveError::NoArchiveFound { .. }));
    }

    /// Counter store whose blagueur saves always fail.
    struct BlagueurSaveFails(InMemoryCounterRepo);

    impl CounterRepository for BlagueurSaveFails {
        fn load(&self, category: Category) -> Scores {
            self.0.load(category)
        }

        fn save(&self, category: Category, scores: &Scores) -> crate::repository::Result<()> {
            match category {
                Category::Blagueur => Err(crate::repository::RepositoryError::LockPoisoned),
                Category::Chocoblasted => self.0.save(category, scores),
            }
        }
    }

    #[test]
    fn test_failed_restore_rolls_back_first_store() {
        let temp_dir = TempDir::new().unwrap();
        let inner = InMemoryCounterRepo::new();
        let live = scores(&[("live", 3)]);
        inner.save(Category::Chocoblasted, &live).unwrap();

        let counters = Arc::new(BlagueurSaveFails(inner));
        let manager = ArchiveManager::new(counters.clone(), temp_dir.path().join("archives"));
        write_archive(
            &manager.base_dir().join("chocoblast_01_2025-01.json"),
            r#"{"chocoblasteds":{"archived":8},"blagueurs":{"b":1}}"#,
            0,
        );

        let err = manager.restore_latest_default().unwrap_err();
        assert!(matches!(err, ArchiveError::Store(_)));
        assert_eq!(counters.load(Category::Chocoblasted), live);
    }
}
