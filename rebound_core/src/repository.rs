//! # Test Repository
//!
//! CRUD over [`TestRecord`]s with duplicate detection and a configurable
//! conflict policy, persisted as one serialized array under a single fixed
//! key of a [`KeyValueStore`].
//!
//! ## Failure model
//!
//! Reads fail open: an unavailable or corrupt store lists as empty (with a
//! warning) and individual malformed entries are dropped, never propagated.
//! Writes fail closed: the full array is rewritten atomically, so a failed
//! write leaves the previous state intact.
//!
//! ## Conflict flow
//!
//! ```rust
//! use rebound_core::curves::Orientation;
//! use rebound_core::record::TestRecord;
//! use rebound_core::repository::{SaveOutcome, TestRepository};
//! use rebound_core::store::MemoryStore;
//!
//! let mut repo = TestRepository::new(MemoryStore::new());
//!
//! let first = TestRecord::new("Plant A", "Column C3", Orientation::Horizontal, vec![30.0; 9]);
//! repo.save(first).unwrap();
//!
//! let second = TestRecord::new("Plant A", "Column C3", Orientation::Horizontal, vec![35.0; 9]);
//! match repo.save(second).unwrap() {
//!     SaveOutcome::Saved(record) => unreachable!("key is taken: {}", record.id),
//!     SaveOutcome::Conflict { existing, attempted } => {
//!         // caller chooses: overwrite, save_as a free location, or abort
//!         repo.overwrite(&existing.id, attempted).unwrap();
//!     }
//! }
//! ```

use log::warn;
use serde_json::Value;

use crate::errors::{CoreError, CoreResult};
use crate::record::TestRecord;
use crate::store::KeyValueStore;

/// Fixed store key holding the serialized record array
pub const STORAGE_KEY: &str = "rebound_test_records";

/// How `save` treats an existing record with the same (project, location).
///
/// Selected once at repository construction; the soft-key workflows across
/// the tool's revisions varied, so the choice is explicit rather than
/// ambient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Duplicate soft keys are allowed to coexist; save always appends.
    AllowDuplicates,

    /// A duplicate soft key is reported as a conflict for the caller to
    /// resolve (overwrite, rename, or abort). Nothing is written until the
    /// caller decides.
    #[default]
    PromptOverwriteOrRename,
}

/// Result of a successful `save` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The record was appended and persisted.
    Saved(TestRecord),

    /// A record already occupies the soft key; nothing was written. The
    /// caller resolves with [`TestRepository::overwrite`] or
    /// [`TestRepository::save_as`], or abandons the save.
    Conflict {
        existing: TestRecord,
        attempted: TestRecord,
    },
}

/// Repository of test records over a key-value store.
pub struct TestRepository<S: KeyValueStore> {
    store: S,
    policy: ConflictPolicy,
}

impl<S: KeyValueStore> TestRepository<S> {
    /// Create a repository with the default conflict policy
    /// ([`ConflictPolicy::PromptOverwriteOrRename`]).
    pub fn new(store: S) -> Self {
        TestRepository {
            store,
            policy: ConflictPolicy::default(),
        }
    }

    /// Create a repository with an explicit conflict policy.
    pub fn with_policy(store: S, policy: ConflictPolicy) -> Self {
        TestRepository { store, policy }
    }

    /// The active conflict policy.
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// All records. Store unavailable or corrupt reads as an empty list;
    /// malformed entries are dropped individually.
    pub fn list(&self) -> Vec<TestRecord> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("record store unreadable, treating as empty: {e}");
                return Vec::new();
            }
        };

        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("record store corrupt, treating as empty: {e}");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(values.len());
        for value in &values {
            match TestRecord::from_stored(value) {
                Some(record) => records.push(record),
                None => warn!("dropping unusable stored record entry"),
            }
        }
        records
    }

    /// Save a new record.
    ///
    /// Under [`ConflictPolicy::PromptOverwriteOrRename`], an existing record
    /// on the same soft key yields [`SaveOutcome::Conflict`] without
    /// mutating anything.
    pub fn save(&mut self, record: TestRecord) -> CoreResult<SaveOutcome> {
        record.validate_for_save()?;

        let mut records = self.list();

        if self.policy == ConflictPolicy::PromptOverwriteOrRename {
            let occupied: Vec<&TestRecord> = records
                .iter()
                .filter(|r| r.matches_key(&record.project, &record.location))
                .collect();
            if let Some(existing) = occupied.first() {
                return Ok(SaveOutcome::Conflict {
                    existing: (*existing).clone(),
                    attempted: record,
                });
            }
        }

        records.push(record.clone());
        self.persist(&records)?;
        Ok(SaveOutcome::Saved(record))
    }

    /// Resolve a conflict by replacing the fields of the record with the
    /// given id. Identity is preserved; every other field comes from
    /// `replacement`.
    pub fn overwrite(&mut self, id: &str, replacement: TestRecord) -> CoreResult<TestRecord> {
        replacement.validate_for_save()?;

        let mut records = self.list();
        let slot = records.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            CoreError::RecordNotFound {
                criteria: format!("id '{id}'"),
            }
        })?;

        let mut replacement = replacement;
        replacement.id = slot.id.clone();
        *slot = replacement.clone();

        self.persist(&records)?;
        Ok(replacement)
    }

    /// Resolve a conflict by saving under a different location. Rejects with
    /// [`CoreError::DuplicateRecord`] when the new soft key is itself taken.
    pub fn save_as(
        &mut self,
        mut record: TestRecord,
        new_location: &str,
    ) -> CoreResult<TestRecord> {
        record.relocate(record.project.clone(), new_location);
        record.validate_for_save()?;

        let mut records = self.list();
        if records
            .iter()
            .any(|r| r.matches_key(&record.project, &record.location))
        {
            return Err(CoreError::duplicate_record(
                record.project.clone(),
                record.location.clone(),
            ));
        }

        records.push(record.clone());
        self.persist(&records)?;
        Ok(record)
    }

    /// Delete the single record matching the criteria (project and/or
    /// location). More than one match refuses the delete; zero matches
    /// deletes nothing. Returns the removed record.
    pub fn delete(
        &mut self,
        project: Option<&str>,
        location: Option<&str>,
    ) -> CoreResult<TestRecord> {
        if project.is_none() && location.is_none() {
            return Err(CoreError::missing_field("project or location"));
        }

        let records = self.list();
        let matches: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                project.map_or(true, |p| r.project == p)
                    && location.map_or(true, |l| r.location == l)
            })
            .map(|(i, _)| i)
            .collect();

        match matches.len() {
            0 => Err(CoreError::RecordNotFound {
                criteria: criteria_string(project, location),
            }),
            1 => {
                let mut records = records;
                let removed = records.remove(matches[0]);
                self.persist(&records)?;
                Ok(removed)
            }
            n => Err(CoreError::AmbiguousDelete { matches: n }),
        }
    }

    /// The record occupying a soft key, but only when it is unambiguous:
    /// exactly one match returns `Some`, zero or multiple return `None`.
    /// Drives the auto-load-on-match behavior of the form front-end.
    pub fn find_exact(&self, project: &str, location: &str) -> Option<TestRecord> {
        let mut matches = self
            .list()
            .into_iter()
            .filter(|r| r.matches_key(project, location));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Some(record),
            _ => None,
        }
    }

    /// Sorted, deduplicated project names.
    pub fn projects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.list().into_iter().map(|r| r.project).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Records of one project, sorted by location.
    pub fn by_project(&self, project: &str) -> Vec<TestRecord> {
        let mut records: Vec<TestRecord> = self
            .list()
            .into_iter()
            .filter(|r| r.project == project)
            .collect();
        records.sort_by(|a, b| a.location.cmp(&b.location));
        records
    }

    fn persist(&mut self, records: &[TestRecord]) -> CoreResult<()> {
        let json =
            serde_json::to_string(records).map_err(|e| CoreError::SerializationError {
                reason: e.to_string(),
            })?;
        self.store.set(STORAGE_KEY, &json)
    }
}

fn criteria_string(project: Option<&str>, location: Option<&str>) -> String {
    match (project, location) {
        (Some(p), Some(l)) => format!("project '{p}', location '{l}'"),
        (Some(p), None) => format!("project '{p}'"),
        (None, Some(l)) => format!("location '{l}'"),
        (None, None) => "no criteria".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::Orientation;
    use crate::store::MemoryStore;

    fn record(project: &str, location: &str) -> TestRecord {
        TestRecord::new(project, location, Orientation::Horizontal, vec![30.0; 9])
    }

    fn repo() -> TestRepository<MemoryStore> {
        TestRepository::new(MemoryStore::new())
    }

    #[test]
    fn test_save_then_list() {
        let mut repo = repo();
        let saved = match repo.save(record("Plant A", "Column C3")).unwrap() {
            SaveOutcome::Saved(r) => r,
            other => panic!("unexpected outcome: {other:?}"),
        };

        let listed = repo.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, saved.id);
        assert!(!listed[0].id.is_empty());
    }

    #[test]
    fn test_save_conflict_does_not_mutate() {
        let mut repo = repo();
        repo.save(record("Plant A", "Column C3")).unwrap();

        let outcome = repo.save(record("Plant A", "Column C3")).unwrap();
        match outcome {
            SaveOutcome::Conflict { existing, attempted } => {
                assert_eq!(existing.project, "Plant A");
                assert_eq!(attempted.project, "Plant A");
            }
            SaveOutcome::Saved(_) => panic!("expected conflict"),
        }
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn test_allow_duplicates_policy_appends() {
        let mut repo =
            TestRepository::with_policy(MemoryStore::new(), ConflictPolicy::AllowDuplicates);
        repo.save(record("Plant A", "Column C3")).unwrap();
        let outcome = repo.save(record("Plant A", "Column C3")).unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(_)));
        assert_eq!(repo.list().len(), 2);
    }

    #[test]
    fn test_overwrite_preserves_id() {
        let mut repo = repo();
        let original = match repo.save(record("Plant A", "Column C3")).unwrap() {
            SaveOutcome::Saved(r) => r,
            _ => unreachable!(),
        };

        let mut replacement = record("Plant A", "Column C3");
        replacement.r_values = vec![40.0; 10];
        let overwritten = repo.overwrite(&original.id, replacement).unwrap();

        assert_eq!(overwritten.id, original.id);
        let listed = repo.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].r_values, vec![40.0; 10]);
    }

    #[test]
    fn test_overwrite_unknown_id() {
        let mut repo = repo();
        let err = repo
            .overwrite("no-such-id", record("Plant A", "Column C3"))
            .unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
    }

    #[test]
    fn test_save_as_rejects_taken_location() {
        let mut repo = repo();
        repo.save(record("Plant A", "Column C3")).unwrap();
        repo.save(record("Plant A", "Column C4")).unwrap();

        let err = repo
            .save_as(record("Plant A", "anything"), "Column C4")
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_RECORD");

        let saved = repo
            .save_as(record("Plant A", "anything"), "Column C5")
            .unwrap();
        assert_eq!(saved.location, "Column C5");
        assert_eq!(saved.display_name, "Plant A - Column C5");
        assert_eq!(repo.list().len(), 3);
    }

    #[test]
    fn test_delete_exactly_one() {
        let mut repo = repo();
        repo.save(record("Plant A", "Column C3")).unwrap();
        repo.save(record("Plant A", "Column C4")).unwrap();

        let removed = repo.delete(Some("Plant A"), Some("Column C3")).unwrap();
        assert_eq!(removed.location, "Column C3");

        let listed = repo.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].location, "Column C4");
    }

    #[test]
    fn test_delete_ambiguous_refused() {
        let mut repo = repo();
        repo.save(record("Plant A", "Column C3")).unwrap();
        repo.save(record("Plant A", "Column C4")).unwrap();

        let err = repo.delete(Some("Plant A"), None).unwrap_err();
        assert_eq!(err, CoreError::AmbiguousDelete { matches: 2 });
        assert_eq!(repo.list().len(), 2);
    }

    #[test]
    fn test_delete_zero_matches_mutates_nothing() {
        let mut repo = repo();
        repo.save(record("Plant A", "Column C3")).unwrap();

        let err = repo.delete(Some("Plant B"), None).unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
        assert_eq!(repo.list().len(), 1);

        let err = repo.delete(None, None).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_find_exact_requires_single_match() {
        let mut repo =
            TestRepository::with_policy(MemoryStore::new(), ConflictPolicy::AllowDuplicates);
        assert!(repo.find_exact("Plant A", "Column C3").is_none());

        repo.save(record("Plant A", "Column C3")).unwrap();
        assert!(repo.find_exact("Plant A", "Column C3").is_some());

        repo.save(record("Plant A", "Column C3")).unwrap();
        assert!(repo.find_exact("Plant A", "Column C3").is_none());
    }

    #[test]
    fn test_corrupt_store_lists_empty() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "definitely not json").unwrap();
        let repo = TestRepository::new(store);
        assert!(repo.list().is_empty());
    }

    #[test]
    fn test_malformed_entries_dropped_individually() {
        let mut store = MemoryStore::new();
        let good = record("Plant A", "Column C3");
        let raw = format!(
            "[{}, {{\"bogus\": true}}, 42]",
            serde_json::to_string(&good).unwrap()
        );
        store.set(STORAGE_KEY, &raw).unwrap();

        let repo = TestRepository::new(store);
        let listed = repo.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good.id);
    }

    #[test]
    fn test_file_backed_repository_fails_open() {
        use crate::store::FileStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "garbage, not a store").unwrap();

        let mut repo = TestRepository::new(FileStore::new(&path));
        assert!(repo.list().is_empty());

        // Writes recover the store
        repo.save(record("Plant A", "Column C3")).unwrap();
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn test_validation_rejects_before_touching_store() {
        let mut repo = repo();
        let err = repo.save(record("", "Column C3")).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
        assert!(repo.list().is_empty());
    }

    #[test]
    fn test_sorted_grouping_helpers() {
        let mut repo = repo();
        repo.save(record("Plant B", "L2")).unwrap();
        repo.save(record("Plant A", "L9")).unwrap();
        repo.save(record("Plant A", "L1")).unwrap();

        assert_eq!(repo.projects(), vec!["Plant A", "Plant B"]);
        let grouped = repo.by_project("Plant A");
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].location, "L1");
        assert_eq!(grouped[1].location, "L9");
    }
}
