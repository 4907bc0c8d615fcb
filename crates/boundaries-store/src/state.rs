//! Recording a completed update: staging files and bumping `last_updated`.

use std::path::PathBuf;

use boundaries_core::Entry;
use boundaries_core::document::update_last_updated;
use chrono::NaiveDate;
use tracing::info;

use crate::StoreError;
use crate::vcs::VersionControl;

pub struct StateUpdater<'a, V: VersionControl> {
    vcs: &'a V,
}

impl<'a, V: VersionControl> StateUpdater<'a, V> {
    pub fn new(vcs: &'a V) -> Self {
        Self { vcs }
    }

    /// Stage the deletions made while cleaning a directory.
    pub fn stage_removals(&self, removed: &[PathBuf]) -> Result<(), StoreError> {
        self.vcs.remove(removed)
    }

    /// Stage the normalized files, set `last_updated` to `modified` and
    /// return the definition's notes for the operator.
    pub fn record<'e>(
        &self,
        entry: &'e Entry,
        files: &[PathBuf],
        modified: NaiveDate,
    ) -> Result<Option<&'e str>, StoreError> {
        self.vcs.add(files)?;
        update_last_updated(&entry.file, modified)?;
        info!(slug = %entry.slug, last_updated = %modified, files = files.len(), "recorded update");
        Ok(entry
            .definition
            .notes
            .as_deref()
            .filter(|notes| !notes.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundaries_core::registry::load_entry;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingIndex {
        added: RefCell<Vec<PathBuf>>,
        removed: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl VersionControl for RecordingIndex {
        fn add(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Spawn {
                    program: "git".into(),
                    source: std::io::Error::other("no git"),
                });
            }
            self.added.borrow_mut().extend_from_slice(paths);
            Ok(())
        }

        fn remove(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
            self.removed.borrow_mut().extend_from_slice(paths);
            Ok(())
        }
    }

    const FREDERICTON: &str = r#"name = "Fredericton wards"
domain = "Fredericton, NB"
last_updated = 2012-05-14 # as published
notes = "Ward 12 boundary was corrected by hand."

[metadata]
geographic_code = "1310032"
"#;

    fn entry(dir: &Path) -> Entry {
        let file = dir.join("definition.toml");
        fs::write(&file, FREDERICTON).unwrap();
        load_entry(&file).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_stages_files_and_bumps_date() {
        let tmp = TempDir::new().unwrap();
        let entry = entry(tmp.path());
        let files = vec![tmp.path().join("wards.shp"), tmp.path().join("wards.dbf")];

        let index = RecordingIndex::default();
        let notes = StateUpdater::new(&index)
            .record(&entry, &files, date(2013, 11, 26))
            .unwrap();

        assert_eq!(notes, Some("Ward 12 boundary was corrected by hand."));
        assert_eq!(*index.added.borrow(), files);
        let written = fs::read_to_string(&entry.file).unwrap();
        assert_eq!(
            written,
            FREDERICTON.replace("2012-05-14 # as published", "2013-11-26 # as published")
        );
    }

    #[test]
    fn recording_twice_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let entry = entry(tmp.path());
        let index = RecordingIndex::default();
        let updater = StateUpdater::new(&index);

        updater.record(&entry, &[], date(2013, 11, 26)).unwrap();
        let once = fs::read_to_string(&entry.file).unwrap();
        updater.record(&entry, &[], date(2013, 11, 26)).unwrap();
        assert_eq!(fs::read_to_string(&entry.file).unwrap(), once);
    }

    #[test]
    fn index_failure_leaves_definition_alone() {
        let tmp = TempDir::new().unwrap();
        let entry = entry(tmp.path());
        let index = RecordingIndex {
            fail: true,
            ..Default::default()
        };

        assert!(
            StateUpdater::new(&index)
                .record(&entry, &[tmp.path().join("wards.shp")], date(2013, 11, 26))
                .is_err()
        );
        assert_eq!(fs::read_to_string(&entry.file).unwrap(), FREDERICTON);
    }

    #[test]
    fn removals_are_staged() {
        let index = RecordingIndex::default();
        let removed = vec![PathBuf::from("nb/fredericton/old.shp")];
        StateUpdater::new(&index).stage_removals(&removed).unwrap();
        assert_eq!(*index.removed.borrow(), removed);
    }
}
