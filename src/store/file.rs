// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A JSON-file-per-record store rooted at a directory.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Store, StoreError};
use crate::kit::Kit;
use crate::pattern::Pattern;
use crate::session::Session;
use crate::settings::Settings;

/// A pattern with its kit association, as stored on disk.
#[derive(Deserialize, Serialize)]
struct PatternRecord {
    kit_id: String,
    pattern: Pattern,
}

/// A kit with its save time, as stored on disk. Directory iteration order is
/// unspecified, so the save time carries the ordering `load_kits` promises.
#[derive(Deserialize, Serialize)]
struct KitRecord {
    saved_at: SystemTime,
    kit: Kit,
}

/// Stores each record as a JSON file under `root`:
/// `kits/<id>.json`, `patterns/<id>.json`, `sessions/<id>.json` and
/// `settings.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the given directory. The directory is
    /// created lazily on first save.
    pub fn new(root: impl Into<PathBuf>) -> FileStore {
        FileStore { root: root.into() }
    }

    fn write_record<T: Serialize>(&self, dir: &str, id: &str, record: &T) -> Result<(), StoreError> {
        let dir = self.root.join(dir);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(dir.join(format!("{}.json", sanitize(id))), json)?;
        Ok(())
    }

    /// Reads every record in a subdirectory. Unparseable files are skipped
    /// with a warning so one corrupt record doesn't hide the rest.
    fn read_records<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, StoreError> {
        let dir = self.root.join(dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match serde_json::from_str(&fs::read_to_string(&path)?) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = ?path, err = %e, "Skipping unparseable record"),
            }
        }
        Ok(records)
    }
}

/// Keeps record ids usable as file names.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl Store for FileStore {
    fn save_kit(&self, kit: &Kit) -> Result<String, StoreError> {
        let record = KitRecord {
            saved_at: SystemTime::now(),
            kit: kit.clone(),
        };
        self.write_record("kits", &kit.id, &record)?;
        Ok(kit.id.clone())
    }

    fn load_kits(&self) -> Result<Vec<Kit>, StoreError> {
        let mut records = self.read_records::<KitRecord>("kits")?;
        records.sort_by_key(|r| r.saved_at);
        Ok(records.into_iter().map(|r| r.kit).collect())
    }

    fn save_pattern(&self, pattern: &Pattern, kit_id: &str) -> Result<String, StoreError> {
        let record = PatternRecord {
            kit_id: kit_id.to_string(),
            pattern: pattern.clone(),
        };
        self.write_record("patterns", &pattern.id, &record)?;
        Ok(pattern.id.clone())
    }

    fn load_patterns(&self, kit_id: Option<&str>) -> Result<Vec<Pattern>, StoreError> {
        Ok(self
            .read_records::<PatternRecord>("patterns")?
            .into_iter()
            .filter(|r| kit_id.is_none_or(|id| r.kit_id == id))
            .map(|r| r.pattern)
            .collect())
    }

    fn save_session(&self, session: &Session) -> Result<String, StoreError> {
        self.write_record("sessions", &session.id, session)?;
        Ok(session.id.clone())
    }

    fn load_sessions(&self, kit_id: Option<&str>) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .read_records::<Session>("sessions")?
            .into_iter()
            .filter(|s| kit_id.is_none_or(|id| s.kit_id == id))
            .collect())
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(self.settings_path(), json)?;
        Ok(())
    }

    fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let path = self.settings_path();
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
    }
}

impl FileStore {
    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::Recording;

    fn recording() -> Recording {
        Recording {
            id: "recording-1".to_string(),
            session_id: String::new(),
            audio_ref: "mock://capture/1".to_string(),
            duration_seconds: 2.5,
            waveform: vec![0.0, 0.5, 1.0],
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_kit_round_trip() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        let kit = Kit::default_kit();
        store.save_kit(&kit).unwrap();

        let kits = store.load_kits().unwrap();
        assert_eq!(kits.len(), 1);
        assert_eq!(kits[0].id, kit.id);
        assert_eq!(kits[0].sounds.len(), kit.sounds.len());
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path().join("does-not-exist-yet"));

        assert!(store.load_kits().unwrap().is_empty());
        assert!(store.load_patterns(None).unwrap().is_empty());
        assert!(store.load_sessions(None).unwrap().is_empty());
        assert!(store.load_settings().unwrap().is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        let settings = Settings {
            master_volume: 0.3,
            ..Settings::default()
        };
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings().unwrap(), Some(settings));
    }

    #[test]
    fn test_pattern_kit_filter() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        let mut a = Pattern::demo();
        a.id = "a".to_string();
        let mut b = Pattern::demo();
        b.id = "b".to_string();
        store.save_pattern(&a, "kit-1").unwrap();
        store.save_pattern(&b, "kit-2").unwrap();

        assert_eq!(store.load_patterns(None).unwrap().len(), 2);
        let for_kit_2 = store.load_patterns(Some("kit-2")).unwrap();
        assert_eq!(for_kit_2.len(), 1);
        assert_eq!(for_kit_2[0].id, "b");
    }

    #[test]
    fn test_kits_load_in_save_order() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        let mut kit = Kit::default_kit();
        kit.id = "first".to_string();
        store.save_kit(&kit).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        kit.id = "second".to_string();
        store.save_kit(&kit).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        // Re-saving moves a kit to the end of the order.
        kit.id = "first".to_string();
        store.save_kit(&kit).unwrap();

        let ids: Vec<String> = store
            .load_kits()
            .unwrap()
            .into_iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(ids, vec!["second".to_string(), "first".to_string()]);
    }

    #[test]
    fn test_sessions_from_prior_runs_are_not_overwritten() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        // A session persisted by an earlier process run, with the id such a
        // run would have allocated first.
        let mut old = Session::new("local", "default", vec![], recording());
        old.id = "session-1".to_string();
        store.save_session(&old).unwrap();

        let session = Session::new("local", "default", vec![], recording());
        assert_ne!(session.id, "session-1");
        store.save_session(&session).unwrap();

        assert_eq!(store.load_sessions(None).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_record_is_skipped() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = FileStore::new(dir.path());

        store.save_kit(&Kit::default_kit()).unwrap();
        fs::write(dir.path().join("kits/corrupt.json"), "not json").unwrap();

        assert_eq!(store.load_kits().unwrap().len(), 1);
    }

    #[test]
    fn test_sanitize_ids() {
        assert_eq!(sanitize("kit-1"), "kit-1");
        assert_eq!(sanitize("../evil"), "___evil");
        assert_eq!(sanitize("a b/c"), "a_b_c");
    }
}
