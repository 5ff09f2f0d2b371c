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

//! An in-memory store, used by tests and the demo CLI.

use parking_lot::Mutex;

use super::{Store, StoreError};
use crate::kit::Kit;
use crate::pattern::Pattern;
use crate::session::Session;
use crate::settings::Settings;

#[derive(Default)]
struct Inner {
    kits: Vec<Kit>,
    patterns: Vec<(String, Pattern)>,
    sessions: Vec<Session>,
    settings: Option<Settings>,
}

/// A store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn save_kit(&self, kit: &Kit) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        inner.kits.retain(|k| k.id != kit.id);
        inner.kits.push(kit.clone());
        Ok(kit.id.clone())
    }

    fn load_kits(&self) -> Result<Vec<Kit>, StoreError> {
        Ok(self.inner.lock().kits.clone())
    }

    fn save_pattern(&self, pattern: &Pattern, kit_id: &str) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        inner.patterns.retain(|(_, p)| p.id != pattern.id);
        inner.patterns.push((kit_id.to_string(), pattern.clone()));
        Ok(pattern.id.clone())
    }

    fn load_patterns(&self, kit_id: Option<&str>) -> Result<Vec<Pattern>, StoreError> {
        Ok(self
            .inner
            .lock()
            .patterns
            .iter()
            .filter(|(k, _)| kit_id.is_none_or(|id| k == id))
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn save_session(&self, session: &Session) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        inner.sessions.retain(|s| s.id != session.id);
        inner.sessions.push(session.clone());
        Ok(session.id.clone())
    }

    fn load_sessions(&self, kit_id: Option<&str>) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .iter()
            .filter(|s| kit_id.is_none_or(|id| s.kit_id == id))
            .cloned()
            .collect())
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.inner.lock().settings = Some(settings.clone());
        Ok(())
    }

    fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        Ok(self.inner.lock().settings.clone())
    }
}
