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

//! The persistence collaborator seam.
//!
//! All calls are best-effort from the engine's point of view: a store failure
//! degrades to in-memory-only operation and never interrupts playback.

use crate::kit::Kit;
use crate::pattern::Pattern;
use crate::session::Session;
use crate::settings::Settings;

pub mod file;
pub mod memory;

/// Typed error for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persists kits, patterns, sessions and settings.
pub trait Store: Send + Sync {
    /// Saves a kit, replacing any stored kit with the same id. Returns the
    /// kit id.
    fn save_kit(&self, kit: &Kit) -> Result<String, StoreError>;

    /// Loads all stored kits in save order, oldest first. The most recently
    /// saved kit is last; re-saving a kit moves it to the end.
    fn load_kits(&self) -> Result<Vec<Kit>, StoreError>;

    /// Saves a pattern, associated with a kit. Returns the pattern id.
    fn save_pattern(&self, pattern: &Pattern, kit_id: &str) -> Result<String, StoreError>;

    /// Loads stored patterns, optionally restricted to one kit.
    fn load_patterns(&self, kit_id: Option<&str>) -> Result<Vec<Pattern>, StoreError>;

    /// Saves a session. Returns the session id.
    fn save_session(&self, session: &Session) -> Result<String, StoreError>;

    /// Loads stored sessions, optionally restricted to one kit.
    fn load_sessions(&self, kit_id: Option<&str>) -> Result<Vec<Session>, StoreError>;

    /// Saves the full settings object.
    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;

    /// Loads the stored settings, or None if none have been saved.
    fn load_settings(&self) -> Result<Option<Settings>, StoreError>;
}
