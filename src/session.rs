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

//! Performance sessions and their captured recordings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Builds an id that is unique across process runs: the wall-clock component
/// keeps ids from separate runs apart, the counter keeps ids within one run
/// apart. A bare counter would restart at 1 in a fresh process and overwrite
/// durably stored records with the same id.
pub(crate) fn unique_id(prefix: &str, counter: &AtomicU64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!(
        "{}-{:x}-{}",
        prefix,
        nanos,
        counter.fetch_add(1, Ordering::SeqCst)
    )
}

/// A finalized microphone capture. Owned by exactly one session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Recording {
    pub id: String,
    /// The owning session. Filled in when the recording is wrapped into a
    /// session.
    pub session_id: String,
    /// Opaque reference to the captured audio, resolved by the audio backend.
    pub audio_ref: String,
    pub duration_seconds: f64,
    /// Amplitude samples for waveform display.
    pub waveform: Vec<f32>,
    pub created_at: SystemTime,
}

/// A persisted bundle of patterns and an optional recording tied to a kit.
/// Created when a recording completes; immutable once created.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub kit_id: String,
    /// The patterns played during this session.
    pub patterns: Vec<Pattern>,
    pub recording: Option<Recording>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Session {
    /// Creates a new session wrapping the given recording. The recording's
    /// `session_id` is bound to the new session.
    pub fn new(
        user_id: &str,
        kit_id: &str,
        patterns: Vec<Pattern>,
        mut recording: Recording,
    ) -> Session {
        let id = unique_id("session", &NEXT_SESSION_ID);
        recording.session_id = id.clone();
        let now = SystemTime::now();
        Session {
            id,
            user_id: user_id.to_string(),
            kit_id: kit_id.to_string(),
            patterns,
            recording: Some(recording),
            created_at: now,
            updated_at: now,
        }
    }
}
