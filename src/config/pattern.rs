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
use std::path::Path;

use serde::Deserialize;

use super::{id_from_file, ConfigError};
use crate::kit::DEFAULT_BPM;

/// A YAML representation of a single pattern beat.
#[derive(Deserialize)]
pub struct Beat {
    /// The sound to trigger.
    sound: String,

    /// Offset from the pattern start, in beats.
    offset: f64,

    /// Trigger velocity.
    #[serde(default = "default_velocity")]
    velocity: f32,

    /// Optional note length in beats.
    duration: Option<f64>,
}

fn default_velocity() -> f32 {
    1.0
}

/// A YAML representation of a pattern definition.
#[derive(Deserialize)]
pub struct Pattern {
    /// Stable identifier; defaults to the file stem.
    id: Option<String>,

    name: String,

    beats: Vec<Beat>,

    #[serde(default = "default_bpm")]
    bpm: f64,

    #[serde(default = "default_time_signature")]
    time_signature: String,

    /// Whether the pattern repeats until stopped.
    #[serde(rename = "loop", default)]
    looped: bool,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn default_time_signature() -> String {
    "4/4".to_string()
}

impl Pattern {
    /// Converts the parsed representation into a validated pattern.
    pub fn to_pattern(self, file: &Path) -> Result<crate::pattern::Pattern, ConfigError> {
        let pattern = crate::pattern::Pattern {
            id: self.id.unwrap_or_else(|| id_from_file(file)),
            name: self.name,
            beats: self
                .beats
                .into_iter()
                .map(|beat| crate::pattern::Beat {
                    sound_id: beat.sound,
                    offset_beats: beat.offset,
                    velocity: beat.velocity.clamp(0.0, 1.0),
                    duration_beats: beat.duration,
                })
                .collect(),
            bpm: self.bpm,
            time_signature: self.time_signature,
            looped: self.looped,
        };
        pattern.validate()?;
        Ok(pattern)
    }
}
