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

//! Rhythmic patterns: timed trigger sequences played against a tempo clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single timed trigger within a pattern.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Beat {
    /// The sound to trigger.
    pub sound_id: String,
    /// Offset from the pattern start, in beats. Need not be an integer;
    /// beats are grouped by the integer beat they fall into.
    pub offset_beats: f64,
    /// Trigger velocity in [0, 1].
    pub velocity: f32,
    /// Optional note length in beats. Informational; one-shot voices play to
    /// completion regardless.
    pub duration_beats: Option<f64>,
}

/// A timed sequence of triggers at a tempo. Immutable while scheduled; playback
/// changes require supplying a new pattern.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    /// The beats of the pattern. Order is irrelevant; `offset_beats` is the
    /// authoritative ordering key.
    pub beats: Vec<Beat>,
    pub bpm: f64,
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    /// Whether the pattern repeats from the start after its last beat.
    #[serde(rename = "loop", default)]
    pub looped: bool,
}

fn default_time_signature() -> String {
    "4/4".to_string()
}

/// Typed error for invalid pattern definitions.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid bpm: {0} (must be greater than zero)")]
    InvalidBpm(f64),
    #[error("beat {index} for sound {sound_id} has a negative offset")]
    NegativeOffset { index: usize, sound_id: String },
}

impl Pattern {
    /// Validates the pattern: positive tempo and non-negative offsets.
    pub fn validate(&self) -> Result<(), PatternError> {
        if !(self.bpm > 0.0) {
            return Err(PatternError::InvalidBpm(self.bpm));
        }
        for (index, beat) in self.beats.iter().enumerate() {
            if beat.offset_beats < 0.0 {
                return Err(PatternError::NegativeOffset {
                    index,
                    sound_id: beat.sound_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// The duration of one beat at this pattern's tempo.
    pub fn beat_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm)
    }

    /// The highest integer beat the scheduler must reach to cover every
    /// trigger, i.e. `ceil(max offset)`. Zero for an empty pattern.
    pub fn max_beat(&self) -> u32 {
        self.beats
            .iter()
            .map(|b| b.offset_beats.max(0.0).ceil() as u32)
            .max()
            .unwrap_or(0)
    }

    /// All beats that fall into the given integer beat, i.e. those whose
    /// `floor(offset_beats)` equals it. Beats sharing an integer offset all
    /// fire in the same tick.
    pub fn beats_for(&self, beat: u32) -> impl Iterator<Item = &Beat> {
        self.beats
            .iter()
            .filter(move |b| b.offset_beats.max(0.0).floor() as u32 == beat)
    }

    /// The built-in demo pattern: a bar of a basic rock beat over the default
    /// kit, looped.
    pub fn demo() -> Pattern {
        let hits: &[(&str, f64, f32)] = &[
            ("kick", 0.0, 1.0),
            ("hihat_closed", 0.0, 0.7),
            ("hihat_closed", 0.5, 0.5),
            ("snare", 1.0, 0.9),
            ("hihat_closed", 1.0, 0.7),
            ("hihat_closed", 1.5, 0.5),
            ("kick", 2.0, 1.0),
            ("hihat_closed", 2.0, 0.7),
            ("kick", 2.5, 0.8),
            ("snare", 3.0, 0.9),
            ("hihat_open", 3.5, 0.6),
        ];
        Pattern {
            id: "demo".to_string(),
            name: "Demo Beat".to_string(),
            beats: hits
                .iter()
                .map(|(sound_id, offset_beats, velocity)| Beat {
                    sound_id: sound_id.to_string(),
                    offset_beats: *offset_beats,
                    velocity: *velocity,
                    duration_beats: None,
                })
                .collect(),
            bpm: 120.0,
            time_signature: default_time_signature(),
            looped: true,
        }
    }
}
