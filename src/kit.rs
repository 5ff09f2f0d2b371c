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

//! The sound asset registry: percussion voice definitions and kits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The default tempo for a kit when none is configured.
pub const DEFAULT_BPM: f64 = 120.0;

/// Broad percussion families used to group pads in the UI.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Kick,
    Snare,
    Hihat,
    Cymbal,
    Tom,
    Percussion,
    Electronic,
    Fx,
}

/// A single percussion voice definition. Immutable once defined; owned by the
/// kit it belongs to.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SoundAsset {
    /// Stable identifier, unique within a kit.
    pub id: String,
    /// Internal name used for matching and diagnostics.
    pub internal_name: String,
    /// Name shown on the pad.
    pub display_name: String,
    /// Opaque source reference resolved by the audio backend.
    pub source_ref: String,
    /// Pad color as a hex string.
    pub color: String,
    /// The percussion family this sound belongs to.
    pub category: SoundCategory,
    /// Base gain for this voice, in [0, 1].
    pub gain: f32,
    /// Optional pitch adjustment in semitones.
    pub pitch: Option<f32>,
    /// Optional per-voice reverb send, in [0, 1].
    pub reverb: Option<f32>,
    /// Optional per-voice delay send, in [0, 1].
    pub delay: Option<f32>,
}

/// Kit-wide effect sends, each in [0, 1].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct KitEffects {
    #[serde(default)]
    pub reverb: f32,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub distortion: f32,
    #[serde(default)]
    pub filter: f32,
    #[serde(default)]
    pub compressor: f32,
}

/// An ordered collection of sound assets with a tempo and kit-wide gain.
/// Exactly one kit is active at a time; switching kits replaces the whole
/// kit rather than mutating it voice by voice.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Kit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sounds: Vec<SoundAsset>,
    pub bpm: f64,
    pub master_gain: f32,
    #[serde(default)]
    pub effects: KitEffects,
}

/// Typed error for invalid kit definitions.
#[derive(Debug, thiserror::Error)]
pub enum KitError {
    #[error("invalid bpm: {0} (must be greater than zero)")]
    InvalidBpm(f64),
    #[error("duplicate sound id: {0}")]
    DuplicateSoundId(String),
    #[error("sound {sound_id} has gain {gain} outside [0, 1]")]
    InvalidGain { sound_id: String, gain: f32 },
    #[error("master gain {0} is outside [0, 1]")]
    InvalidMasterGain(f32),
}

impl Kit {
    /// Validates the kit definition: positive tempo, unique sound ids, and
    /// gains within the unit interval.
    pub fn validate(&self) -> Result<(), KitError> {
        if !(self.bpm > 0.0) {
            return Err(KitError::InvalidBpm(self.bpm));
        }
        if !(0.0..=1.0).contains(&self.master_gain) {
            return Err(KitError::InvalidMasterGain(self.master_gain));
        }
        let mut seen = HashSet::new();
        for sound in &self.sounds {
            if !seen.insert(sound.id.as_str()) {
                return Err(KitError::DuplicateSoundId(sound.id.clone()));
            }
            if !(0.0..=1.0).contains(&sound.gain) {
                return Err(KitError::InvalidGain {
                    sound_id: sound.id.clone(),
                    gain: sound.gain,
                });
            }
        }
        Ok(())
    }

    /// Looks up a sound asset by id.
    pub fn sound(&self, id: &str) -> Option<&SoundAsset> {
        self.sounds.iter().find(|s| s.id == id)
    }

    /// The built-in nine-voice kit used when no kit has been saved yet.
    pub fn default_kit() -> Kit {
        let sounds = [
            ("kick", "Kick", SoundCategory::Kick, "#e74c3c"),
            ("snare", "Snare", SoundCategory::Snare, "#f1c40f"),
            ("hihat_closed", "Closed Hat", SoundCategory::Hihat, "#2ecc71"),
            ("hihat_open", "Open Hat", SoundCategory::Hihat, "#27ae60"),
            ("crash", "Crash", SoundCategory::Cymbal, "#3498db"),
            ("ride", "Ride", SoundCategory::Cymbal, "#2980b9"),
            ("tom_high", "Hi Tom", SoundCategory::Tom, "#9b59b6"),
            ("tom_low", "Lo Tom", SoundCategory::Tom, "#8e44ad"),
            ("clap", "Clap", SoundCategory::Percussion, "#e67e22"),
        ]
        .into_iter()
        .map(|(id, display_name, category, color)| SoundAsset {
            id: id.to_string(),
            internal_name: id.to_string(),
            display_name: display_name.to_string(),
            source_ref: format!("asset://sounds/{}.wav", id),
            color: color.to_string(),
            category,
            gain: 1.0,
            pitch: None,
            reverb: None,
            delay: None,
        })
        .collect();

        Kit {
            id: "default".to_string(),
            name: "Standard Kit".to_string(),
            description: "The built-in acoustic kit.".to_string(),
            sounds,
            bpm: DEFAULT_BPM,
            master_gain: 1.0,
            effects: KitEffects::default(),
        }
    }
}

/// Computes the gain a voice should play at for a single trigger:
/// the asset gain scaled by the trigger velocity and the master volume,
/// clamped to [0, 1].
pub fn effective_gain(gain: f32, velocity: f32, master_volume: f32) -> f32 {
    (gain * velocity * master_volume).clamp(0.0, 1.0)
}
