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
use crate::kit::{KitEffects, SoundCategory, DEFAULT_BPM};

/// A YAML representation of a sound asset.
#[derive(Deserialize)]
pub struct Sound {
    /// Stable identifier, unique within the kit.
    id: String,

    /// The source reference handed to the audio backend.
    source: String,

    /// The percussion family this sound belongs to.
    category: SoundCategory,

    /// Internal name; defaults to the id.
    internal_name: Option<String>,

    /// Name shown on the pad; defaults to the id.
    display_name: Option<String>,

    /// Pad color as a hex string.
    #[serde(default = "default_color")]
    color: String,

    /// Base gain for this voice.
    #[serde(default = "default_gain")]
    gain: f32,

    pitch: Option<f32>,
    reverb: Option<f32>,
    delay: Option<f32>,
}

fn default_color() -> String {
    "#888888".to_string()
}

fn default_gain() -> f32 {
    1.0
}

/// A YAML representation of a kit definition.
#[derive(Deserialize)]
pub struct Kit {
    /// Stable identifier; defaults to the file stem.
    id: Option<String>,

    name: String,

    #[serde(default)]
    description: String,

    sounds: Vec<Sound>,

    #[serde(default = "default_bpm")]
    bpm: f64,

    #[serde(default = "default_gain")]
    master_gain: f32,

    #[serde(default)]
    effects: KitEffects,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

impl Kit {
    /// Converts the parsed representation into a validated kit.
    pub fn to_kit(self, file: &Path) -> Result<crate::kit::Kit, ConfigError> {
        let kit = crate::kit::Kit {
            id: self.id.unwrap_or_else(|| id_from_file(file)),
            name: self.name,
            description: self.description,
            sounds: self
                .sounds
                .into_iter()
                .map(|sound| crate::kit::SoundAsset {
                    internal_name: sound.internal_name.unwrap_or_else(|| sound.id.clone()),
                    display_name: sound.display_name.unwrap_or_else(|| sound.id.clone()),
                    id: sound.id,
                    source_ref: sound.source,
                    color: sound.color,
                    category: sound.category,
                    gain: sound.gain.clamp(0.0, 1.0),
                    pitch: sound.pitch,
                    reverb: sound.reverb,
                    delay: sound.delay,
                })
                .collect(),
            bpm: self.bpm,
            master_gain: self.master_gain.clamp(0.0, 1.0),
            effects: self.effects,
        };
        kit.validate()?;
        Ok(kit)
    }
}
