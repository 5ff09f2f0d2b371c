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

//! Process-wide user settings.
//!
//! Defaulted at startup, overridden by restored persisted values when present,
//! mutated through a single entry point and persisted on every change.

use serde::{Deserialize, Serialize};

/// User-facing engine settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    /// Master output volume in [0, 1]. Fans out to every loaded voice.
    pub master_volume: f32,
    pub metronome_enabled: bool,
    pub metronome_volume: f32,
    /// When false, recording start requests are no-ops.
    pub recording_enabled: bool,
    pub touch_sensitivity: f32,
    pub visual_feedback: bool,
    /// When true, each successful pad trigger fires a haptic impact.
    pub haptic_feedback: bool,
    pub gesture_control: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            master_volume: 0.8,
            metronome_enabled: false,
            metronome_volume: 0.5,
            recording_enabled: true,
            touch_sensitivity: 0.5,
            visual_feedback: true,
            haptic_feedback: true,
            gesture_control: false,
        }
    }
}

/// A partial settings update. Unset fields leave the current value unchanged.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SettingsUpdate {
    pub master_volume: Option<f32>,
    pub metronome_enabled: Option<bool>,
    pub metronome_volume: Option<f32>,
    pub recording_enabled: Option<bool>,
    pub touch_sensitivity: Option<f32>,
    pub visual_feedback: Option<bool>,
    pub haptic_feedback: Option<bool>,
    pub gesture_control: Option<bool>,
}

impl SettingsUpdate {
    /// A convenience update that only changes the master volume.
    pub fn master_volume(volume: f32) -> SettingsUpdate {
        SettingsUpdate {
            master_volume: Some(volume),
            ..SettingsUpdate::default()
        }
    }
}

impl Settings {
    /// Merges a partial update into these settings. Volume fields are clamped
    /// to [0, 1]. Returns true if the master volume changed.
    pub fn apply(&mut self, update: &SettingsUpdate) -> bool {
        let previous_master = self.master_volume;
        if let Some(v) = update.master_volume {
            self.master_volume = v.clamp(0.0, 1.0);
        }
        if let Some(v) = update.metronome_enabled {
            self.metronome_enabled = v;
        }
        if let Some(v) = update.metronome_volume {
            self.metronome_volume = v.clamp(0.0, 1.0);
        }
        if let Some(v) = update.recording_enabled {
            self.recording_enabled = v;
        }
        if let Some(v) = update.touch_sensitivity {
            self.touch_sensitivity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = update.visual_feedback {
            self.visual_feedback = v;
        }
        if let Some(v) = update.haptic_feedback {
            self.haptic_feedback = v;
        }
        if let Some(v) = update.gesture_control {
            self.gesture_control = v;
        }
        self.master_volume != previous_master
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_only_set_fields() {
        let mut settings = Settings::default();
        let changed = settings.apply(&SettingsUpdate {
            haptic_feedback: Some(false),
            ..SettingsUpdate::default()
        });

        assert!(!changed);
        assert!(!settings.haptic_feedback);
        assert_eq!(settings.master_volume, 0.8);
        assert!(settings.recording_enabled);
    }

    #[test]
    fn test_apply_reports_master_volume_change() {
        let mut settings = Settings::default();
        assert!(settings.apply(&SettingsUpdate::master_volume(0.3)));
        assert_eq!(settings.master_volume, 0.3);

        // Same value again is not a change.
        assert!(!settings.apply(&SettingsUpdate::master_volume(0.3)));
    }

    #[test]
    fn test_apply_clamps_volumes() {
        let mut settings = Settings::default();
        settings.apply(&SettingsUpdate::master_volume(1.7));
        assert_eq!(settings.master_volume, 1.0);
        settings.apply(&SettingsUpdate::master_volume(-0.5));
        assert_eq!(settings.master_volume, 0.0);
    }
}
