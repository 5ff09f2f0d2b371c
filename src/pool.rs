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

//! The sound pool: one playable handle per voice of the active kit.
//!
//! Triggering reuses the handle (stop, rewind, play) rather than allocating a
//! new one, which bounds memory and keeps rapid retriggers of one pad from
//! layering instances of the same voice.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::audio::{Backend, HandleId};
use crate::kit::{effective_gain, Kit, SoundAsset};

/// Per-entry load status. A load failure is recorded as a fallback marker so
/// the pad grid always has exactly one entry per defined sound.
enum SlotState {
    Loaded(HandleId),
    Fallback,
}

/// One voice of the active kit.
struct VoiceSlot {
    asset: SoundAsset,
    state: SlotState,
    /// The velocity of the most recent trigger, used when master volume
    /// changes reapply gain. The mutex also serializes the stop/rewind/play
    /// sequence on this slot's handle so a retrigger never races an in-flight
    /// restart of the same voice.
    last_velocity: Mutex<f32>,
}

/// Maintains the loaded voices for the active kit and plays them with
/// per-trigger velocity. Playback calls are best-effort and never propagate
/// errors to the caller.
pub struct SoundPool {
    backend: Arc<dyn Backend>,
    slots: RwLock<HashMap<String, VoiceSlot>>,
    master_volume: RwLock<f32>,
}

impl SoundPool {
    /// Creates an empty pool playing through the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> SoundPool {
        SoundPool {
            backend,
            slots: RwLock::new(HashMap::new()),
            master_volume: RwLock::new(1.0),
        }
    }

    /// Loads one handle per sound in the kit. A failure to load an individual
    /// asset is non-fatal: the voice gets a silent fallback entry and the
    /// failure is logged.
    pub fn load(&self, kit: &Kit) {
        let mut slots = self.slots.write();
        for asset in &kit.sounds {
            let state = match self.backend.create_handle(&asset.source_ref) {
                Ok(handle) => SlotState::Loaded(handle),
                Err(e) => {
                    warn!(
                        sound = asset.id,
                        source_ref = asset.source_ref,
                        err = %e,
                        "Failed to load sound, substituting silent fallback"
                    );
                    SlotState::Fallback
                }
            };
            slots.insert(
                asset.id.clone(),
                VoiceSlot {
                    asset: asset.clone(),
                    state,
                    last_velocity: Mutex::new(1.0),
                },
            );
        }

        info!(
            kit = kit.id,
            voices = slots.len(),
            "Kit loaded into sound pool"
        );
    }

    /// Triggers the voice with the given id at the given velocity. Unknown ids
    /// are a no-op. The handle is stopped, rewound to the start and restarted
    /// at the effective gain for this trigger.
    ///
    /// Returns true if the id resolved to a voice of the active kit.
    pub fn trigger(&self, sound_id: &str, velocity: f32) -> bool {
        let velocity = velocity.clamp(0.0, 1.0);
        let slots = self.slots.read();
        let slot = match slots.get(sound_id) {
            Some(slot) => slot,
            None => {
                debug!(sound = sound_id, "Trigger for unknown sound id");
                return false;
            }
        };

        // Serialize operations on this handle; a concurrent retrigger waits
        // for the previous stop/rewind/play sequence to settle.
        let mut last_velocity = slot.last_velocity.lock();
        *last_velocity = velocity;

        let handle = match slot.state {
            SlotState::Loaded(handle) => handle,
            // Fallback voices are silent but still count as triggered.
            SlotState::Fallback => return true,
        };

        let gain = effective_gain(slot.asset.gain, velocity, *self.master_volume.read());
        let result = self
            .backend
            .stop(handle)
            .and_then(|_| self.backend.set_position(handle, Duration::ZERO))
            .and_then(|_| self.backend.set_volume(handle, gain))
            .and_then(|_| self.backend.play(handle, gain));
        if let Err(e) = result {
            // Best-effort realtime path; log and move on.
            warn!(sound = sound_id, err = %e, "Trigger failed");
        }

        debug!(sound = sound_id, velocity, gain, "Voice triggered");
        true
    }

    /// Sets the master volume and reapplies the effective gain to every loaded
    /// voice without interrupting in-flight playback.
    pub fn set_master_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.master_volume.write() = volume;

        let slots = self.slots.read();
        for (sound_id, slot) in slots.iter() {
            let last_velocity = slot.last_velocity.lock();
            if let SlotState::Loaded(handle) = slot.state {
                let gain = effective_gain(slot.asset.gain, *last_velocity, volume);
                if let Err(e) = self.backend.set_volume(handle, gain) {
                    warn!(sound = sound_id, err = %e, "Failed to apply master volume");
                }
            }
        }

        debug!(volume, "Master volume applied to pool");
    }

    /// Releases every handle. Must be called before switching kits and before
    /// teardown. Idempotent.
    pub fn unload_all(&self) {
        let mut slots = self.slots.write();
        for (sound_id, slot) in slots.drain() {
            if let SlotState::Loaded(handle) = slot.state {
                if let Err(e) = self.backend.unload(handle) {
                    warn!(sound = sound_id, err = %e, "Failed to unload voice");
                }
            }
        }
    }

    /// Returns the number of voices in the pool, fallbacks included.
    pub fn voice_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns the number of voices that failed to load and were substituted
    /// with silent fallbacks.
    pub fn fallback_count(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|s| matches!(s.state, SlotState::Fallback))
            .count()
    }
}

impl std::fmt::Debug for SoundPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundPool")
            .field("voices", &self.voice_count())
            .field("fallbacks", &self.fallback_count())
            .field("master_volume", &*self.master_volume.read())
            .finish()
    }
}
