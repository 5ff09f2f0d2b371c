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

//! The haptics collaborator seam. Impacts are fire-and-forget.

use std::sync::atomic::{AtomicU32, Ordering};

/// Impact strength, mapped from trigger velocity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

impl ImpactStyle {
    /// Maps a trigger velocity in [0, 1] to an impact style.
    pub fn for_velocity(velocity: f32) -> ImpactStyle {
        if velocity < 0.34 {
            ImpactStyle::Light
        } else if velocity < 0.67 {
            ImpactStyle::Medium
        } else {
            ImpactStyle::Heavy
        }
    }
}

/// Host haptic feedback. Implementations must not block.
pub trait Haptics: Send + Sync {
    /// Fires a haptic impact of the given style.
    fn impact(&self, style: ImpactStyle);
}

/// A haptics implementation that does nothing, for hosts without an actuator.
pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn impact(&self, _style: ImpactStyle) {}
}

/// Counts impacts per style. Used by tests and the demo CLI summary.
#[derive(Default)]
pub struct CountingHaptics {
    light: AtomicU32,
    medium: AtomicU32,
    heavy: AtomicU32,
}

impl CountingHaptics {
    /// Returns the total number of impacts fired.
    pub fn total(&self) -> u32 {
        self.light.load(Ordering::Relaxed)
            + self.medium.load(Ordering::Relaxed)
            + self.heavy.load(Ordering::Relaxed)
    }

    /// Returns the number of impacts fired for the given style.
    pub fn count(&self, style: ImpactStyle) -> u32 {
        match style {
            ImpactStyle::Light => self.light.load(Ordering::Relaxed),
            ImpactStyle::Medium => self.medium.load(Ordering::Relaxed),
            ImpactStyle::Heavy => self.heavy.load(Ordering::Relaxed),
        }
    }
}

impl Haptics for CountingHaptics {
    fn impact(&self, style: ImpactStyle) {
        let counter = match style {
            ImpactStyle::Light => &self.light,
            ImpactStyle::Medium => &self.medium,
            ImpactStyle::Heavy => &self.heavy,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
