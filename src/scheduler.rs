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

//! The pattern scheduler: drives a repeating beat clock that fires pattern
//! triggers through the sound pool.
//!
//! One pattern is scheduled at a time. There is no paused state; stopping
//! resets to the pattern start, and resuming requires a fresh `play` call.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Instant;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use crate::events::{EngineEvent, EventBus};
use crate::pattern::{Pattern, PatternError};
use crate::playsync::CancelHandle;
use crate::pool::SoundPool;

/// Typed error for scheduling requests.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
}

struct RunHandles {
    join: JoinHandle<()>,
    cancel: CancelHandle,
    finished: Arc<AtomicBool>,
}

/// Schedules one pattern at a time against a beat clock derived from the
/// pattern's tempo.
pub struct PatternScheduler {
    pool: Arc<SoundPool>,
    events: EventBus,
    /// The active run. There should only be one entry here at a time.
    run: Mutex<Option<RunHandles>>,
    /// The beat counter of the active run, observable for UI display.
    current_beat: Arc<AtomicU32>,
}

impl PatternScheduler {
    /// Creates a new scheduler dispatching triggers to the given pool.
    pub fn new(pool: Arc<SoundPool>, events: EventBus) -> PatternScheduler {
        PatternScheduler {
            pool,
            events,
            run: Mutex::new(None),
            current_beat: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Starts playing the given pattern. Beat zero fires immediately rather
    /// than after one full beat period. If a pattern is already playing, its
    /// clock is cancelled before the new one starts, so two clocks never
    /// drive the pool at once.
    pub async fn play(&self, pattern: Pattern) -> Result<(), SchedulerError> {
        pattern.validate()?;

        let mut run = self.run.lock().await;
        if let Some(previous) = run.take() {
            previous.cancel.cancel();
            let _ = previous.join.await;
        }

        info!(
            pattern = pattern.id,
            bpm = pattern.bpm,
            beats = pattern.beats.len(),
            looped = pattern.looped,
            "Starting pattern"
        );

        let cancel = CancelHandle::new();
        let finished = Arc::new(AtomicBool::new(false));
        self.current_beat.store(0, Ordering::Relaxed);

        let join = {
            let pool = self.pool.clone();
            let events = self.events.clone();
            let cancel = cancel.clone();
            let finished = finished.clone();
            let current_beat = self.current_beat.clone();
            tokio::task::spawn_blocking(move || {
                run_pattern(pool, events, pattern, cancel, finished, current_beat);
            })
        };

        *run = Some(RunHandles {
            join,
            cancel,
            finished,
        });
        Ok(())
    }

    /// Stops the active pattern, if any. The clock is cancelled and joined
    /// before this returns, so no further ticks fire afterwards.
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        if let Some(handles) = run.take() {
            handles.cancel.cancel();
            let _ = handles.join.await;
            debug!("Pattern stopped");
        }
    }

    /// Returns true if a pattern is currently playing.
    pub async fn is_playing(&self) -> bool {
        self.run
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.finished.load(Ordering::Relaxed))
    }

    /// The beat counter of the active run. After each tick this is the next
    /// beat to fire; a loop wrap resets it to zero.
    pub fn current_beat(&self) -> u32 {
        self.current_beat.load(Ordering::Relaxed)
    }
}

/// The tick loop. Runs on a blocking thread; deadlines are absolute offsets
/// from the run start so jitter in one tick does not accumulate into drift.
fn run_pattern(
    pool: Arc<SoundPool>,
    events: EventBus,
    pattern: Pattern,
    cancel: CancelHandle,
    finished: Arc<AtomicBool>,
    current_beat: Arc<AtomicU32>,
) {
    events.emit(EngineEvent::PatternStarted {
        pattern_id: pattern.id.clone(),
    });

    let beat_duration = pattern.beat_duration();
    let max_beat = pattern.max_beat();
    // A pattern with no beats is legal: it ticks silently until stopped.
    let endless = pattern.looped || pattern.beats.is_empty();
    let start = Instant::now();

    let mut beat: u32 = 0;
    let mut tick: u32 = 0;
    loop {
        if beat > max_beat {
            if endless {
                beat = 0;
                current_beat.store(0, Ordering::Relaxed);
            } else {
                break;
            }
        }

        for entry in pattern.beats_for(beat) {
            pool.trigger(&entry.sound_id, entry.velocity);
        }
        beat += 1;
        current_beat.store(beat, Ordering::Relaxed);

        tick += 1;
        if cancel.wait_deadline(start + beat_duration * tick) {
            break;
        }
    }

    finished.store(true, Ordering::Relaxed);
    events.emit(EngineEvent::PatternFinished {
        pattern_id: pattern.id.clone(),
    });
    debug!(pattern = pattern.id, "Pattern run ended");
}
