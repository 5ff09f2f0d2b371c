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

//! The performance recorder: microphone capture running alongside pad
//! triggering and pattern playback.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::audio::{Backend, BackendError};
use crate::session::{unique_id, Recording};
use crate::settings::Settings;

static NEXT_RECORDING_ID: AtomicU64 = AtomicU64::new(1);

/// The outcome of a start request.
#[derive(Debug, Eq, PartialEq)]
pub enum StartOutcome {
    /// A capture is now in flight.
    Started,
    /// Recording is disabled in settings; nothing happened.
    Disabled,
}

/// Typed error for recorder operations.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("recording permission was not granted")]
    PermissionDenied,
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording is in progress")]
    NotRecording,
    #[error("audio backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Eq, PartialEq)]
enum State {
    Idle,
    Recording,
}

/// Captures performance audio through the backend. At most one capture is in
/// flight at a time.
pub struct Recorder {
    backend: Arc<dyn Backend>,
    state: Mutex<State>,
}

impl Recorder {
    /// Creates a new idle recorder.
    pub fn new(backend: Arc<dyn Backend>) -> Recorder {
        Recorder {
            backend,
            state: Mutex::new(State::Idle),
        }
    }

    /// Starts a capture. A no-op if recording is disabled in settings. Fails
    /// without a state change if permission is not granted or a capture is
    /// already in flight.
    pub fn start(&self, settings: &Settings) -> Result<StartOutcome, RecorderError> {
        if !settings.recording_enabled {
            info!("Recording is disabled in settings");
            return Ok(StartOutcome::Disabled);
        }

        let mut state = self.state.lock();
        if *state == State::Recording {
            return Err(RecorderError::AlreadyRecording);
        }

        if !self.backend.request_recording_permission()? {
            warn!("Recording permission denied by host");
            return Err(RecorderError::PermissionDenied);
        }

        self.backend.start_capture()?;
        *state = State::Recording;
        info!("Recording started");
        Ok(StartOutcome::Started)
    }

    /// Finalizes the in-flight capture into a `Recording`. The caller is
    /// responsible for wrapping it into a session.
    pub fn stop(&self) -> Result<Recording, RecorderError> {
        let mut state = self.state.lock();
        if *state == State::Idle {
            return Err(RecorderError::NotRecording);
        }

        let capture = self.backend.stop_capture()?;
        *state = State::Idle;

        let recording = Recording {
            id: unique_id("recording", &NEXT_RECORDING_ID),
            session_id: String::new(),
            audio_ref: capture.audio_ref,
            duration_seconds: capture.duration.as_secs_f64(),
            waveform: capture.waveform,
            created_at: SystemTime::now(),
        };
        info!(
            recording = recording.id,
            duration_seconds = recording.duration_seconds,
            "Recording finished"
        );
        Ok(recording)
    }

    /// Discards any in-flight capture. Used during teardown.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        if *state == State::Recording {
            if let Err(e) = self.backend.stop_capture() {
                warn!(err = %e, "Failed to stop capture during abort");
            }
            *state = State::Idle;
            info!("Recording aborted");
        }
    }

    /// Returns true if a capture is in flight.
    pub fn is_recording(&self) -> bool {
        *self.state.lock() == State::Recording
    }
}
