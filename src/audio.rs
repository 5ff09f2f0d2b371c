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
use std::any::Any;
use std::time::Duration;
use std::{fmt, sync::Arc};

pub mod mock;

/// Opaque identifier for a loaded playback handle.
pub type HandleId = u64;

/// The result of a finalized microphone capture.
#[derive(Clone, Debug)]
pub struct Capture {
    /// Opaque reference to the captured audio.
    pub audio_ref: String,
    /// Length of the capture.
    pub duration: Duration,
    /// Amplitude samples for waveform display.
    pub waveform: Vec<f32>,
}

/// Typed error for audio backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("unknown handle: {0}")]
    UnknownHandle(HandleId),
    #[error("failed to load source {source_ref}: {reason}")]
    Load { source_ref: String, reason: String },
    #[error("no audio backend named {0}")]
    UnknownBackend(String),
    #[error("recording permission denied")]
    PermissionDenied,
    #[error("no capture in progress")]
    NoCapture,
    #[error("a capture is already in progress")]
    CaptureInProgress,
}

/// The platform audio primitive the engine plays and records through.
///
/// One handle is acquired per sound source; playback operations address the
/// handle. All calls are cheap and non-blocking from the caller's point of
/// view; a hang in the underlying audio subsystem is out of scope.
pub trait Backend: Any + fmt::Display + Send + Sync {
    /// Acquires a playable handle for the given source reference.
    fn create_handle(&self, source_ref: &str) -> Result<HandleId, BackendError>;

    /// Starts playback of the handle at the given gain.
    fn play(&self, handle: HandleId, gain: f32) -> Result<(), BackendError>;

    /// Stops playback of the handle. Stopping a stopped handle is a no-op.
    fn stop(&self, handle: HandleId) -> Result<(), BackendError>;

    /// Seeks the handle to the given position.
    fn set_position(&self, handle: HandleId, position: Duration) -> Result<(), BackendError>;

    /// Adjusts the handle's gain without interrupting playback.
    fn set_volume(&self, handle: HandleId, gain: f32) -> Result<(), BackendError>;

    /// Releases the handle.
    fn unload(&self, handle: HandleId) -> Result<(), BackendError>;

    /// Asks the hosting environment for permission to record. Returns false
    /// if the user denied it.
    fn request_recording_permission(&self) -> Result<bool, BackendError>;

    /// Starts a microphone capture. At most one capture may be in flight.
    fn start_capture(&self) -> Result<(), BackendError>;

    /// Finalizes the in-flight capture.
    fn stop_capture(&self) -> Result<Capture, BackendError>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Backend>, BackendError>;
}

/// Gets a backend with the given name.
pub fn get_backend(name: &str) -> Result<Arc<dyn Backend>, BackendError> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Backend::get(name)));
    }

    Err(BackendError::UnknownBackend(name.to_string()))
}
