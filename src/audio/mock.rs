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
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::{BackendError, Capture, HandleId};

/// An operation issued against a mock handle, in issue order.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Play(f32),
    Stop,
    SetPosition(Duration),
    SetVolume(f32),
}

/// Observable state of one mock handle.
#[derive(Clone, Debug)]
pub struct MockHandle {
    pub source_ref: String,
    pub playing: bool,
    pub position: Duration,
    pub gain: f32,
    pub play_count: u32,
    pub ops: Vec<Op>,
}

struct MockState {
    next_handle: HandleId,
    handles: HashMap<HandleId, MockHandle>,
    fail_sources: HashSet<String>,
    permission_granted: bool,
    capture_started: Option<Instant>,
    captures_finished: u32,
}

/// A mock audio backend. Doesn't actually make any sound; records every
/// operation for inspection.
#[derive(Clone)]
pub struct Backend {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl Backend {
    /// Gets the given mock backend.
    pub fn get(name: &str) -> Backend {
        Backend {
            name: name.to_string(),
            state: Arc::new(Mutex::new(MockState {
                next_handle: 1,
                handles: HashMap::new(),
                fail_sources: HashSet::new(),
                permission_granted: true,
                capture_started: None,
                captures_finished: 0,
            })),
        }
    }

    /// Makes subsequent loads of the given source reference fail.
    pub fn fail_source(&self, source_ref: &str) {
        self.state.lock().fail_sources.insert(source_ref.to_string());
    }

    /// Makes recording permission requests come back denied.
    pub fn deny_recording_permission(&self) {
        self.state.lock().permission_granted = false;
    }

    /// Returns the number of live handles.
    pub fn handle_count(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// Returns a snapshot of the handle's observable state.
    pub fn handle(&self, handle: HandleId) -> Option<MockHandle> {
        self.state.lock().handles.get(&handle).cloned()
    }

    /// Returns a snapshot of the handle loaded for the given source reference.
    pub fn handle_for_source(&self, source_ref: &str) -> Option<MockHandle> {
        self.state
            .lock()
            .handles
            .values()
            .find(|h| h.source_ref == source_ref)
            .cloned()
    }

    /// Returns true if a capture is in flight.
    pub fn is_capturing(&self) -> bool {
        self.state.lock().capture_started.is_some()
    }

    fn with_handle<T>(
        &self,
        handle: HandleId,
        f: impl FnOnce(&mut MockHandle) -> T,
    ) -> Result<T, BackendError> {
        let mut state = self.state.lock();
        state
            .handles
            .get_mut(&handle)
            .map(f)
            .ok_or(BackendError::UnknownHandle(handle))
    }
}

impl super::Backend for Backend {
    fn create_handle(&self, source_ref: &str) -> Result<HandleId, BackendError> {
        let mut state = self.state.lock();
        if state.fail_sources.contains(source_ref) {
            return Err(BackendError::Load {
                source_ref: source_ref.to_string(),
                reason: "mock load failure".to_string(),
            });
        }

        let handle = state.next_handle;
        state.next_handle += 1;
        state.handles.insert(
            handle,
            MockHandle {
                source_ref: source_ref.to_string(),
                playing: false,
                position: Duration::ZERO,
                gain: 1.0,
                play_count: 0,
                ops: Vec::new(),
            },
        );

        debug!(backend = self.name, source_ref, handle, "Handle created");
        Ok(handle)
    }

    fn play(&self, handle: HandleId, gain: f32) -> Result<(), BackendError> {
        self.with_handle(handle, |h| {
            h.playing = true;
            h.gain = gain;
            h.play_count += 1;
            h.ops.push(Op::Play(gain));
        })
    }

    fn stop(&self, handle: HandleId) -> Result<(), BackendError> {
        self.with_handle(handle, |h| {
            h.playing = false;
            h.ops.push(Op::Stop);
        })
    }

    fn set_position(&self, handle: HandleId, position: Duration) -> Result<(), BackendError> {
        self.with_handle(handle, |h| {
            h.position = position;
            h.ops.push(Op::SetPosition(position));
        })
    }

    fn set_volume(&self, handle: HandleId, gain: f32) -> Result<(), BackendError> {
        self.with_handle(handle, |h| {
            h.gain = gain;
            h.ops.push(Op::SetVolume(gain));
        })
    }

    fn unload(&self, handle: HandleId) -> Result<(), BackendError> {
        self.state
            .lock()
            .handles
            .remove(&handle)
            .map(|_| ())
            .ok_or(BackendError::UnknownHandle(handle))
    }

    fn request_recording_permission(&self) -> Result<bool, BackendError> {
        Ok(self.state.lock().permission_granted)
    }

    fn start_capture(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.capture_started.is_some() {
            return Err(BackendError::CaptureInProgress);
        }
        state.capture_started = Some(Instant::now());
        Ok(())
    }

    fn stop_capture(&self) -> Result<Capture, BackendError> {
        let mut state = self.state.lock();
        let started = state.capture_started.take().ok_or(BackendError::NoCapture)?;
        state.captures_finished += 1;
        let n = state.captures_finished;

        // A synthetic ramp so waveform consumers have something to render.
        let waveform = (0..32).map(|i| i as f32 / 31.0).collect();
        Ok(Capture {
            audio_ref: format!("mock://capture/{}", n),
            duration: started.elapsed(),
            waveform,
        })
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Backend>, BackendError> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Backend as _;
    use super::*;

    #[test]
    fn test_handle_lifecycle() {
        let backend = Backend::get("mock");
        let handle = backend.create_handle("asset://sounds/kick.wav").unwrap();
        assert_eq!(backend.handle_count(), 1);

        backend.play(handle, 0.8).unwrap();
        let snapshot = backend.handle(handle).unwrap();
        assert!(snapshot.playing);
        assert_eq!(snapshot.gain, 0.8);

        backend.stop(handle).unwrap();
        assert!(!backend.handle(handle).unwrap().playing);

        backend.unload(handle).unwrap();
        assert_eq!(backend.handle_count(), 0);
        assert!(matches!(
            backend.play(handle, 1.0),
            Err(BackendError::UnknownHandle(_))
        ));
    }

    #[test]
    fn test_fail_source() {
        let backend = Backend::get("mock");
        backend.fail_source("asset://sounds/snare.wav");

        assert!(backend.create_handle("asset://sounds/kick.wav").is_ok());
        assert!(matches!(
            backend.create_handle("asset://sounds/snare.wav"),
            Err(BackendError::Load { .. })
        ));
    }

    #[test]
    fn test_capture_mutual_exclusion() {
        let backend = Backend::get("mock");
        assert!(matches!(
            backend.stop_capture(),
            Err(BackendError::NoCapture)
        ));

        backend.start_capture().unwrap();
        assert!(backend.is_capturing());
        assert!(matches!(
            backend.start_capture(),
            Err(BackendError::CaptureInProgress)
        ));

        let capture = backend.stop_capture().unwrap();
        assert!(!backend.is_capturing());
        assert_eq!(capture.audio_ref, "mock://capture/1");
        assert_eq!(capture.waveform.len(), 32);
    }

    #[test]
    fn test_ops_are_recorded_in_order() {
        let backend = Backend::get("mock");
        let handle = backend.create_handle("asset://sounds/kick.wav").unwrap();

        backend.stop(handle).unwrap();
        backend.set_position(handle, Duration::ZERO).unwrap();
        backend.set_volume(handle, 0.5).unwrap();
        backend.play(handle, 0.5).unwrap();

        let ops = backend.handle(handle).unwrap().ops;
        assert_eq!(
            ops,
            vec![
                Op::Stop,
                Op::SetPosition(Duration::ZERO),
                Op::SetVolume(0.5),
                Op::Play(0.5),
            ]
        );
    }
}
