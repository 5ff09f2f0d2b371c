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

//! The top-level engine façade.
//!
//! Owns the active kit and settings, orchestrates the sound pool, scheduler
//! and recorder, and runs every persistence round-trip. All store calls are
//! best-effort: a failure degrades to in-memory-only operation and never
//! interrupts playback or recording.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use tracing::{info, span, warn, Level, Span};

use crate::audio::Backend;
use crate::events::{EngineEvent, EventBus};
use crate::haptics::{Haptics, ImpactStyle};
use crate::kit::{Kit, KitError};
use crate::pattern::Pattern;
use crate::pool::SoundPool;
use crate::recorder::{Recorder, RecorderError, StartOutcome};
use crate::scheduler::{PatternScheduler, SchedulerError};
use crate::session::Session;
use crate::settings::{Settings, SettingsUpdate};
use crate::store::{Store, StoreError};

struct EngineState {
    /// The active kit. All loaded voices belong to it.
    kit: Kit,
    settings: Settings,
    /// Cached lists restored from the store for browsing.
    kits: Vec<Kit>,
    patterns: Vec<Pattern>,
    sessions: Vec<Session>,
    /// Patterns played since the last finished recording; drained into the
    /// session when a recording completes.
    session_patterns: Vec<Pattern>,
}

/// Coordinates initialization, kit switching, settings propagation and
/// persistence for the drum kit engine.
pub struct Controller {
    store: Arc<dyn Store>,
    haptics: Arc<dyn Haptics>,
    pool: Arc<SoundPool>,
    scheduler: PatternScheduler,
    recorder: Recorder,
    events: EventBus,
    state: RwLock<EngineState>,
    user_id: String,
    /// The logging span.
    span: Span,
}

impl Controller {
    /// Creates a new controller with injected collaborators. The engine is
    /// inert until `initialize` is called.
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<dyn Store>,
        haptics: Arc<dyn Haptics>,
        user_id: &str,
    ) -> Controller {
        let events = EventBus::new();
        let pool = Arc::new(SoundPool::new(backend.clone()));
        let scheduler = PatternScheduler::new(pool.clone(), events.clone());
        let recorder = Recorder::new(backend);

        Controller {
            store,
            haptics,
            pool,
            scheduler,
            recorder,
            events,
            state: RwLock::new(EngineState {
                kit: Kit::default_kit(),
                settings: Settings::default(),
                kits: Vec::new(),
                patterns: Vec::new(),
                sessions: Vec::new(),
                session_patterns: Vec::new(),
            }),
            user_id: user_id.to_string(),
            span: span!(Level::INFO, "controller"),
        }
    }

    /// Initializes the engine: restores settings and the saved kit, pattern
    /// and session lists from the store, then loads the active kit into the
    /// pool. Tolerates the store being entirely unavailable by degrading to
    /// defaults and in-memory-only operation.
    pub fn initialize(&self) {
        let _enter = self.span.enter();

        let settings = match self.store.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(err = %e, "Unable to restore settings, using defaults");
                Settings::default()
            }
        };

        let kits = self.store.load_kits().unwrap_or_else(|e| {
            warn!(err = %e, "Unable to restore kits");
            Vec::new()
        });
        let patterns = self.store.load_patterns(None).unwrap_or_else(|e| {
            warn!(err = %e, "Unable to restore patterns");
            Vec::new()
        });
        let sessions = self.store.load_sessions(None).unwrap_or_else(|e| {
            warn!(err = %e, "Unable to restore sessions");
            Vec::new()
        });

        // The last saved kit becomes active; fall back to the built-in kit.
        let kit = kits.last().cloned().unwrap_or_else(Kit::default_kit);

        self.pool.set_master_volume(settings.master_volume);
        self.pool.unload_all();
        self.pool.load(&kit);

        info!(
            kit = kit.id,
            kits = kits.len(),
            patterns = patterns.len(),
            sessions = sessions.len(),
            master_volume = settings.master_volume,
            "Engine initialized"
        );

        let mut state = self.state.write();
        state.kit = kit;
        state.settings = settings;
        state.kits = kits;
        state.patterns = patterns;
        state.sessions = sessions;
    }

    /// Triggers a pad of the active kit at the given velocity. Unknown sound
    /// ids are a no-op. Fires a haptic impact when enabled in settings.
    pub fn trigger_pad(&self, sound_id: &str, velocity: f32) {
        let velocity = velocity.clamp(0.0, 1.0);
        if !self.pool.trigger(sound_id, velocity) {
            return;
        }

        if self.state.read().settings.haptic_feedback {
            self.haptics.impact(ImpactStyle::for_velocity(velocity));
        }
        self.events.emit(EngineEvent::PadTriggered {
            sound_id: sound_id.to_string(),
            velocity,
        });
    }

    /// Starts playing a pattern, stopping any active one first. The pattern
    /// is remembered for the session record of the next finished recording.
    pub async fn play_pattern(&self, pattern: Pattern) -> Result<(), SchedulerError> {
        pattern.validate()?;

        {
            let mut state = self.state.write();
            if !state.session_patterns.iter().any(|p| p.id == pattern.id) {
                state.session_patterns.push(pattern.clone());
            }
        }
        self.scheduler.play(pattern).await
    }

    /// Stops the active pattern, if any.
    pub async fn stop_pattern(&self) {
        self.scheduler.stop().await;
    }

    /// Returns true if a pattern is currently playing.
    pub async fn is_pattern_playing(&self) -> bool {
        self.scheduler.is_playing().await
    }

    /// The beat counter of the active pattern run.
    pub fn current_beat(&self) -> u32 {
        self.scheduler.current_beat()
    }

    /// Atomically replaces the active kit: the scheduler is stopped, every
    /// current voice is unloaded and the new kit's voices are loaded before
    /// triggering resumes. No stale voice remains observable.
    pub async fn switch_kit(&self, kit: Kit) -> Result<(), KitError> {
        kit.validate()?;
        self.scheduler.stop().await;

        let kit_id = kit.id.clone();
        {
            let mut state = self.state.write();
            self.pool.unload_all();
            self.pool.load(&kit);
            state.kit = kit;
        }

        info!(kit = kit_id, "Switched kit");
        self.events.emit(EngineEvent::KitSwitched { kit_id });
        Ok(())
    }

    /// Merges a partial settings update, fans a master volume change out to
    /// every loaded voice, and persists the full settings object.
    ///
    /// An error means the settings were applied in memory but not durably
    /// stored; the engine keeps operating on the new values.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<(), StoreError> {
        let settings = {
            let mut state = self.state.write();
            if state.settings.apply(update) {
                self.pool.set_master_volume(state.settings.master_volume);
            }
            state.settings.clone()
        };
        self.events.emit(EngineEvent::SettingsUpdated);

        self.store.save_settings(&settings).map_err(|e| {
            warn!(err = %e, "Settings applied in memory but not durably stored");
            e
        })
    }

    /// Saves the active kit to the store and refreshes the cached kit list.
    pub fn save_current_kit(&self) -> Result<String, StoreError> {
        let kit = self.state.read().kit.clone();
        let id = self.store.save_kit(&kit)?;

        match self.store.load_kits() {
            Ok(kits) => self.state.write().kits = kits,
            Err(e) => warn!(err = %e, "Unable to refresh kit list"),
        }
        info!(kit = id, "Kit saved");
        Ok(id)
    }

    /// Saves a pattern for the active kit and refreshes the cached pattern
    /// list.
    pub fn save_pattern(&self, pattern: &Pattern) -> Result<String, StoreError> {
        let kit_id = self.state.read().kit.id.clone();
        let id = self.store.save_pattern(pattern, &kit_id)?;

        match self.store.load_patterns(None) {
            Ok(patterns) => self.state.write().patterns = patterns,
            Err(e) => warn!(err = %e, "Unable to refresh pattern list"),
        }
        Ok(id)
    }

    /// Starts a recording. A no-op if recording is disabled in settings.
    pub fn start_recording(&self) -> Result<StartOutcome, RecorderError> {
        let settings = self.state.read().settings.clone();
        let outcome = self.recorder.start(&settings)?;
        if outcome == StartOutcome::Started {
            self.events.emit(EngineEvent::RecordingStarted);
        }
        Ok(outcome)
    }

    /// Finalizes the in-flight recording into a session bound to the active
    /// kit and the patterns played since the last session, and saves it
    /// best-effort.
    pub fn stop_recording(&self) -> Result<Session, RecorderError> {
        let recording = self.recorder.stop()?;
        let recording_id = recording.id.clone();

        let (kit_id, patterns) = {
            let mut state = self.state.write();
            (
                state.kit.id.clone(),
                std::mem::take(&mut state.session_patterns),
            )
        };
        let session = Session::new(&self.user_id, &kit_id, patterns, recording);

        if let Err(e) = self.store.save_session(&session) {
            warn!(
                session = session.id,
                err = %e,
                "Session kept in memory but not durably stored"
            );
        }
        self.state.write().sessions.push(session.clone());

        self.events.emit(EngineEvent::RecordingFinished { recording_id });
        Ok(session)
    }

    /// Returns true if a recording is in flight.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Stops playback and recording and releases every loaded voice.
    pub async fn teardown(&self) {
        let _enter = self.span.enter();
        self.scheduler.stop().await;
        self.recorder.abort();
        self.pool.unload_all();
        info!("Engine torn down");
    }

    /// Returns a receiver for engine status events.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// The current settings.
    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    /// The active kit.
    pub fn active_kit(&self) -> Kit {
        self.state.read().kit.clone()
    }

    /// The cached list of stored kits.
    pub fn kits(&self) -> Vec<Kit> {
        self.state.read().kits.clone()
    }

    /// The cached list of stored patterns.
    pub fn patterns(&self) -> Vec<Pattern> {
        self.state.read().patterns.clone()
    }

    /// The cached list of stored sessions.
    pub fn sessions(&self) -> Vec<Session> {
        self.state.read().sessions.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::mock;
    use crate::haptics::CountingHaptics;
    use crate::kit::SoundCategory;
    use crate::pattern::Beat;
    use crate::store::file::FileStore;
    use crate::store::memory::MemoryStore;

    /// A store that always fails, simulating an unavailable backing service.
    struct FailingStore;

    impl Store for FailingStore {
        fn save_kit(&self, _: &Kit) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn load_kits(&self) -> Result<Vec<Kit>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn save_pattern(&self, _: &Pattern, _: &str) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn load_patterns(&self, _: Option<&str>) -> Result<Vec<Pattern>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn save_session(&self, _: &Session) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn load_sessions(&self, _: Option<&str>) -> Result<Vec<Session>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn save_settings(&self, _: &Settings) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
        fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
    }

    struct Fixture {
        backend: Arc<mock::Backend>,
        store: Arc<MemoryStore>,
        haptics: Arc<CountingHaptics>,
        controller: Controller,
    }

    fn create_controller() -> Fixture {
        let backend = Arc::new(mock::Backend::get("mock"));
        let store = Arc::new(MemoryStore::new());
        let haptics = Arc::new(CountingHaptics::default());
        let controller = Controller::new(
            backend.clone(),
            store.clone(),
            haptics.clone(),
            "local",
        );
        Fixture {
            backend,
            store,
            haptics,
            controller,
        }
    }

    fn small_kit(id: &str, sound_ids: &[&str]) -> Kit {
        let mut kit = Kit::default_kit();
        kit.id = id.to_string();
        kit.sounds = sound_ids
            .iter()
            .map(|sound_id| crate::kit::SoundAsset {
                id: sound_id.to_string(),
                internal_name: sound_id.to_string(),
                display_name: sound_id.to_string(),
                source_ref: format!("asset://sounds/{}/{}.wav", id, sound_id),
                color: "#888888".to_string(),
                category: SoundCategory::Percussion,
                gain: 1.0,
                pitch: None,
                reverb: None,
                delay: None,
            })
            .collect();
        kit
    }

    #[test]
    fn test_initialize_with_empty_store_uses_defaults() {
        let f = create_controller();
        f.controller.initialize();

        assert_eq!(f.controller.active_kit().id, "default");
        assert_eq!(f.backend.handle_count(), 9);
        assert_eq!(f.controller.settings(), Settings::default());
    }

    #[test]
    fn test_initialize_tolerates_unavailable_store() {
        let backend = Arc::new(mock::Backend::get("mock"));
        let controller = Controller::new(
            backend.clone(),
            Arc::new(FailingStore),
            Arc::new(CountingHaptics::default()),
            "local",
        );

        controller.initialize();
        assert_eq!(controller.active_kit().id, "default");
        assert_eq!(backend.handle_count(), 9);

        // Triggering still works; persistence degradation is invisible here.
        controller.trigger_pad("kick", 1.0);
        assert!(backend
            .handle_for_source("asset://sounds/kick.wav")
            .unwrap()
            .playing);
    }

    #[test]
    fn test_initialize_restores_last_saved_kit_and_settings() {
        let f = create_controller();
        f.store.save_kit(&small_kit("first", &["a"])).unwrap();
        f.store.save_kit(&small_kit("second", &["b", "c"])).unwrap();
        f.store
            .save_settings(&Settings {
                master_volume: 0.25,
                ..Settings::default()
            })
            .unwrap();

        f.controller.initialize();

        assert_eq!(f.controller.active_kit().id, "second");
        assert_eq!(f.backend.handle_count(), 2);
        assert_eq!(f.controller.settings().master_volume, 0.25);
        assert_eq!(f.controller.kits().len(), 2);
    }

    #[test]
    fn test_initialize_restores_last_saved_kit_from_file_store() {
        let dir = tempfile::tempdir().expect("Unable to create temp directory");
        let store = Arc::new(FileStore::new(dir.path()));
        store.save_kit(&small_kit("first", &["a"])).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.save_kit(&small_kit("second", &["b", "c"])).unwrap();

        let backend = Arc::new(mock::Backend::get("mock"));
        let controller = Controller::new(
            backend.clone(),
            store,
            Arc::new(CountingHaptics::default()),
            "local",
        );
        controller.initialize();

        // The most recently saved kit wins regardless of directory iteration
        // order.
        assert_eq!(controller.active_kit().id, "second");
        assert_eq!(backend.handle_count(), 2);
    }

    #[test]
    fn test_trigger_pad_fires_haptics_when_enabled() {
        let f = create_controller();
        f.controller.initialize();

        f.controller.trigger_pad("kick", 1.0);
        f.controller.trigger_pad("snare", 0.1);
        assert_eq!(f.haptics.total(), 2);
        assert_eq!(f.haptics.count(ImpactStyle::Heavy), 1);
        assert_eq!(f.haptics.count(ImpactStyle::Light), 1);

        // Unknown pads fire nothing.
        f.controller.trigger_pad("cowbell", 1.0);
        assert_eq!(f.haptics.total(), 2);

        f.controller
            .update_settings(&SettingsUpdate {
                haptic_feedback: Some(false),
                ..SettingsUpdate::default()
            })
            .unwrap();
        f.controller.trigger_pad("kick", 1.0);
        assert_eq!(f.haptics.total(), 2);
    }

    #[test]
    fn test_trigger_pad_emits_event() {
        let f = create_controller();
        f.controller.initialize();
        let rx = f.controller.subscribe();

        f.controller.trigger_pad("kick", 0.9);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::PadTriggered {
                sound_id: "kick".to_string(),
                velocity: 0.9,
            }
        );
    }

    #[tokio::test]
    async fn test_switch_kit_is_atomic() {
        let f = create_controller();
        f.controller.initialize();
        assert_eq!(f.backend.handle_count(), 9);

        f.controller
            .switch_kit(small_kit("electro", &["bass", "zap"]))
            .await
            .unwrap();

        // Only the new kit's voices remain loaded.
        assert_eq!(f.backend.handle_count(), 2);
        f.controller.trigger_pad("kick", 1.0);
        assert!(f.backend.handle_for_source("asset://sounds/kick.wav").is_none());

        f.controller.trigger_pad("zap", 1.0);
        assert!(f
            .backend
            .handle_for_source("asset://sounds/electro/zap.wav")
            .unwrap()
            .playing);
    }

    #[tokio::test]
    async fn test_switch_kit_rejects_invalid() {
        let f = create_controller();
        f.controller.initialize();

        let mut bad = small_kit("bad", &["a"]);
        bad.bpm = -1.0;
        assert!(matches!(
            f.controller.switch_kit(bad).await,
            Err(KitError::InvalidBpm(_))
        ));

        // The active kit is untouched.
        assert_eq!(f.controller.active_kit().id, "default");
        assert_eq!(f.backend.handle_count(), 9);
    }

    #[test]
    fn test_update_settings_persists_and_fans_out_volume() {
        let f = create_controller();
        f.controller.initialize();
        f.controller.trigger_pad("kick", 1.0);

        f.controller
            .update_settings(&SettingsUpdate::master_volume(0.3))
            .unwrap();

        // Persisted...
        assert_eq!(
            f.store.load_settings().unwrap().unwrap().master_volume,
            0.3
        );
        // ...and already applied to the loaded voice.
        assert_eq!(
            f.backend
                .handle_for_source("asset://sounds/kick.wav")
                .unwrap()
                .gain,
            0.3
        );
    }

    #[test]
    fn test_update_settings_survives_store_failure() {
        let backend = Arc::new(mock::Backend::get("mock"));
        let controller = Controller::new(
            backend,
            Arc::new(FailingStore),
            Arc::new(CountingHaptics::default()),
            "local",
        );
        controller.initialize();

        let result = controller.update_settings(&SettingsUpdate::master_volume(0.3));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        // In-memory settings still reflect the change.
        assert_eq!(controller.settings().master_volume, 0.3);
    }

    #[test]
    fn test_save_current_kit_refreshes_list() {
        let f = create_controller();
        f.controller.initialize();
        assert!(f.controller.kits().is_empty());

        let id = f.controller.save_current_kit().unwrap();
        assert_eq!(id, "default");
        assert_eq!(f.controller.kits().len(), 1);
    }

    #[tokio::test]
    async fn test_recording_produces_session_with_played_patterns() {
        let f = create_controller();
        f.controller.initialize();

        assert_eq!(
            f.controller.start_recording().unwrap(),
            StartOutcome::Started
        );
        assert!(f.controller.is_recording());

        let mut pattern = Pattern::demo();
        pattern.bpm = 600.0;
        pattern.looped = false;
        f.controller.play_pattern(pattern).await.unwrap();
        f.controller.stop_pattern().await;

        let session = f.controller.stop_recording().unwrap();
        assert!(!f.controller.is_recording());
        assert_eq!(session.kit_id, "default");
        assert_eq!(session.patterns.len(), 1);
        let recording = session.recording.as_ref().unwrap();
        assert_eq!(recording.session_id, session.id);

        // The session made it to the store and the cached list.
        assert_eq!(f.store.load_sessions(None).unwrap().len(), 1);
        assert_eq!(f.controller.sessions().len(), 1);
    }

    #[test]
    fn test_recording_disabled_is_noop() {
        let f = create_controller();
        f.controller.initialize();
        f.controller
            .update_settings(&SettingsUpdate {
                recording_enabled: Some(false),
                ..SettingsUpdate::default()
            })
            .unwrap();

        let rx = f.controller.subscribe();
        // Drain the settings event.
        while rx.try_recv().is_ok() {}

        assert_eq!(
            f.controller.start_recording().unwrap(),
            StartOutcome::Disabled
        );
        assert!(!f.controller.is_recording());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_second_recording_start_is_rejected() {
        let f = create_controller();
        f.controller.initialize();

        f.controller.start_recording().unwrap();
        assert!(matches!(
            f.controller.start_recording(),
            Err(RecorderError::AlreadyRecording)
        ));
        assert!(f.controller.is_recording());
    }

    /// The full scenario: load the default kit, hit a pad, run a short
    /// non-looping pattern to completion, and end with an idle engine.
    #[tokio::test]
    async fn test_end_to_end_performance() {
        let f = create_controller();
        f.controller.initialize();
        assert_eq!(f.backend.handle_count(), 9);

        f.controller.trigger_pad("kick", 1.0);
        let kick = f
            .backend
            .handle_for_source("asset://sounds/kick.wav")
            .unwrap();
        assert!(kick.playing);
        // Default master volume applies to the full-velocity hit.
        assert_eq!(kick.gain, Settings::default().master_volume);

        // 600 bpm, max offset 4: beats fire within 400ms and the run ends
        // one tick later.
        let pattern = Pattern {
            id: "short".to_string(),
            name: "Short".to_string(),
            beats: vec![
                Beat {
                    sound_id: "snare".to_string(),
                    offset_beats: 0.0,
                    velocity: 1.0,
                    duration_beats: None,
                },
                Beat {
                    sound_id: "snare".to_string(),
                    offset_beats: 4.0,
                    velocity: 1.0,
                    duration_beats: None,
                },
            ],
            bpm: 600.0,
            time_signature: "4/4".to_string(),
            looped: false,
        };
        f.controller.play_pattern(pattern).await.unwrap();
        assert!(f.controller.is_pattern_playing().await);

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(!f.controller.is_pattern_playing().await);
        assert_eq!(f.controller.current_beat(), 5);
        assert_eq!(
            f.backend
                .handle_for_source("asset://sounds/snare.wav")
                .unwrap()
                .play_count,
            2
        );

        f.controller.teardown().await;
        assert_eq!(f.backend.handle_count(), 0);
    }
}
