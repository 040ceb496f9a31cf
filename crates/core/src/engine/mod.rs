//! The synchronization engine.
//!
//! [`SyncEngine`] owns every piece of long-lived state: the chunk queue, the
//! filtered pose and velocity, and the mute flag. The renderer calls
//! [`SyncEngine::frame`] once per display frame; the transport calls
//! [`SyncEngine::submit`]. Both happen on the same thread, so callers that
//! need to share an engine across threads wrap it in a mutex.

use serde::Serialize;

use crate::{
    audio::{MediaBackend, NoAudioBackend},
    chunk::{Chunk, ChunkId, ChunkSubmission},
    clock::{Clock, PlaybackClock, SystemClock},
    config::EngineConfig,
    crossfade::Crossfade,
    motion::{IdleRelaxation, MotionFilter},
    pose::Pose,
    queue::{ActiveChunk, ChunkQueue},
    Result,
};

/// Nominal frame delta used for the very first tick.
const FIRST_TICK_DT: f64 = 1.0 / 60.0;

/// Lifecycle transitions, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "chunk", rename_all = "snake_case")]
pub enum EngineEvent {
    Activated(ChunkId),
    Completed(ChunkId),
    /// Dropped by [`SyncEngine::stop`] without completing.
    Abandoned(ChunkId),
}

/// Owned snapshot of the scheduler for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub active: Option<ChunkId>,
    pub pending: usize,
    pub muted: bool,
    /// Playback position within the active chunk, in seconds.
    pub position: Option<f64>,
    /// Duration of the active chunk, in seconds.
    pub duration: Option<f64>,
    pub pose: Pose,
}

pub struct SyncEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    backend: Box<dyn MediaBackend>,
    queue: ChunkQueue,
    filter: MotionFilter,
    idle: IdleRelaxation,
    muted: bool,
    next_id: u64,
    last_tick: Option<f64>,
    events: Vec<EngineEvent>,
}

impl SyncEngine<SystemClock> {
    /// Creates an engine on the wall clock without audio output.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> SyncEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: MotionFilter::new(config.motion.clone()),
            idle: IdleRelaxation::new(&config.idle),
            config,
            clock,
            backend: Box::new(NoAudioBackend),
            queue: ChunkQueue::new(),
            muted: false,
            next_id: 0,
            last_tick: None,
            events: Vec::new(),
        })
    }

    /// Replaces the media backend used for chunks activated from now on.
    pub fn with_backend(mut self, backend: impl MediaBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Queues a chunk for playback and activates it right away when nothing
    /// else is playing.
    pub fn submit(&mut self, submission: ChunkSubmission) -> ChunkId {
        self.next_id += 1;
        let id = ChunkId(self.next_id);
        let chunk = Chunk::from_submission(id, submission, &self.config.timeline);
        let sequence = chunk.sequence();
        tracing::debug!(
            %id,
            frames = chunk.frames().len(),
            chunk_index = ?sequence.index,
            offset_ms = ?sequence.offset_ms,
            "chunk submitted"
        );

        self.queue.submit(chunk);
        let now = self.clock.now();
        self.activate_pending(now);
        id
    }

    /// Advances the engine to the current clock time and returns the pose
    /// to display. Safe to call at any rate.
    pub fn frame(&mut self) -> Pose {
        let now = self.clock.now();
        let dt = self.step_dt(now);

        self.poll_active(now);

        match self.queue.active() {
            Some(active) => {
                let target = active.target(now);
                self.filter.step(&target, dt)
            }
            None => self.idle.relax(&mut self.filter, dt),
        }
    }

    /// Last pose produced, without advancing anything.
    pub fn current_pose(&self) -> Pose {
        self.filter.position()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Silences audio on the active chunk and on chunks activated later.
    /// Pose computation is unaffected.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        if let Some(active) = self.queue.active_mut() {
            active.playback.set_muted(muted);
        }
        tracing::debug!(muted, "mute toggled");
    }

    /// Drops the active chunk and everything pending. The pose is not reset;
    /// it relaxes on the following ticks.
    pub fn stop(&mut self) {
        let (active, pending) = self.queue.flush();
        if let Some(mut active) = active {
            active.playback.halt();
            self.events.push(EngineEvent::Abandoned(active.id()));
            tracing::info!(id = %active.id(), pending = pending.len(), "playback stopped");
        }
        for chunk in pending {
            self.events.push(EngineEvent::Abandoned(chunk.id()));
        }
    }

    /// External "media ended" signal for chunk `id`. Ignored unless `id` is
    /// the active chunk.
    pub fn notify_media_ended(&mut self, id: ChunkId) {
        let is_active = match self.queue.active_mut() {
            Some(active) if active.id() == id => {
                active.playback.mark_ended();
                true
            }
            _ => false,
        };
        if is_active {
            let now = self.clock.now();
            self.complete_active(now);
        }
    }

    /// Takes the lifecycle events recorded since the previous call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn status(&self) -> EngineStatus {
        let now = self.clock.now();
        let active = self.queue.active();
        EngineStatus {
            active: active.map(ActiveChunk::id),
            pending: self.queue.pending_len(),
            muted: self.muted,
            position: active.map(|a| a.elapsed(now)),
            duration: active.map(ActiveChunk::duration),
            pose: self.filter.position(),
        }
    }

    fn step_dt(&mut self, now: f64) -> f32 {
        let raw = match self.last_tick {
            Some(last) => now - last,
            None => FIRST_TICK_DT,
        };
        self.last_tick = Some(now);
        self.filter.clamp_dt(raw)
    }

    /// Learns the media duration and completes the active chunk when its
    /// media ended or its fallback timer ran out.
    fn poll_active(&mut self, now: f64) {
        let grace = self.config.timeline.completion_grace_ms / 1000.0;
        let done = match self.queue.active_mut() {
            Some(active) => {
                if let Some(duration) = active.sync_media_duration() {
                    tracing::debug!(id = %active.id(), duration, "timeline rescaled to media duration");
                }
                let duration = active.duration();
                active.playback.has_ended() || active.playback.fallback_due(now, duration, grace)
            }
            None => false,
        };
        if done {
            self.complete_active(now);
        }
    }

    /// The single `active -> completed` transition.
    fn complete_active(&mut self, now: f64) {
        if let Some(mut finished) = self.queue.complete_active() {
            finished.playback.halt();
            self.events.push(EngineEvent::Completed(finished.id()));
            tracing::info!(id = %finished.id(), "chunk completed");
        }
        self.activate_pending(now);
    }

    fn activate_pending(&mut self, now: f64) {
        let fade_from = self.filter.position();
        let window = f64::from(self.config.crossfade.window_ms) / 1000.0;
        let muted = self.muted;
        let backend = &mut self.backend;

        let activated = self.queue.activate_next(|mut chunk| {
            let playback = match chunk.audio() {
                Some(payload) => match backend.open(payload) {
                    Ok(media) => PlaybackClock::with_media(now, media, muted),
                    Err(err) => {
                        tracing::warn!(id = %chunk.id(), error = %err, "audio unavailable; using wall clock");
                        PlaybackClock::wall(now)
                    }
                },
                None => PlaybackClock::wall(now),
            };
            if let Some(duration) = playback.media_duration() {
                chunk.timeline_mut().rescale(duration);
            }
            ActiveChunk {
                chunk,
                playback,
                fade: Crossfade::new(fade_from, now, window),
            }
        });

        if let Some(active) = activated {
            let id = active.id();
            tracing::info!(
                %id,
                duration = active.duration(),
                media = active.playback.has_media(),
                "chunk activated"
            );
            self.events.push(EngineEvent::Activated(id));
        }
    }
}

impl<C: Clock> std::fmt::Debug for SyncEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("queue", &self.queue)
            .field("muted", &self.muted)
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use proptest::prelude::*;

    use super::*;
    use crate::{
        audio::{wav_bytes, AudioPayload, ClockedBackend, MediaHandle},
        clock::ManualClock,
        config::MotionConfig,
        pose::CHANNELS,
        VisemeSyncError,
    };

    const TICK: f64 = 1.0 / 60.0;

    fn engine_with(motion: MotionConfig) -> (SyncEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = EngineConfig {
            motion,
            ..EngineConfig::default()
        };
        let engine = SyncEngine::with_clock(config, clock.clone()).unwrap();
        (engine, clock)
    }

    fn jaw_rows(values: &[f32]) -> Vec<Vec<f32>> {
        values
            .iter()
            .map(|v| {
                let mut row = vec![0.0; CHANNELS];
                row[0] = *v;
                row
            })
            .collect()
    }

    /// Ticks at 60 Hz until `until` seconds on the clock.
    fn run_until(engine: &mut SyncEngine<ManualClock>, clock: &ManualClock, until: f64) -> Pose {
        let mut pose = engine.frame();
        while clock.now() + TICK <= until + 1e-9 {
            clock.advance(TICK);
            pose = engine.frame();
        }
        pose
    }

    /// Media pinned at a fixed playback position, so the clock can keep
    /// ticking at 60 Hz while the chunk is sampled at one instant. Its
    /// duration is long enough that the stall deadline never arrives.
    #[derive(Debug)]
    struct PinnedMedia {
        position: f64,
        duration: f64,
    }

    impl MediaHandle for PinnedMedia {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn position(&self) -> Option<f64> {
            Some(self.position)
        }
        fn duration(&self) -> Option<f64> {
            Some(self.duration)
        }
        fn has_ended(&self) -> bool {
            false
        }
    }

    struct PinnedBackend(f64);

    const PINNED_DURATION: f64 = 100.0;

    impl MediaBackend for PinnedBackend {
        fn open(&mut self, _payload: &AudioPayload) -> Result<Box<dyn MediaHandle>> {
            Ok(Box::new(PinnedMedia {
                position: self.0,
                duration: PINNED_DURATION,
            }))
        }
    }

    /// Settled jaw value of a 0 -> 0.5 -> 0 chunk sampled at `fraction` of
    /// its length.
    fn settled_jaw_at(fraction: f64) -> f32 {
        let clock = ManualClock::new();
        let mut engine = SyncEngine::with_clock(EngineConfig::default(), clock.clone())
            .unwrap()
            .with_backend(PinnedBackend(fraction * PINNED_DURATION));
        engine.submit(
            ChunkSubmission::new(jaw_rows(&[0.0, 0.5, 0.0]))
                .with_times(vec![0.0, 0.5, 1.0])
                .with_audio(vec![0], None),
        );
        run_until(&mut engine, &clock, 10.0).channel(0)
    }

    #[test]
    fn peak_sample_is_reached_with_settled_filter() {
        let expected = 0.5 * MotionConfig::default().exaggeration;
        let peak = settled_jaw_at(0.5);
        assert!((peak - expected).abs() < 1e-3, "{peak}");

        let shoulder = settled_jaw_at(0.25);
        assert!(shoulder > 0.0 && shoulder < expected, "{shoulder}");
    }

    #[test]
    fn samples_are_reproduced_exactly_without_filter() {
        let (mut engine, clock) = engine_with(MotionConfig::passthrough());
        let values = [0.1, 0.7, 0.4, 0.9, 0.2];
        let times = vec![0.0, 0.2, 0.3, 0.6, 0.8];
        engine.submit(ChunkSubmission::new(jaw_rows(&values)).with_times(times.clone()));

        for (k, t) in times.iter().enumerate().skip(1) {
            clock.set(*t);
            let pose = engine.frame();
            assert_eq!(pose.channel(0), values[k], "sample {k}");
        }
    }

    #[test]
    fn chunks_play_in_submission_order() {
        let (mut engine, clock) = engine_with(MotionConfig::default());
        let a = engine.submit(ChunkSubmission::new(jaw_rows(&[0.5, 0.5])).with_duration_ms(100.0));
        clock.advance(0.03);
        engine.frame();
        let b = engine.submit(ChunkSubmission::new(jaw_rows(&[0.2, 0.2])).with_duration_ms(100.0));
        clock.advance(0.5);
        let c = engine.submit(ChunkSubmission::new(jaw_rows(&[0.9, 0.9])).with_duration_ms(100.0));

        run_until(&mut engine, &clock, 2.0);

        assert_eq!(
            engine.drain_events(),
            vec![
                EngineEvent::Activated(a),
                EngineEvent::Completed(a),
                EngineEvent::Activated(b),
                EngineEvent::Completed(b),
                EngineEvent::Activated(c),
                EngineEvent::Completed(c),
            ]
        );
        assert_eq!(engine.status().active, None);
    }

    #[test]
    fn crossfade_blends_between_chunk_boundaries() {
        let (mut engine, clock) = engine_with(MotionConfig::passthrough());
        let a = engine.submit(ChunkSubmission::new(jaw_rows(&[0.8, 0.8])).with_duration_ms(200.0));
        let b = engine.submit(ChunkSubmission::new(jaw_rows(&[0.1, 0.1])).with_duration_ms(200.0));

        clock.set(0.2);
        assert!((engine.frame().channel(0) - 0.8).abs() < 1e-6);

        clock.set(0.3);
        let at_switch = engine.frame();
        assert_eq!(engine.status().active, Some(b));
        assert!((at_switch.channel(0) - 0.8).abs() < 1e-6);
        assert!(engine.drain_events().contains(&EngineEvent::Completed(a)));

        let window = f64::from(engine.config().crossfade.window_ms) / 1000.0;
        clock.advance(window / 2.0);
        let mid = engine.frame().channel(0);
        assert!(mid > 0.1 && mid < 0.8, "{mid}");
        assert!((mid - 0.45).abs() < 1e-3, "{mid}");

        clock.advance(window / 2.0);
        assert!((engine.frame().channel(0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn crossfade_bounds_the_boundary_jump() {
        let (mut engine, clock) = engine_with(MotionConfig::default());
        engine.submit(ChunkSubmission::new(jaw_rows(&[0.9, 0.9])).with_duration_ms(400.0));
        engine.submit(ChunkSubmission::new(jaw_rows(&[0.0, 0.0])).with_duration_ms(400.0));

        run_until(&mut engine, &clock, 0.4);
        let before = engine.current_pose();
        let mut previous = before;
        let mut largest_step = 0.0_f32;
        let fade_end = 0.45 + f64::from(engine.config().crossfade.window_ms) / 1000.0 + TICK;
        while clock.now() < fade_end {
            clock.advance(TICK);
            let pose = engine.frame();
            largest_step = largest_step.max(pose.max_distance(&previous));
            previous = pose;
        }

        let after = engine.current_pose();
        let target_gap = before.max_distance(&Pose::neutral());
        assert!(after.max_distance(&before) <= target_gap);
        assert!(largest_step < 0.25, "{largest_step}");
    }

    #[test]
    fn idle_engine_relaxes_to_neutral() {
        let (mut engine, clock) = engine_with(MotionConfig::default());
        engine.submit(ChunkSubmission::new(jaw_rows(&[1.0, 1.0])).with_duration_ms(300.0));
        run_until(&mut engine, &clock, 0.5);
        assert_eq!(engine.status().active, None);
        assert!(engine.current_pose().channel(0) > 0.5);

        let mut ticks = 0;
        while engine.current_pose().peak() > 1e-3 {
            clock.advance(TICK);
            engine.frame();
            ticks += 1;
            assert!(ticks < 5_000);
        }
    }

    #[test]
    fn stop_abandons_without_completing() {
        let (mut engine, clock) = engine_with(MotionConfig::default());
        let a = engine.submit(ChunkSubmission::new(jaw_rows(&[1.0, 1.0])).with_duration_ms(1000.0));
        let b = engine.submit(ChunkSubmission::new(jaw_rows(&[1.0, 1.0])).with_duration_ms(1000.0));
        run_until(&mut engine, &clock, 0.3);
        let before = engine.current_pose();

        engine.stop();
        assert_eq!(
            engine.drain_events(),
            vec![
                EngineEvent::Activated(a),
                EngineEvent::Abandoned(a),
                EngineEvent::Abandoned(b),
            ]
        );

        clock.advance(TICK);
        let after = engine.frame();
        assert!(after.channel(0) > 0.0);
        assert!(after.channel(0) <= before.channel(0));
        assert_eq!(engine.status().active, None);
        assert_eq!(engine.status().pending, 0);
    }

    #[test]
    fn media_duration_rescales_and_drives_completion() {
        let clock = ManualClock::new();
        let mut engine = SyncEngine::with_clock(EngineConfig::default(), clock.clone())
            .unwrap()
            .with_backend(ClockedBackend::new(clock.clone()));

        let id = engine.submit(
            ChunkSubmission::new(jaw_rows(&[0.0, 1.0, 0.0]))
                .with_times(vec![0.0, 0.5, 1.0])
                .with_audio(wav_bytes(8_000, 2.0), Some("wav".into())),
        );

        let status = engine.status();
        assert_eq!(status.active, Some(id));
        assert!((status.duration.unwrap() - 2.0).abs() < 1e-6);

        clock.set(1.0);
        engine.frame();
        assert!((engine.status().position.unwrap() - 1.0).abs() < 1e-6);

        clock.set(2.0);
        engine.frame();
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::Activated(id), EngineEvent::Completed(id)]
        );
    }

    #[test]
    fn undecodable_audio_falls_back_to_timer() {
        let clock = ManualClock::new();
        let mut engine = SyncEngine::with_clock(EngineConfig::default(), clock.clone())
            .unwrap()
            .with_backend(ClockedBackend::new(clock.clone()));

        let id = engine.submit(
            ChunkSubmission::new(jaw_rows(&[0.3, 0.3]))
                .with_duration_ms(500.0)
                .with_audio(vec![0xff; 32], None),
        );

        clock.set(0.5);
        engine.frame();
        assert_eq!(engine.status().active, Some(id));

        clock.set(0.56);
        engine.frame();
        assert_eq!(engine.status().active, None);
    }

    /// Media that accepts `play()` but never moves or ends.
    #[derive(Debug)]
    struct StalledMedia;

    impl MediaHandle for StalledMedia {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn position(&self) -> Option<f64> {
            Some(0.0)
        }
        fn duration(&self) -> Option<f64> {
            Some(0.5)
        }
        fn has_ended(&self) -> bool {
            false
        }
    }

    struct StalledBackend;

    impl MediaBackend for StalledBackend {
        fn open(&mut self, _payload: &AudioPayload) -> Result<Box<dyn MediaHandle>> {
            Ok(Box::new(StalledMedia))
        }
    }

    #[test]
    fn stalled_media_does_not_block_the_queue() {
        let clock = ManualClock::new();
        let mut engine = SyncEngine::with_clock(EngineConfig::default(), clock.clone())
            .unwrap()
            .with_backend(StalledBackend);

        let a = engine.submit(
            ChunkSubmission::new(jaw_rows(&[0.4, 0.4]))
                .with_duration_ms(500.0)
                .with_audio(vec![1], None),
        );
        let b = engine.submit(ChunkSubmission::new(jaw_rows(&[0.2, 0.2])).with_duration_ms(100.0));

        run_until(&mut engine, &clock, 0.5);
        assert_eq!(engine.status().active, Some(a));

        run_until(&mut engine, &clock, 2.0);
        assert_eq!(
            engine.drain_events(),
            vec![
                EngineEvent::Activated(a),
                EngineEvent::Completed(a),
                EngineEvent::Activated(b),
                EngineEvent::Completed(b),
            ]
        );
        assert_eq!(engine.status().active, None);
    }

    #[derive(Debug, Clone, Default)]
    struct SpyMedia {
        muted: Arc<AtomicBool>,
        played: Arc<AtomicBool>,
    }

    impl MediaHandle for SpyMedia {
        fn play(&mut self) -> Result<()> {
            self.played.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn pause(&mut self) {}
        fn set_muted(&mut self, muted: bool) {
            self.muted.store(muted, Ordering::SeqCst);
        }
        fn position(&self) -> Option<f64> {
            None
        }
        fn duration(&self) -> Option<f64> {
            Some(0.5)
        }
        fn has_ended(&self) -> bool {
            false
        }
    }

    struct SpyBackend(SpyMedia);

    impl MediaBackend for SpyBackend {
        fn open(&mut self, _payload: &AudioPayload) -> Result<Box<dyn MediaHandle>> {
            Ok(Box::new(self.0.clone()))
        }
    }

    #[test]
    fn mute_reaches_active_media_and_skips_future_playback() {
        let clock = ManualClock::new();
        let spy = SpyMedia::default();
        let mut engine = SyncEngine::with_clock(EngineConfig::default(), clock.clone())
            .unwrap()
            .with_backend(SpyBackend(spy.clone()));

        engine.submit(ChunkSubmission::new(jaw_rows(&[0.4, 0.4])).with_audio(vec![1], None));
        assert!(spy.played.load(Ordering::SeqCst));
        engine.set_muted(true);
        assert!(spy.muted.load(Ordering::SeqCst));

        engine.stop();
        spy.played.store(false, Ordering::SeqCst);
        engine.submit(ChunkSubmission::new(jaw_rows(&[0.4, 0.4])).with_audio(vec![1], None));
        assert!(!spy.played.load(Ordering::SeqCst));
        assert!(engine.is_muted());
        assert!((engine.status().duration.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn external_end_signal_completes_active_chunk() {
        let (mut engine, _clock) = engine_with(MotionConfig::default());
        let a = engine.submit(ChunkSubmission::new(jaw_rows(&[0.4, 0.4])).with_duration_ms(5000.0));
        let b = engine.submit(ChunkSubmission::new(jaw_rows(&[0.4, 0.4])).with_duration_ms(5000.0));

        engine.notify_media_ended(b);
        assert_eq!(engine.status().active, Some(a));

        engine.notify_media_ended(a);
        assert_eq!(engine.status().active, Some(b));
        assert_eq!(
            engine.drain_events(),
            vec![
                EngineEvent::Activated(a),
                EngineEvent::Completed(a),
                EngineEvent::Activated(b),
            ]
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.motion.damping_ratio = f32::NAN;
        let err = SyncEngine::with_clock(config, ManualClock::new()).unwrap_err();
        assert!(matches!(err, VisemeSyncError::InvalidConfig(_)));
    }

    #[test]
    fn irregular_and_repeated_queries_are_safe() {
        let (mut engine, clock) = engine_with(MotionConfig::default());
        assert_eq!(engine.frame(), Pose::neutral());

        engine.submit(ChunkSubmission::new(Vec::new()));
        for step in [0.0, 0.0, 5.0, 0.0001, 0.2] {
            clock.advance(step);
            let pose = engine.frame();
            assert!(pose.channels().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_output_channel_stays_in_unit_range(
            rows in prop::collection::vec(
                prop::collection::vec(-2.0f32..3.0, 0..20),
                0..12,
            ),
            interval_ms in 1.0f64..120.0,
            steps in prop::collection::vec(0.0f64..0.2, 1..80),
        ) {
            let (mut engine, clock) = engine_with(MotionConfig::default());
            engine.submit(ChunkSubmission::new(rows.clone()).with_frame_interval_ms(interval_ms));
            engine.submit(ChunkSubmission::new(rows).with_fps(24.0));

            for step in steps {
                clock.advance(step);
                let pose = engine.frame();
                for value in pose.channels() {
                    prop_assert!((0.0..=1.0).contains(value));
                }
            }
        }
    }
}
