use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use crate::audio::MediaHandle;

/// Monotonic time source, in seconds from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Clones share the same time, so a
/// copy handed to the engine can be driven from the outside.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        let delta = (seconds.max(0.0) * 1_000_000.0).round() as u64;
        self.micros.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set(&self, seconds: f64) {
        let micros = (seconds.max(0.0) * 1_000_000.0).round() as u64;
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.micros.load(Ordering::SeqCst) as f64 / 1_000_000.0
    }
}

/// Resolves the playback position of the active chunk.
///
/// The media handle is authoritative while it reports a valid position;
/// otherwise the position is the wall-clock time since activation. Both are
/// clamped to the chunk duration.
pub struct PlaybackClock {
    activated_at: f64,
    media: Option<Box<dyn MediaHandle>>,
    playing: bool,
    ended: bool,
    last_position: Option<f64>,
}

impl PlaybackClock {
    /// A clock with no media attached.
    pub fn wall(activated_at: f64) -> Self {
        Self {
            activated_at,
            media: None,
            playing: false,
            ended: false,
            last_position: None,
        }
    }

    /// Attaches media and, unless `muted`, starts it. A failed start is
    /// logged and leaves the chunk on the wall clock.
    pub fn with_media(activated_at: f64, mut media: Box<dyn MediaHandle>, muted: bool) -> Self {
        let playing = if muted {
            false
        } else {
            match media.play() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "media playback failed to start; using wall clock");
                    false
                }
            }
        };

        Self {
            activated_at,
            media: Some(media),
            playing,
            ended: false,
            last_position: None,
        }
    }

    pub fn activated_at(&self) -> f64 {
        self.activated_at
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Media position, if the media is playing and reports a usable one.
    pub fn media_position(&self) -> Option<f64> {
        if !self.playing {
            return None;
        }
        self.media
            .as_ref()
            .and_then(|media| media.position())
            .filter(|position| position.is_finite() && *position >= 0.0)
    }

    /// Media duration, once the media reports a usable one.
    pub fn media_duration(&self) -> Option<f64> {
        self.media
            .as_ref()
            .and_then(|media| media.duration())
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    }

    /// Elapsed time within the chunk, clamped to `[0, duration]`.
    pub fn elapsed(&self, now: f64, duration: f64) -> f64 {
        let raw = self
            .media_position()
            .unwrap_or(now - self.activated_at);
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, duration)
        }
    }

    /// Whether the media has signalled completion.
    pub fn has_ended(&self) -> bool {
        self.ended
            || (self.playing
                && self
                    .media
                    .as_ref()
                    .map(|media| media.has_ended())
                    .unwrap_or(false))
    }

    /// Records an external "media ended" signal.
    pub fn mark_ended(&mut self) {
        self.ended = true;
    }

    /// Whether the fallback timer should complete the chunk.
    ///
    /// Without a media position the chunk is due `grace` seconds after its
    /// duration has passed on the wall clock. With one, the same deadline
    /// applies once the position has stopped advancing between two polls,
    /// so media that stalls without ever ending cannot hold the queue.
    /// Call once per tick.
    pub fn fallback_due(&mut self, now: f64, duration: f64, grace: f64) -> bool {
        let overdue = now - self.activated_at >= duration + grace;
        match self.media_position() {
            None => overdue,
            Some(position) => {
                let stalled = self.last_position.is_some_and(|last| position <= last);
                self.last_position = Some(position);
                if overdue && stalled {
                    tracing::warn!(position, duration, "media position stalled; completing on timer");
                }
                overdue && stalled
            }
        }
    }

    /// Mutes or unmutes the attached media without touching its position.
    pub fn set_muted(&mut self, muted: bool) {
        if let Some(media) = self.media.as_mut() {
            media.set_muted(muted);
        }
    }

    /// Pauses any attached media.
    pub fn halt(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.pause();
        }
        self.playing = false;
    }
}

impl fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("activated_at", &self.activated_at)
            .field("media", &self.media.is_some())
            .field("playing", &self.playing)
            .field("ended", &self.ended)
            .field("last_position", &self.last_position)
            .finish()
    }
}
