use std::collections::VecDeque;

use crate::{
    chunk::{Chunk, ChunkId},
    clock::PlaybackClock,
    crossfade::Crossfade,
    interpolate,
    pose::Pose,
};

/// Chunk currently driving the pose, with its playback clock and crossfade.
#[derive(Debug)]
pub struct ActiveChunk {
    pub chunk: Chunk,
    pub playback: PlaybackClock,
    pub fade: Crossfade,
}

impl ActiveChunk {
    pub fn id(&self) -> ChunkId {
        self.chunk.id()
    }

    pub fn duration(&self) -> f64 {
        self.chunk.timeline().duration()
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        self.playback.elapsed(now, self.duration())
    }

    /// Interpolated target at `now`, blended through the crossfade.
    pub fn target(&self, now: f64) -> Pose {
        let timeline = self.chunk.timeline();
        let raw = interpolate::sample(timeline.times(), self.chunk.frames(), self.elapsed(now));
        self.fade.apply(&raw, now)
    }

    /// Rescales the chunk's axis the first time the media reports a
    /// duration. Returns the duration that was applied.
    pub fn sync_media_duration(&mut self) -> Option<f64> {
        let duration = self.playback.media_duration()?;
        if self.chunk.timeline_mut().rescale(duration) {
            Some(duration)
        } else {
            None
        }
    }
}

/// FIFO of pending chunks plus the single active one.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    pending: VecDeque<Chunk>,
    active: Option<ActiveChunk>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail of the pending queue.
    pub fn submit(&mut self, chunk: Chunk) {
        self.pending.push_back(chunk);
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active(&self) -> Option<&ActiveChunk> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveChunk> {
        self.active.as_mut()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ids(&self) -> Vec<ChunkId> {
        self.pending.iter().map(Chunk::id).collect()
    }

    /// Activates the head of the pending queue through `arm`. Does nothing
    /// while a chunk is already active or when nothing is pending.
    pub fn activate_next<F>(&mut self, arm: F) -> Option<&ActiveChunk>
    where
        F: FnOnce(Chunk) -> ActiveChunk,
    {
        if self.active.is_some() {
            return None;
        }
        let chunk = self.pending.pop_front()?;
        self.active = Some(arm(chunk));
        self.active.as_ref()
    }

    /// Discards the active chunk after it finished playing.
    pub fn complete_active(&mut self) -> Option<ActiveChunk> {
        self.active.take()
    }

    /// Drops everything: the active chunk and all pending ones.
    pub fn flush(&mut self) -> (Option<ActiveChunk>, Vec<Chunk>) {
        let active = self.active.take();
        let pending = self.pending.drain(..).collect();
        (active, pending)
    }
}
