//! Media collaborator boundary.
//!
//! The engine never decodes or plays audio itself. It asks a
//! [`MediaBackend`] to open a chunk's payload and then only reads a
//! position, a duration and an "ended" flag back from the returned
//! [`MediaHandle`]. Any failure along the way sends the chunk down the
//! wall-clock path instead.

use std::fmt;

use crate::{clock::Clock, Result, VisemeSyncError};

/// Encoding assumed when the transport does not tag the payload.
pub const DEFAULT_AUDIO_ENCODING: &str = "mp3";

/// Encoded audio attached to a chunk.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    encoding: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, encoding: Option<String>) -> Self {
        let encoding = encoding
            .map(|tag| tag.trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(|| DEFAULT_AUDIO_ENCODING.to_string());
        Self { bytes, encoding }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Duration read from the container header, when the encoding carries
    /// one this crate understands.
    pub fn probe_duration(&self) -> Option<f64> {
        match self.encoding.as_str() {
            "wav" | "wave" | "audio/wav" | "audio/wave" => wav_duration(&self.bytes),
            _ => None,
        }
    }
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPayload")
            .field("encoding", &self.encoding)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A playing (or playable) piece of media.
pub trait MediaHandle: fmt::Debug + Send {
    /// Starts playback. An error means playback will not happen.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    /// Current playback position in seconds, if the media reports one.
    fn position(&self) -> Option<f64>;

    /// Total media duration in seconds, once known.
    fn duration(&self) -> Option<f64>;

    fn has_ended(&self) -> bool;
}

/// Opens audio payloads into [`MediaHandle`]s.
pub trait MediaBackend: Send {
    fn open(&mut self, payload: &AudioPayload) -> Result<Box<dyn MediaHandle>>;
}

/// Backend for hosts without audio output. Every chunk runs on the wall
/// clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAudioBackend;

impl MediaBackend for NoAudioBackend {
    fn open(&mut self, payload: &AudioPayload) -> Result<Box<dyn MediaHandle>> {
        Err(VisemeSyncError::MediaUnavailable(format!(
            "no audio output configured for {} payload",
            payload.encoding()
        )))
    }
}

/// Software playback head driven by a [`Clock`]. It plays nothing audible
/// but reports positions the way a real player would, which makes it useful
/// for offline replays and headless hosts.
#[derive(Debug, Clone)]
pub struct ClockedBackend<C> {
    clock: C,
}

impl<C: Clock + Clone + fmt::Debug + 'static> ClockedBackend<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock + Clone + fmt::Debug + 'static> MediaBackend for ClockedBackend<C> {
    fn open(&mut self, payload: &AudioPayload) -> Result<Box<dyn MediaHandle>> {
        Ok(Box::new(ClockedMedia {
            clock: self.clock.clone(),
            duration: payload.probe_duration(),
            started_at: None,
            paused_position: None,
            muted: false,
        }))
    }
}

#[derive(Debug)]
pub struct ClockedMedia<C> {
    clock: C,
    duration: Option<f64>,
    started_at: Option<f64>,
    paused_position: Option<f64>,
    muted: bool,
}

impl<C> ClockedMedia<C> {
    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl<C: Clock + fmt::Debug> MediaHandle for ClockedMedia<C> {
    fn play(&mut self) -> Result<()> {
        if self.duration.is_none() {
            return Err(VisemeSyncError::MediaUnavailable(
                "payload duration could not be determined".to_string(),
            ));
        }
        match self.paused_position.take() {
            Some(resume_from) => self.started_at = Some(self.clock.now() - resume_from),
            None if self.started_at.is_none() => self.started_at = Some(self.clock.now()),
            None => {}
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused_position.is_none() {
            self.paused_position = self.position();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn position(&self) -> Option<f64> {
        if let Some(paused) = self.paused_position {
            return Some(paused);
        }
        let started_at = self.started_at?;
        let duration = self.duration?;
        Some((self.clock.now() - started_at).clamp(0.0, duration))
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn has_ended(&self) -> bool {
        match (self.position(), self.duration) {
            (Some(position), Some(duration)) => self.paused_position.is_none() && position >= duration,
            _ => false,
        }
    }
}

/// Duration of a RIFF/WAVE payload: data chunk size over byte rate.
pub fn wav_duration(bytes: &[u8]) -> Option<f64> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut byte_rate = None;
    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = read_u32(bytes, offset + 4)? as usize;
        let body = offset + 8;
        match id {
            b"fmt " => byte_rate = Some(read_u32(bytes, body + 8)?),
            b"data" => {
                let rate = byte_rate.filter(|rate| *rate > 0)?;
                let available = bytes.len().saturating_sub(body);
                return Some(size.min(available) as f64 / rate as f64);
            }
            _ => {}
        }
        offset = body + size + (size & 1);
    }
    None
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

#[cfg(test)]
pub(crate) fn wav_bytes(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let channels: u16 = 1;
    let bits: u16 = 16;
    let block_align = channels * bits / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (byte_rate as f64 * seconds) as u32;

    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(out.len() + data_len as usize, 0);
    out
}
