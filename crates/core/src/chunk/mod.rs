use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    audio::AudioPayload,
    config::TimelineConfig,
    pose::{coerce_sample, Pose},
    timeline::{Timeline, TimingHints},
    Result,
};

/// Identifier handed out for every submitted chunk, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub u64);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk#{}", self.0)
    }
}

/// One streamed unit of viseme data as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkSubmission {
    /// Pose rows. Entries may be numbers, numeric strings, booleans or
    /// nulls; they are coerced to floats and clamped when the chunk is built.
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub frames: Vec<Vec<f32>>,
    #[serde(flatten)]
    pub timing: TimingHints,
    /// Encoded audio, base64 on the wire.
    #[serde(default, with = "base64_audio", skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_ms: Option<f64>,
}

impl ChunkSubmission {
    pub fn new(frames: Vec<Vec<f32>>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.timing.times = Some(times);
        self
    }

    pub fn with_frame_interval_ms(mut self, interval_ms: f64) -> Self {
        self.timing.frame_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.timing.fps = Some(fps);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.timing.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_audio(mut self, bytes: Vec<u8>, encoding: Option<String>) -> Self {
        self.audio = Some(bytes);
        self.audio_encoding = encoding;
        self
    }

    /// The attached audio, with the encoding tag defaulted.
    pub fn audio_payload(&self) -> Option<AudioPayload> {
        self.audio
            .as_ref()
            .map(|bytes| AudioPayload::new(bytes.clone(), self.audio_encoding.clone()))
    }

    /// Parses a chunk file: either a single submission or an array of them.
    pub fn parse_many(json: &str) -> Result<Vec<ChunkSubmission>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<ChunkSubmission>),
            One(Box<ChunkSubmission>),
        }

        Ok(match serde_json::from_str(json)? {
            OneOrMany::Many(chunks) => chunks,
            OneOrMany::One(chunk) => vec![*chunk],
        })
    }
}

/// Diagnostic ordering metadata carried alongside a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SequenceInfo {
    pub index: Option<u64>,
    pub offset_ms: Option<f64>,
}

/// A submitted chunk after coercion: clamped poses plus its time axis.
#[derive(Debug, Clone)]
pub struct Chunk {
    id: ChunkId,
    frames: Vec<Pose>,
    timeline: Timeline,
    audio: Option<AudioPayload>,
    sequence: SequenceInfo,
}

impl Chunk {
    pub fn from_submission(
        id: ChunkId,
        submission: ChunkSubmission,
        config: &TimelineConfig,
    ) -> Self {
        let mut frames: Vec<Pose> = submission
            .frames
            .iter()
            .map(|row| Pose::from_row(row))
            .collect();
        if frames.is_empty() {
            tracing::warn!(%id, "chunk has no frames; holding a neutral pose");
            frames.push(Pose::neutral());
        }

        if let Some(times) = &submission.timing.times {
            if times.len() >= 2 && times.len() != frames.len() {
                tracing::warn!(
                    %id,
                    times = times.len(),
                    frames = frames.len(),
                    "timestamp count does not match frame count"
                );
            }
        }

        let timeline = Timeline::build(frames.len(), &submission.timing, config);

        Self {
            id,
            frames,
            timeline,
            audio: submission.audio_payload(),
            sequence: SequenceInfo {
                index: submission.chunk_index,
                offset_ms: submission.offset_ms,
            },
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn frames(&self) -> &[Pose] {
        &self.frames
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn audio(&self) -> Option<&AudioPayload> {
        self.audio.as_ref()
    }

    pub fn sequence(&self) -> SequenceInfo {
        self.sequence
    }

    /// The last pose of the chunk.
    pub fn final_pose(&self) -> Pose {
        self.frames.last().copied().unwrap_or_default()
    }
}

fn deserialize_rows<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Option<Vec<Vec<serde_json::Value>>> = Option::deserialize(deserializer)?;
    Ok(rows
        .unwrap_or_default()
        .iter()
        .map(|row| row.iter().map(coerce_sample).collect())
        .collect())
}

mod base64_audio {
    use super::*;

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .filter(|text| !text.is_empty())
            .map(|text| STANDARD.decode(text.trim()))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
