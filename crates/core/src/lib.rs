//! Core library for the viseme synchronization engine.
//!
//! The engine turns irregularly delivered chunks of viseme poses, optionally
//! paired with audio, into a pose that can be queried once per display frame
//! and stays locked to the true audio playback position. Each module owns one
//! stage of that pipeline (timeline construction, queueing, playback clock,
//! interpolation, crossfading, smoothing) and [`SyncEngine`] wires them
//! together.

pub mod audio;
pub mod chunk;
pub mod clock;
pub mod config;
pub mod crossfade;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod motion;
pub mod pose;
pub mod queue;
pub mod timeline;

pub use audio::{AudioPayload, ClockedBackend, MediaBackend, MediaHandle, NoAudioBackend};
pub use chunk::{Chunk, ChunkId, ChunkSubmission};
pub use clock::{Clock, ManualClock, PlaybackClock, SystemClock};
pub use config::{CrossfadeConfig, EngineConfig, IdleConfig, MotionConfig, TimelineConfig};
pub use crossfade::Crossfade;
pub use engine::{EngineEvent, EngineStatus, SyncEngine};
pub use error::{Result, VisemeSyncError};
pub use motion::{IdleRelaxation, MotionFilter};
pub use pose::{Pose, CHANNELS};
pub use queue::{ActiveChunk, ChunkQueue};
pub use timeline::{Timeline, TimelineSource, TimingHints};
