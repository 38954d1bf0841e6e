//! Gapless scheduling of model audio.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::VoiceError;

/// Handle to one scheduled buffer on the playback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// Output device with its own clock, in seconds.
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    async fn open(&self, sample_rate: u32) -> Result<(), VoiceError>;

    /// Current time on the playback clock.
    fn current_time(&self) -> f64;

    /// Schedule `samples` to start at `start_at` on the playback clock.
    fn play(&self, samples: &[f32], start_at: f64) -> SourceId;

    /// Stop a scheduled or playing buffer. Unknown ids are ignored.
    fn stop_source(&self, id: SourceId);

    /// Release the device. Safe to call when not open.
    fn close(&self);
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    id: SourceId,
    ends_at: f64,
}

/// Queues fragments back to back on the playback clock.
///
/// Each fragment starts at `max(cursor, now)` and moves the cursor to its
/// end, so consecutive fragments play without gaps or overlap.
pub struct PlaybackScheduler {
    playback: Arc<dyn AudioPlayback>,
    sample_rate: u32,
    cursor: f64,
    sources: Vec<Scheduled>,
}

impl PlaybackScheduler {
    #[must_use]
    pub fn new(playback: Arc<dyn AudioPlayback>, sample_rate: u32) -> Self {
        Self {
            playback,
            sample_rate,
            cursor: 0.0,
            sources: Vec::new(),
        }
    }

    /// Schedule a fragment and return its start time.
    pub fn schedule(&mut self, samples: &[f32]) -> f64 {
        let now = self.playback.current_time();
        self.sources.retain(|s| s.ends_at > now);

        let start = self.cursor.max(now);
        #[allow(clippy::cast_precision_loss)] // fragment lengths are far below 2^52
        let duration = samples.len() as f64 / f64::from(self.sample_rate);
        let id = self.playback.play(samples, start);
        self.cursor = start + duration;
        self.sources.push(Scheduled {
            id,
            ends_at: self.cursor,
        });
        start
    }

    /// Stop everything scheduled or playing and restart the cursor at the
    /// current playback time.
    pub fn interrupt(&mut self) {
        for source in self.sources.drain(..) {
            self.playback.stop_source(source.id);
        }
        self.cursor = self.playback.current_time();
    }

    /// Forget scheduled sources without touching the device.
    pub fn reset(&mut self) {
        self.sources.clear();
        self.cursor = 0.0;
    }

    /// Start time the next fragment would get if the clock stood still.
    #[must_use]
    pub const fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Number of sources not yet known to have finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sources.len()
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("sample_rate", &self.sample_rate)
            .field("cursor", &self.cursor)
            .field("pending", &self.sources.len())
            .finish_non_exhaustive()
    }
}
