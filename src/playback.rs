//! Fixed-cadence frame acquisition.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::coordinator::FrameCoordinator;
use crate::error::Result;
use crate::io::{FrameSink, FrameSource};
use crate::search::CancelToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub frames: usize,
    pub restarts: usize,
    pub cancelled: bool,
}

/// Pulls one frame per tick from a source, runs it through the coordinator
/// and publishes the original and transformed frames.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    cadence: Duration,
}

impl Player {
    pub fn new(cadence: Duration) -> Self {
        Self { cadence }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cadence())
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Plays until the source runs dry or `stop` is cancelled.
    ///
    /// A restart requested through the coordinator rewinds the source and
    /// numbers frames from zero again.
    pub fn run<S>(
        &self,
        source: &mut S,
        coordinator: &FrameCoordinator,
        original: &mut dyn FrameSink,
        transformed: &mut dyn FrameSink,
        stop: &CancelToken,
    ) -> Result<PlaybackStats>
    where
        S: FrameSource + ?Sized,
    {
        let ticker = crossbeam_channel::tick(self.cadence);
        let mut stats = PlaybackStats::default();
        let mut index = 0usize;

        let cadence_ms = self.cadence.as_millis() as u64;
        info!(cadence_ms, "Playback started");

        loop {
            if stop.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            if coordinator.take_restart() {
                source.rewind()?;
                index = 0;
                stats.restarts += 1;
                debug!("Playback restarted");
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };

            let pair = coordinator.on_frame_acquired(frame);
            original.accept(index, &pair.original)?;
            transformed.accept(index, &pair.transformed)?;
            index += 1;
            stats.frames += 1;

            let _ = ticker.recv();
        }

        info!(
            frames = stats.frames,
            restarts = stats.restarts,
            cancelled = stats.cancelled,
            "Playback finished"
        );
        Ok(stats)
    }
}
