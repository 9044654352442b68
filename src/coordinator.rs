//! Shared state between frame acquisition and the key search.
//!
//! The latest frame, the active mode and the active key live behind one
//! mutex. Acquisition copies `(mode, key)` under the lock and transforms
//! outside it, so a configuration change never lands halfway through a frame.
//! The search only ever sees a copy of the latest frame taken at its start.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrambleError};
use crate::scramble::apply_mode;
use crate::search::{CancelToken, KeySearchEngine, SearchHandle, SearchResult};
use crate::types::{Frame, FramePair, Key, Mode};

#[derive(Debug, Default)]
struct State {
    frame: Option<Frame>,
    mode: Mode,
    key: Key,
    restart: bool,
    search: Option<CancelToken>,
}

impl State {
    fn cancel_search(&mut self) {
        if let Some(token) = self.search.take() {
            token.cancel();
            debug!("Cancelled in-flight key search");
        }
    }
}

#[derive(Debug, Default)]
pub struct FrameCoordinator {
    state: Mutex<State>,
}

impl FrameCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mode: Mode, key: Key) -> Self {
        Self {
            state: Mutex::new(State {
                mode,
                key,
                ..State::default()
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.lock().mode
    }

    pub fn key(&self) -> Key {
        self.state.lock().key
    }

    /// `(mode, key)` read under a single lock.
    pub fn settings(&self) -> (Mode, Key) {
        let state = self.state.lock();
        (state.mode, state.key)
    }

    /// Switches the mode. Asking to scramble or descramble supersedes any
    /// running search.
    pub fn set_mode(&self, mode: Mode) {
        let mut state = self.state.lock();
        if mode != Mode::Passthrough {
            state.cancel_search();
        }
        state.mode = mode;
        info!(%mode, key = %state.key, "Mode changed");
    }

    pub fn set_key(&self, key: Key) {
        let mut state = self.state.lock();
        state.key = key;
        info!(%key, "Key changed");
    }

    /// Sets the key from text input. On rejection the current key is kept.
    pub fn set_key_text(&self, r: &str, s: &str) -> Result<Key> {
        let mut state = self.state.lock();
        let (key, error) = Key::parse_or(state.key, r, s);
        if let Some(e) = error {
            warn!(error = %e, kept = %state.key, "Rejected key input");
            return Err(e);
        }
        state.key = key;
        info!(%key, "Key changed");
        Ok(key)
    }

    /// Stores a copy of `frame` as the latest snapshot and transforms it
    /// under the current settings.
    pub fn on_frame_acquired(&self, frame: Frame) -> FramePair {
        let (mode, key) = {
            let mut state = self.state.lock();
            state.frame = Some(frame.clone());
            (state.mode, state.key)
        };
        let transformed = apply_mode(&frame, mode, key);
        FramePair {
            original: frame,
            transformed,
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.state.lock().frame.is_some()
    }

    pub fn snapshot_for_search(&self) -> Result<Frame> {
        self.state
            .lock()
            .frame
            .clone()
            .ok_or(ScrambleError::SnapshotUnavailable)
    }

    /// Adopts a recovered key: descramble with it and restart playback.
    pub fn apply_search_result(&self, key: Key) {
        let mut state = self.state.lock();
        state.key = key;
        state.mode = Mode::Inverse;
        state.restart = true;
        info!(%key, "Applied recovered key");
    }

    /// Consumes the restart request raised by [`apply_search_result`](Self::apply_search_result).
    pub fn take_restart(&self) -> bool {
        std::mem::take(&mut self.state.lock().restart)
    }

    /// Forgets the current video: drops the snapshot and cancels any search.
    pub fn reset_for_new_video(&self) {
        let mut state = self.state.lock();
        state.cancel_search();
        state.frame = None;
        state.restart = false;
        info!("Reset for new video");
    }

    /// Starts a search on a snapshot of the latest frame, cancelling the
    /// previous one. Without a frame nothing is cancelled or started.
    pub fn begin_search(&self, engine: &KeySearchEngine) -> Result<SearchHandle> {
        let (snapshot, token) = {
            let mut state = self.state.lock();
            let snapshot = state
                .frame
                .clone()
                .ok_or(ScrambleError::SnapshotUnavailable)?;
            state.cancel_search();
            let token = CancelToken::new();
            state.search = Some(token.clone());
            (snapshot, token)
        };
        engine.spawn(Some(snapshot), token)
    }

    /// Waits for `handle` and applies its key if the run was not superseded.
    ///
    /// Returns `Ok(None)` for cancelled or superseded runs, which leave the
    /// frame, mode and key untouched.
    pub fn complete_search(&self, handle: SearchHandle) -> Result<Option<SearchResult>> {
        let token = handle.cancel_token().clone();
        let outcome = handle.join();

        let mut state = self.state.lock();
        let current = state.search.as_ref().is_some_and(|t| t.same_as(&token));
        if current && (outcome.is_err() || token.is_cancelled()) {
            state.search = None;
        }
        let result = match outcome {
            Ok(result) => result,
            Err(ScrambleError::Cancelled) => return Ok(None),
            Err(e) => return Err(e),
        };

        if token.is_cancelled() || !current {
            debug!(key = %result.key, "Discarded stale search result");
            return Ok(None);
        }

        state.search = None;
        state.key = result.key;
        state.mode = Mode::Inverse;
        state.restart = true;
        info!(key = %result.key, "Applied recovered key");
        Ok(Some(result))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchBounds;

    #[test]
    fn test_passthrough_by_default() {
        let coordinator = FrameCoordinator::new();
        let frame = Frame::from_fn(5, 2, 3, |y, row| row.fill(y as u8 * 10));
        let pair = coordinator.on_frame_acquired(frame.clone());
        assert_eq!(pair.original, frame);
        assert_eq!(pair.transformed, frame);
    }

    #[test]
    fn test_snapshot_unavailable_before_first_frame() {
        let coordinator = FrameCoordinator::new();
        assert!(!coordinator.has_snapshot());
        assert!(matches!(
            coordinator.snapshot_for_search(),
            Err(ScrambleError::SnapshotUnavailable)
        ));
    }

    #[test]
    fn test_restart_is_consumed_once() {
        let coordinator = FrameCoordinator::new();
        coordinator.apply_search_result(Key::new(4, 2));
        assert_eq!(coordinator.settings(), (Mode::Inverse, Key::new(4, 2)));
        assert!(coordinator.take_restart());
        assert!(!coordinator.take_restart());
    }

    #[test]
    fn test_cancelled_search_clears_token() {
        let coordinator = FrameCoordinator::new();
        coordinator.on_frame_acquired(Frame::from_fn(16, 1, 1, |y, row| row.fill(y as u8)));
        let engine = KeySearchEngine::new(SearchBounds::new(3, 3), 1, 4).unwrap();

        let handle = coordinator.begin_search(&engine).unwrap();
        handle.cancel();
        assert!(coordinator.complete_search(handle).unwrap().is_none());
        assert!(coordinator.state.lock().search.is_none());
        assert_eq!(coordinator.mode(), Mode::Passthrough);
    }

    #[test]
    fn test_bad_key_text_keeps_previous() {
        let coordinator = FrameCoordinator::with_settings(Mode::Forward, Key::new(3, 3));
        assert!(coordinator.set_key_text("-5", "1").is_err());
        assert_eq!(coordinator.key(), Key::new(3, 3));
        assert_eq!(coordinator.set_key_text("", "8").unwrap(), Key::new(0, 8));
    }
}
