//! Brute-force key recovery.
//!
//! Every key of the configured grid is tried in the Inverse direction and the
//! result scored with [`disorder_score`](crate::scoring::disorder_score). Keys
//! are evaluated in batches on a dedicated rayon pool; each batch is reduced
//! in enumeration order with a strict `<`, so the outcome and the sequence of
//! events match a sequential scan (first key wins ties).

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ScrambleError};
use crate::scoring::disorder_score_ordered;
use crate::scramble::{row_sources, transform};
use crate::types::{Frame, Key, ScrambleDirection, SearchBounds};

/// Shared cancellation flag, checked between candidate evaluations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// True when both tokens share the same flag.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A strictly better key, with the snapshot descrambled under it.
#[derive(Debug, Clone)]
pub struct SearchUpdate {
    pub key: Key,
    pub score: f64,
    pub preview: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    pub evaluated: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub key: Key,
    pub score: f64,
    pub frame: Frame,
    pub evaluated: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum SearchEvent {
    Improved(SearchUpdate),
    Progress(SearchProgress),
    /// Always the last event of a completed run.
    Finished(SearchResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub key: Key,
    pub score: f64,
    pub evaluated: usize,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

impl SearchReport {
    pub fn completed(result: &SearchResult) -> Self {
        Self {
            key: result.key,
            score: result.score,
            evaluated: result.evaluated,
            elapsed_ms: result.elapsed.as_millis() as u64,
            cancelled: false,
        }
    }

    /// Best key seen before the run was cancelled.
    pub fn partial(update: &SearchUpdate, evaluated: usize, elapsed: Duration) -> Self {
        Self {
            key: update.key,
            score: update.score,
            evaluated,
            elapsed_ms: elapsed.as_millis() as u64,
            cancelled: true,
        }
    }
}

#[derive(Clone)]
pub struct KeySearchEngine {
    bounds: SearchBounds,
    batch_size: usize,
    pool: Arc<rayon::ThreadPool>,
}

impl KeySearchEngine {
    pub fn new(bounds: SearchBounds, threads: usize, batch_size: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("janus-search-{}", i))
            .build()?;
        Ok(Self {
            bounds,
            batch_size: batch_size.max(1),
            pool: Arc::new(pool),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.search, config.threads, config.batch_size)
    }

    pub fn bounds(&self) -> SearchBounds {
        self.bounds
    }

    /// Runs the search on the calling thread, reporting through `on_event`.
    ///
    /// Fails with [`ScrambleError::SnapshotUnavailable`] before doing any work
    /// when there is no snapshot, and with [`ScrambleError::Cancelled`] once
    /// `cancel` is observed; no event is emitted after either.
    pub fn search<F>(
        &self,
        snapshot: Option<&Frame>,
        cancel: &CancelToken,
        mut on_event: F,
    ) -> Result<SearchResult>
    where
        F: FnMut(SearchEvent),
    {
        let snapshot = snapshot.ok_or(ScrambleError::SnapshotUnavailable)?;
        let start = Instant::now();
        let keys: Vec<Key> = self.bounds.keys().collect();
        let total = keys.len();

        info!(
            candidates = total,
            height = snapshot.height(),
            width = snapshot.width(),
            threads = self.pool.current_num_threads(),
            "Starting key search"
        );

        let mut best: Option<SearchUpdate> = None;
        let mut best_score = f64::INFINITY;
        let mut evaluated = 0usize;

        for batch in keys.chunks(self.batch_size) {
            if cancel.is_cancelled() {
                return Err(cancelled(evaluated));
            }

            let scores: Vec<Option<f64>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map_init(Vec::new, |sources, &key| {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        row_sources(snapshot.height(), key, ScrambleDirection::Inverse, sources);
                        Some(disorder_score_ordered(snapshot, sources))
                    })
                    .collect()
            });

            for (&key, score) in batch.iter().zip(scores) {
                let Some(score) = score else {
                    return Err(cancelled(evaluated));
                };
                evaluated += 1;

                if score < best_score {
                    if cancel.is_cancelled() {
                        return Err(cancelled(evaluated));
                    }
                    best_score = score;
                    let update = SearchUpdate {
                        key,
                        score,
                        preview: transform(snapshot, key, ScrambleDirection::Inverse),
                    };
                    debug!(%key, score, "Improved candidate");
                    on_event(SearchEvent::Improved(update.clone()));
                    best = Some(update);
                }
            }

            if cancel.is_cancelled() {
                return Err(cancelled(evaluated));
            }
            on_event(SearchEvent::Progress(SearchProgress { evaluated, total }));
        }

        let Some(best) = best else {
            return Err(ScrambleError::Config(
                "search bounds contain no keys".into(),
            ));
        };

        let result = SearchResult {
            key: best.key,
            score: best.score,
            frame: best.preview,
            evaluated,
            elapsed: start.elapsed(),
        };

        if cancel.is_cancelled() {
            return Err(cancelled(evaluated));
        }

        let elapsed_ms = result.elapsed.as_millis() as u64;
        info!(
            key = %result.key,
            score = result.score,
            elapsed_ms,
            "Key search complete"
        );
        on_event(SearchEvent::Finished(result.clone()));
        Ok(result)
    }

    /// Runs [`search`](Self::search) on a background thread.
    ///
    /// Without a snapshot this fails immediately and no thread is started.
    pub fn spawn(&self, snapshot: Option<Frame>, cancel: CancelToken) -> Result<SearchHandle> {
        let snapshot = snapshot.ok_or(ScrambleError::SnapshotUnavailable)?;
        let (tx, rx) = unbounded();
        let engine = self.clone();
        let token = cancel.clone();

        let thread = thread::Builder::new()
            .name("janus-search".into())
            .spawn(move || {
                engine.search(Some(&snapshot), &token, |event| {
                    let _ = tx.send(event);
                })
            })?;

        Ok(SearchHandle {
            events: rx,
            cancel,
            thread,
        })
    }
}

fn cancelled(evaluated: usize) -> ScrambleError {
    info!(evaluated, "Key search cancelled");
    ScrambleError::Cancelled
}

/// A search running on its own thread. Events arrive in emission order and
/// the channel closes when the run ends.
pub struct SearchHandle {
    events: Receiver<SearchEvent>,
    cancel: CancelToken,
    thread: JoinHandle<Result<SearchResult>>,
}

impl SearchHandle {
    pub fn events(&self) -> &Receiver<SearchEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Hands every event to `on_event` until the run ends, cancelling it once
    /// `stop` is set. `stop` is checked before every receive.
    pub fn forward_events<F>(&self, stop: &CancelToken, poll: Duration, mut on_event: F)
    where
        F: FnMut(SearchEvent),
    {
        loop {
            if stop.is_cancelled() && !self.cancel.is_cancelled() {
                debug!("Stop requested, cancelling key search");
                self.cancel();
            }
            match self.events.recv_timeout(poll) {
                Ok(event) => on_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    pub fn join(self) -> Result<SearchResult> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
