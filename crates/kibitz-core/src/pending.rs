//! One-shot hand-off of a search result from an engine worker to the caller.
//!
//! Every search request gets a fresh channel from [`pending_search`]. The
//! producer half is consumed by [`SearchReply::deliver`] and the consumer
//! half by [`PendingSearch::wait`], so neither side can be reused.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::chess_move::Move;
use crate::error::SearchError;

/// Build the two halves of a single search hand-off.
pub fn pending_search() -> (SearchReply, PendingSearch) {
    let (tx, rx) = mpsc::sync_channel(1);
    (SearchReply { tx }, PendingSearch { rx })
}

/// Producer half, owned by the engine's worker for the duration of a search.
pub struct SearchReply {
    tx: mpsc::SyncSender<Move>,
}

impl SearchReply {
    /// Deposit the search result.
    ///
    /// Returns `false` if the waiting side is already gone.
    pub fn deliver(self, mv: Move) -> bool {
        self.tx.send(mv).is_ok()
    }
}

impl fmt::Debug for SearchReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchReply").finish_non_exhaustive()
    }
}

/// Consumer half: an in-flight search.
pub struct PendingSearch {
    rx: mpsc::Receiver<Move>,
}

impl PendingSearch {
    /// Block until the engine delivers its move.
    pub fn wait(self) -> Result<Move, SearchError> {
        self.rx.recv().map_err(|_| SearchError::Abandoned)
    }

    /// Wait at most `timeout` for the move.
    ///
    /// A search that is still running comes back as
    /// [`SearchStatus::Running`] so the caller can wait again later.
    pub fn wait_timeout(self, timeout: Duration) -> Result<SearchStatus, SearchError> {
        match self.rx.recv_timeout(timeout) {
            Ok(mv) => Ok(SearchStatus::Delivered(mv)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(SearchStatus::Running(self)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SearchError::Abandoned),
        }
    }
}

/// Outcome of [`PendingSearch::wait_timeout`].
#[derive(Debug)]
pub enum SearchStatus {
    /// The engine delivered its move.
    Delivered(Move),
    /// No move yet.
    Running(PendingSearch),
}

impl fmt::Debug for PendingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSearch").finish_non_exhaustive()
    }
}

/// Shared stop flag for an engine's search workers.
///
/// Clones observe the same flag, so a handle given to another thread can
/// end a search that the session thread is blocked on.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create a handle with the flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the current search to finish as soon as possible.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Clear the flag before a new search starts.
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::Release);
    }
}
