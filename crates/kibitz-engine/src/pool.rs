//! Worker pool that scores root moves in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use kibitz_core::{EngineError, EngineSettings, Move, SearchLimits, SearchReply, StopHandle};
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, EnPassantMode, Position};
use tracing::{debug, warn};

use crate::control::SearchControl;
use crate::eval::score_child;
use crate::position::to_core;

/// Approximate size of one cache entry in bytes.
const ENTRY_BYTES: usize = 16;

/// Outcome of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move found, or [`Move::NONE`] if there is no legal move.
    pub best_move: Move,
    /// Score of `best_move` for the side to move.
    pub score: i32,
    /// Root moves scored across all workers.
    pub nodes: u64,
}

/// Child-position scores shared by all workers and kept between searches.
#[derive(Debug)]
pub struct ScoreCache {
    entries: Mutex<HashMap<u64, i32>>,
    capacity: usize,
}

impl ScoreCache {
    /// Create a cache sized to roughly `mb` megabytes.
    pub fn new(mb: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: (mb.max(1) * 1024 * 1024) / ENTRY_BYTES,
        }
    }

    fn get(&self, key: u64) -> Option<i32> {
        self.entries.lock().ok()?.get(&key).copied()
    }

    fn insert(&self, key: u64, score: i32) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.clear();
            }
            entries.insert(key, score);
        }
    }

    /// Drop every cached score.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of cached scores.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether the cache holds no scores.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the worker configuration, the shared cache and the running search thread.
#[derive(Debug)]
pub struct SearchPool {
    num_threads: usize,
    hash_mb: usize,
    cache: Arc<ScoreCache>,
    stop: StopHandle,
    active: Option<JoinHandle<()>>,
}

impl SearchPool {
    /// Create a pool with the given settings.
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            num_threads: settings.threads.max(1),
            hash_mb: settings.hash_mb,
            cache: Arc::new(ScoreCache::new(settings.hash_mb)),
            stop: StopHandle::new(),
            active: None,
        }
    }

    /// Apply new thread and cache settings. Resizing drops cached scores.
    pub fn configure(&mut self, settings: &EngineSettings) {
        self.num_threads = settings.threads.max(1);
        if settings.hash_mb != self.hash_mb {
            self.hash_mb = settings.hash_mb;
            self.cache = Arc::new(ScoreCache::new(settings.hash_mb));
        }
    }

    /// Number of worker threads used per search.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Shared score cache.
    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Forget cached scores.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Handle that ends the running search.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Start searching `chess` on a background thread.
    ///
    /// The thread delivers exactly one move through `reply` and exits.
    pub fn start(
        &mut self,
        chess: Chess,
        limits: &SearchLimits,
        reply: SearchReply,
    ) -> Result<(), EngineError> {
        self.join();
        self.stop.reset();

        let control = SearchControl::new(self.stop.clone(), limits);
        let num_threads = self.num_threads;
        let cache = Arc::clone(&self.cache);

        let handle = thread::Builder::new()
            .name("kibitz-search".to_string())
            .spawn(move || {
                let result = search(&chess, num_threads, &control, &cache);
                control.hold_answer();
                debug!(
                    best = %result.best_move,
                    score = result.score,
                    nodes = result.nodes,
                    elapsed_ms = control.elapsed().as_millis() as u64,
                    "search finished"
                );
                if !reply.deliver(result.best_move) {
                    warn!("search result dropped: nobody is waiting");
                }
            })
            .map_err(|e| EngineError::SearchUnavailable(e.to_string()))?;

        self.active = Some(handle);
        Ok(())
    }

    /// Stop the running search, if any, and wait for its thread to exit.
    pub fn shutdown(&mut self) {
        self.stop.stop();
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.active.take()
            && handle.join().is_err()
        {
            warn!("search thread panicked");
        }
    }
}

impl Drop for SearchPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Score every root move of `chess`, splitting the list across `num_threads`
/// scoped workers.
///
/// Ties go to the move generated first. If the search is stopped before any
/// move is scored, the first legal move is returned.
pub fn search(
    chess: &Chess,
    num_threads: usize,
    control: &SearchControl,
    cache: &ScoreCache,
) -> SearchResult {
    let moves: Vec<shakmaty::Move> = chess.legal_moves().into_iter().collect();
    if moves.is_empty() {
        return SearchResult {
            best_move: Move::NONE,
            score: 0,
            nodes: 0,
        };
    }

    let chunk_len = moves.len().div_ceil(num_threads.max(1));
    let nodes = AtomicU64::new(0);

    let scored: Vec<(usize, i32)> = thread::scope(|s| {
        let workers: Vec<_> = moves
            .chunks(chunk_len)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let nodes = &nodes;
                s.spawn(move || {
                    let mut out = Vec::with_capacity(chunk.len());
                    for (offset, m) in chunk.iter().enumerate() {
                        if control.should_stop(nodes.load(Ordering::Relaxed)) {
                            break;
                        }
                        out.push((chunk_index * chunk_len + offset, score_move(chess, m, cache)));
                        nodes.fetch_add(1, Ordering::Relaxed);
                    }
                    out
                })
            })
            .collect();

        workers
            .into_iter()
            .filter_map(|w| w.join().ok())
            .flatten()
            .collect()
    });

    let best = scored
        .iter()
        .copied()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));
    let (index, score) = best.unwrap_or((0, 0));

    SearchResult {
        best_move: to_core(&moves[index]).unwrap_or(Move::NONE),
        score,
        nodes: nodes.load(Ordering::Relaxed),
    }
}

fn score_move(parent: &Chess, m: &shakmaty::Move, cache: &ScoreCache) -> i32 {
    let mut child = parent.clone();
    child.play_unchecked(m);
    let key = child.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;

    if let Some(score) = cache.get(key) {
        return score;
    }
    let score = score_child(parent, &child);
    cache.insert(key, score);
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_resize_on_hash_change() {
        let mut pool = SearchPool::new(&EngineSettings::default());
        pool.cache().insert(1, 5);
        pool.configure(&EngineSettings {
            threads: 4,
            hash_mb: 16,
        });
        assert_eq!(pool.num_threads(), 4);
        assert_eq!(pool.cache().len(), 1);

        pool.configure(&EngineSettings {
            threads: 0,
            hash_mb: 32,
        });
        assert_eq!(pool.num_threads(), 1);
        assert!(pool.cache().is_empty());
    }

    #[test]
    fn clear_empties_cache() {
        let pool = SearchPool::new(&EngineSettings::default());
        pool.cache().insert(7, 1);
        pool.clear();
        assert!(pool.cache().is_empty());
    }

    #[test]
    fn search_prefers_free_capture() {
        let fen: shakmaty::fen::Fen = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let chess: Chess = fen.into_position(shakmaty::CastlingMode::Standard).unwrap();
        let control = SearchControl::new(StopHandle::new(), &SearchLimits::default());
        let cache = ScoreCache::new(1);
        for threads in [1, 3] {
            let result = search(&chess, threads, &control, &cache);
            assert_eq!(result.best_move.to_string(), "e4d5");
        }
    }
}
