//! Published generations of song data.
//!
//! A [`Generation`] is one complete, internally consistent snapshot: the
//! store, the vocabulary derived from it, and the report of the load that
//! produced them. Generations are built entirely off to the side and then
//! published into a [`Catalog`] with a single pointer swap.
//!
//! ```text
//! reader ──snapshot()──▶ Arc<Generation #4> ──▶ every read of one request
//! reload ──build #5 (no lock held)──▶ publish() ──swap──▶ Arc<Generation #5>
//! ```
//!
//! Readers hold their `Arc` for as long as they need it, so a request that
//! started on generation 4 finishes on generation 4 even if 5 is published
//! midway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::ingest::{build_store, IngestOptions, IngestReport};
use crate::source::SongSource;
use crate::store::SongStore;
use crate::vocabulary::Vocabulary;

#[derive(Debug)]
pub struct Generation {
    pub id: u64,
    pub loaded_at: DateTime<Utc>,
    pub store: SongStore,
    pub vocabulary: Vocabulary,
    pub report: IngestReport,
}

impl Generation {
    /// An empty generation, used before the first load completes.
    pub fn empty() -> Self {
        Self {
            id: 0,
            loaded_at: Utc::now(),
            store: SongStore::new(),
            vocabulary: Vocabulary::new(),
            report: IngestReport::default(),
        }
    }

    /// Assemble a generation from a finished store.
    pub fn from_store(id: u64, store: SongStore, report: IngestReport) -> Self {
        let vocabulary = Vocabulary::from_store(&store);
        Self {
            id,
            loaded_at: Utc::now(),
            store,
            vocabulary,
            report,
        }
    }

    /// Fetch, normalize and index everything `source` provides.
    pub async fn build(id: u64, source: &dyn SongSource, options: &IngestOptions) -> Self {
        let (store, report) = build_store(source, options).await;
        Self::from_store(id, store, report)
    }
}

/// Holder of the current generation, shared by every request handler.
pub struct Catalog {
    current: RwLock<Arc<Generation>>,
    next_id: AtomicU64,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::empty())),
            next_id: AtomicU64::new(1),
        }
    }

    /// The generation to run one request against.
    pub fn snapshot(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read())
    }

    /// Reserve the id for a generation about to be built.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Make `generation` current, unless a newer one was published meanwhile.
    ///
    /// Returns `true` if the swap happened.
    pub fn publish(&self, generation: Generation) -> bool {
        let mut current = self.current.write();
        if generation.id <= current.id {
            warn!(
                stale = generation.id,
                current = current.id,
                "discarding generation older than the published one"
            );
            return false;
        }
        info!(
            generation = generation.id,
            songs = generation.store.song_count(),
            vocabulary = generation.vocabulary.len(),
            partial = generation.report.is_partial(),
            "publishing generation"
        );
        *current = Arc::new(generation);
        true
    }

    /// Build a fresh generation from `source` and publish it.
    pub async fn reload(&self, source: &dyn SongSource, options: &IngestOptions) -> Arc<Generation> {
        let id = self.next_id();
        let generation = Generation::build(id, source, options).await;
        if generation.report.is_partial() {
            warn!(
                generation = id,
                failed = generation.report.failures.len(),
                "generation built from partial data"
            );
        }
        self.publish(generation);
        self.snapshot()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
