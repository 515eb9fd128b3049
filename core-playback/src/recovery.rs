//! # Recovery Coordinator
//!
//! Heals blocked remote tracks: asks the resolver for an alternative query,
//! runs discovery on it and builds a substitute track from the first
//! candidate.
//!
//! Attempts are bounded per *lineage*: a substitute inherits the attempt
//! counter of the track it replaced, so a resolver that keeps returning
//! broken assets cannot loop forever.
//!
//! The coordinator never touches player state. The engine decides whether
//! a substitute is still wanted and plays it.

use bridge_traits::time::Clock;
use core_library::models::Track;
use core_metadata::discovery::{
    alternative_or_none, first_resolvable, search_or_empty, DiscoveryService,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of one healing attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Substitution {
    /// Fresh remote track to play instead.
    Found(Track),
    /// The resolver had no alternative query.
    NoAlternative,
    /// Discovery found nothing for the alternative query.
    NoCandidates { query: String },
}

#[derive(Default)]
struct LineageBook {
    /// track id -> id of the first track of its lineage
    roots: HashMap<String, String>,
    /// root id -> attempts spent
    attempts: HashMap<String, u32>,
}

impl LineageBook {
    fn root_of(&self, track_id: &str) -> String {
        self.roots
            .get(track_id)
            .cloned()
            .unwrap_or_else(|| track_id.to_string())
    }
}

pub struct RecoveryCoordinator {
    discovery: Arc<dyn DiscoveryService>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    book: Mutex<LineageBook>,
}

impl RecoveryCoordinator {
    pub fn new(discovery: Arc<dyn DiscoveryService>, clock: Arc<dyn Clock>, max_attempts: u32) -> Self {
        Self {
            discovery,
            clock,
            max_attempts,
            book: Mutex::new(LineageBook::default()),
        }
    }

    /// Reserves an attempt for `failed`'s lineage.
    ///
    /// Returns the 1-based attempt number, or `None` once the lineage is out
    /// of attempts.
    pub fn begin_attempt(&self, failed: &Track) -> Option<u32> {
        let mut book = self.book.lock();
        let root = book.root_of(&failed.id);
        let spent = book.attempts.entry(root).or_insert(0);

        if *spent >= self.max_attempts {
            return None;
        }
        *spent += 1;
        Some(*spent)
    }

    /// Attempts spent on the lineage `track_id` belongs to.
    pub fn attempts_for(&self, track_id: &str) -> u32 {
        let book = self.book.lock();
        let root = book.root_of(track_id);
        book.attempts.get(&root).copied().unwrap_or(0)
    }

    /// Links `track_id` into the lineage of `failed`.
    pub fn adopt(&self, track_id: &str, failed: &Track) {
        let mut book = self.book.lock();
        let root = book.root_of(&failed.id);
        if track_id != root {
            book.roots.insert(track_id.to_string(), root);
        }
    }

    /// One resolver call, then one discovery call. A first candidate that
    /// is itself a free-text query costs one more discovery call to turn it
    /// into an identifier.
    #[instrument(skip(self, failed), fields(track_id = %failed.id))]
    pub async fn find_substitute(&self, failed: &Track) -> Substitution {
        let Some(query) = alternative_or_none(self.discovery.as_ref(), failed).await else {
            debug!("Resolver offered no alternative");
            return Substitution::NoAlternative;
        };

        let candidates = search_or_empty(self.discovery.as_ref(), &query).await;
        let Some(candidate) = candidates.into_iter().next() else {
            debug!(%query, "Alternative query found nothing");
            return Substitution::NoCandidates { query };
        };

        let candidate = if candidate.has_identifier() {
            candidate
        } else {
            let refined = search_or_empty(self.discovery.as_ref(), &candidate.uri).await;
            match first_resolvable(&refined) {
                Some(resolved) => resolved.clone(),
                None => {
                    debug!(query = %candidate.uri, "Free-text substitute did not resolve");
                    return Substitution::NoCandidates {
                        query: candidate.uri,
                    };
                }
            }
        };

        let substitute = candidate.to_remote_track(self.clock.unix_timestamp_millis());
        self.adopt(&substitute.id, failed);

        info!(
            substitute_id = %substitute.id,
            uri = %substitute.uri,
            "Found substitute for blocked track"
        );
        Substitution::Found(substitute)
    }
}
