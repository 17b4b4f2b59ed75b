//! Persistence seam for daily challenge sets.
//!
//! The engine talks to the store through `ChallengeStore`:
//!   - unique-key lookup by (visitorId, date)
//!   - insert guarded by that uniqueness (creation races get a `Conflict`)
//!   - whole-document put, last-writer-wins on the single record
//!   - by-visitor query ordered by date descending (history/streak)
//!
//! `MemoryStore` is the in-process implementation used in tests and
//! single-node deployments; a hosted document database sits behind the same
//! trait in production.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::DailyChallengeSet;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A set already exists for this (visitor, date) key. Duplicate sets for
    /// one day would corrupt progress aggregation, so insertion fails the
    /// loser instead of last-writer-wins.
    #[error("challenge set already exists for visitor {visitor_id} on {date}")]
    Conflict { visitor_id: String, date: NaiveDate },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Unique-index lookup by (visitorId, date).
    async fn get(
        &self,
        visitor_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyChallengeSet>, StoreError>;

    /// Insert a brand-new set; `Conflict` if the key is already taken.
    async fn insert(&self, set: DailyChallengeSet) -> Result<(), StoreError>;

    /// Replace the document for an existing (visitorId, date) key.
    async fn put(&self, set: DailyChallengeSet) -> Result<(), StoreError>;

    /// The most recent sets for a visitor, date descending, at most `limit`.
    async fn recent(
        &self,
        visitor_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyChallengeSet>, StoreError>;
}

/// In-memory store: primary map keyed by (visitor, date) plus a secondary
/// per-visitor date index kept sorted descending.
#[derive(Default)]
pub struct MemoryStore {
    by_key: RwLock<HashMap<(String, NaiveDate), DailyChallengeSet>>,
    by_visitor: RwLock<HashMap<String, Vec<NaiveDate>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_date(dates: &mut Vec<NaiveDate>, date: NaiveDate) {
        // Keep the index sorted newest-first; ignore a date already present.
        if let Err(pos) = dates.binary_search_by(|d| date.cmp(d)) {
            dates.insert(pos, date);
        }
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn get(
        &self,
        visitor_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyChallengeSet>, StoreError> {
        let by_key = self.by_key.read().await;
        Ok(by_key.get(&(visitor_id.to_string(), date)).cloned())
    }

    async fn insert(&self, set: DailyChallengeSet) -> Result<(), StoreError> {
        let mut by_key = self.by_key.write().await;
        let key = (set.visitor_id.clone(), set.date);
        if by_key.contains_key(&key) {
            return Err(StoreError::Conflict {
                visitor_id: set.visitor_id,
                date: set.date,
            });
        }
        {
            let mut by_visitor = self.by_visitor.write().await;
            Self::index_date(by_visitor.entry(set.visitor_id.clone()).or_default(), set.date);
        }
        by_key.insert(key, set);
        Ok(())
    }

    async fn put(&self, set: DailyChallengeSet) -> Result<(), StoreError> {
        let mut by_key = self.by_key.write().await;
        let key = (set.visitor_id.clone(), set.date);
        if !by_key.contains_key(&key) {
            let mut by_visitor = self.by_visitor.write().await;
            Self::index_date(by_visitor.entry(set.visitor_id.clone()).or_default(), set.date);
        }
        by_key.insert(key, set);
        Ok(())
    }

    async fn recent(
        &self,
        visitor_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyChallengeSet>, StoreError> {
        let dates: Vec<NaiveDate> = {
            self.by_visitor
                .read()
                .await
                .get(visitor_id)
                .map(|d| d.iter().take(limit).copied().collect())
                .unwrap_or_default()
        };

        let by_key = self.by_key.read().await;
        Ok(dates
            .into_iter()
            .filter_map(|d| by_key.get(&(visitor_id.to_string(), d)).cloned())
            .collect())
    }
}
