//! In-process implementation of link repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use crate::domain::entities::{LinkPatch, LinkRecord, Platform};
use crate::domain::reconcile::{
    LinkChangeSet, LinkMove, LinkUnitOfWork, ReconcileOutcome, apply_changes,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::id_generator::generate_link_id;

/// Whole store contents. Batches run on a clone and are committed by
/// swapping it in.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// All records in insertion order.
    records: Vec<LinkRecord>,
    /// Owner reverse index, insertion ordered, without duplicates.
    owner_index: HashMap<String, Vec<String>>,
}

impl MemoryState {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn duplicate_platform(&self, owner_id: &str) -> Option<Platform> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| r.is_owned_by(owner_id))
            .map(|r| r.platform)
            .find(|platform| !seen.insert(*platform))
    }
}

fn unique_violation() -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "profile_links_owner_platform_key" }),
    )
}

/// Link repository kept in process memory.
///
/// A single lock serializes batches. Each [`LinkRepository::reconcile`] call
/// works on a draft of the store that replaces it only when every step
/// succeeded. Used by tests and by `LINK_STORE=memory` deployments.
#[derive(Default)]
pub struct MemoryLinkRepository {
    state: Mutex<MemoryState>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing reconciliation. For seeding fixtures.
    pub async fn insert_record(&self, record: LinkRecord) {
        let mut state = self.state.lock().await;
        state
            .owner_index
            .entry(record.owner_id.clone())
            .or_default()
            .push(record.id.clone());
        state.records.push(record);
    }

    /// Total number of stored records, across owners.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Applies `changes` to a draft handed to `unit_of_work` and commits the
    /// draft once the whole batch succeeded.
    async fn apply_draft<U, F>(
        &self,
        owner_id: &str,
        changes: &LinkChangeSet,
        unit_of_work: F,
    ) -> Result<ReconcileOutcome, AppError>
    where
        F: FnOnce(MemoryState) -> U,
        U: LinkUnitOfWork + Into<MemoryState>,
    {
        let mut state = self.state.lock().await;
        let mut draft = unit_of_work(state.clone());

        let outcome = apply_changes(&mut draft, owner_id, changes).await?;

        *state = draft.into();
        Ok(outcome)
    }
}

#[async_trait]
impl LinkUnitOfWork for MemoryState {
    async fn delete_owned(&mut self, ids: &[String], owner_id: &str) -> Result<u64, AppError> {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.owner_id == owner_id && ids.contains(&r.id)));
        let removed = before - self.records.len();

        if removed > 0
            && let Some(index) = self.owner_index.get_mut(owner_id)
        {
            index.retain(|id| !ids.contains(id));
        }

        Ok(removed as u64)
    }

    async fn find_owned(
        &mut self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<LinkRecord>, AppError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.id == id && r.is_owned_by(owner_id))
            .cloned())
    }

    async fn find_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<LinkRecord>, AppError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.is_owned_by(owner_id) && r.platform == platform)
            .cloned())
    }

    async fn upsert_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError> {
        let now = Utc::now();

        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.is_owned_by(owner_id) && r.platform == platform)
        {
            if LinkPatch::url(url).apply_to(record) {
                record.updated_at = now;
            }
            return Ok(record.clone());
        }

        let record = LinkRecord::new(
            generate_link_id(),
            owner_id.to_string(),
            platform,
            url.to_string(),
            now,
            now,
        );
        self.records.push(record.clone());

        Ok(record)
    }

    async fn patch(&mut self, id: &str, patch: &LinkPatch) -> Result<LinkRecord, AppError> {
        let position = self
            .position(id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if let Some(platform) = patch.platform {
            let owner_id = &self.records[position].owner_id;
            let taken = self
                .records
                .iter()
                .any(|r| r.id != id && &r.owner_id == owner_id && r.platform == platform);
            if taken {
                return Err(unique_violation());
            }
        }

        let record = &mut self.records[position];
        if patch.apply_to(record) {
            record.updated_at = Utc::now();
        }

        Ok(record.clone())
    }

    async fn relocate(&mut self, owner_id: &str, moves: &[LinkMove]) -> Result<(), AppError> {
        let now = Utc::now();

        for link_move in moves {
            let record = self
                .records
                .iter_mut()
                .find(|r| r.id == link_move.id && r.is_owned_by(owner_id))
                .ok_or_else(|| {
                    AppError::not_found("Link not found", json!({ "id": link_move.id }))
                })?;

            let patch = LinkPatch {
                platform: Some(link_move.platform),
                url: Some(link_move.url.clone()),
            };
            if patch.apply_to(record) {
                record.updated_at = now;
            }
        }

        if self.duplicate_platform(owner_id).is_some() {
            return Err(unique_violation());
        }

        Ok(())
    }

    async fn index_link(&mut self, owner_id: &str, link_id: &str) -> Result<(), AppError> {
        let index = self.owner_index.entry(owner_id.to_string()).or_default();

        if !index.iter().any(|id| id == link_id) {
            index.push(link_id.to_string());
        }

        Ok(())
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|r| r.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn delete_where(&self, ids: &[String], owner_id: &str) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        state.delete_owned(ids, owner_id).await
    }

    async fn upsert_by_owner_platform(
        &self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError> {
        let mut state = self.state.lock().await;
        let record = state.upsert_by_platform(owner_id, platform, url).await?;
        state.index_link(owner_id, &record.id).await?;
        Ok(record)
    }

    async fn owner_index(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        Ok(state.owner_index.get(owner_id).cloned().unwrap_or_default())
    }

    async fn reconcile(
        &self,
        owner_id: &str,
        changes: &LinkChangeSet,
    ) -> Result<ReconcileOutcome, AppError> {
        self.apply_draft(owner_id, changes, |draft| draft).await
    }

    async fn health_check(&self) -> bool {
        true
    }
}
