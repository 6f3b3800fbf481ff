//! Link reconciliation: applying one batch of removals and upserts.
//!
//! A batch is applied against a [`LinkUnitOfWork`], which the store backs
//! with a transaction (PostgreSQL) or a draft committed under a lock
//! (memory). The algorithm lives here so every store applies batches
//! identically.
//!
//! # Steps
//!
//! 1. Delete every removal identifier owned by the caller. Foreign or unknown
//!    identifiers are skipped silently.
//! 2. Upsert every entry in order (see [`apply_changes`] for the key rules).
//! 3. Add each upserted identifier to the owner's index.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::domain::entities::{LinkPatch, LinkRecord, Platform};
use crate::error::AppError;

/// One entry to write, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkUpsert {
    /// Durable identifier of the row the entry was loaded from, if any.
    pub id: Option<String>,
    pub platform: Platform,
    pub url: String,
}

/// A record moving to another platform under its own identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMove {
    pub id: String,
    pub platform: Platform,
    pub url: String,
}

/// A validated reconciliation batch for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChangeSet {
    pub removals: Vec<String>,
    pub upserts: Vec<LinkUpsert>,
}

impl LinkChangeSet {
    /// Builds a change set, dropping empty and repeated removal identifiers.
    pub fn new(removals: Vec<String>, upserts: Vec<LinkUpsert>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(removals.len());
        for id in removals {
            if !id.is_empty() && !unique.contains(&id) {
                unique.push(id);
            }
        }

        Self {
            removals: unique,
            upserts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.upserts.is_empty()
    }
}

/// Result of applying a [`LinkChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Number of records deleted, including records merged away in step 2.
    pub removed: u64,
    /// Records touched by step 2, once each, in first-occurrence order.
    pub links: Vec<LinkRecord>,
}

/// Store operations available while a batch is being applied.
///
/// Everything done through one unit of work is committed or discarded
/// together by the store that handed it out.
#[async_trait]
pub trait LinkUnitOfWork: Send {
    /// Deletes records in `ids` that belong to `owner_id`. Returns the count.
    async fn delete_owned(&mut self, ids: &[String], owner_id: &str) -> Result<u64, AppError>;

    async fn find_owned(&mut self, id: &str, owner_id: &str)
    -> Result<Option<LinkRecord>, AppError>;

    async fn find_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<LinkRecord>, AppError>;

    /// Updates the url of `(owner_id, platform)`, creating the record if absent.
    async fn upsert_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError>;

    /// Applies `patch` to record `id`.
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist.
    async fn patch(&mut self, id: &str, patch: &LinkPatch) -> Result<LinkRecord, AppError>;

    /// Moves every listed record of `owner_id` to its new platform and url
    /// as one step.
    ///
    /// A target only has to be free once all listed records have left their
    /// current platforms, so records may trade platforms with each other.
    /// Identifiers, creation times and index entries are kept.
    async fn relocate(&mut self, owner_id: &str, moves: &[LinkMove]) -> Result<(), AppError>;

    /// Adds `link_id` to the owner's index. Adding twice is a no-op.
    async fn index_link(&mut self, owner_id: &str, link_id: &str) -> Result<(), AppError>;
}

/// How one entry is written in step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertKey<'a> {
    /// Patch the url of this owned record.
    Id(&'a str),
    /// Upsert by `(owner_id, platform)`.
    Platform,
}

#[derive(Debug, Default)]
struct UpsertPlan<'a> {
    keys: Vec<UpsertKey<'a>>,
    merged: Vec<String>,
    moves: Vec<LinkMove>,
}

/// Resolves every entry against the records as they stand after step 1,
/// before anything in step 2 is written.
async fn plan_upserts<'a, U>(
    uow: &mut U,
    owner_id: &str,
    upserts: &'a [LinkUpsert],
) -> Result<UpsertPlan<'a>, AppError>
where
    U: LinkUnitOfWork + ?Sized,
{
    // The last entry naming an identifier decides where its record ends up.
    let mut last_claim: HashMap<&str, usize> = HashMap::new();
    for (index, upsert) in upserts.iter().enumerate() {
        if let Some(id) = upsert.id.as_deref().filter(|id| !id.is_empty()) {
            last_claim.insert(id, index);
        }
    }
    let mut claims: Vec<(&str, usize)> = last_claim.into_iter().collect();
    claims.sort_by_key(|&(_, index)| index);

    let mut plan = UpsertPlan {
        keys: vec![UpsertKey::Platform; upserts.len()],
        ..UpsertPlan::default()
    };
    let mut movers: Vec<(&str, usize)> = Vec::new();

    for &(id, index) in &claims {
        let Some(current) = uow.find_owned(id, owner_id).await? else {
            continue;
        };

        if current.platform == upserts[index].platform {
            plan.keys[index] = UpsertKey::Id(id);
        } else {
            movers.push((id, index));
        }
    }

    let leaving: HashSet<&str> = movers.iter().map(|&(id, _)| id).collect();
    let mut last_arrival: HashMap<Platform, usize> = HashMap::new();
    for &(_, index) in &movers {
        last_arrival.insert(upserts[index].platform, index);
    }

    for &(id, index) in &movers {
        let upsert = &upserts[index];
        let occupant = uow.find_by_platform(owner_id, upsert.platform).await?;
        let vacated = occupant.is_none_or(|o| leaving.contains(o.id.as_str()));

        if vacated && last_arrival.get(&upsert.platform) == Some(&index) {
            plan.keys[index] = UpsertKey::Id(id);
            plan.moves.push(LinkMove {
                id: id.to_string(),
                platform: upsert.platform,
                url: upsert.url.clone(),
            });
        } else {
            // The platform keeps another holder: this entry merges into it.
            plan.merged.push(id.to_string());
        }
    }

    Ok(plan)
}

/// Applies `changes` for `owner_id`.
///
/// # Upsert keys
///
/// Every entry is resolved against the owner's records as they stand before
/// step 2, so the order of entries never changes which record they address.
///
/// - Entries without an identifier, or whose identifier is not owned by
///   `owner_id`, are upserted by `(owner_id, platform)`.
/// - An owned identifier whose platform is unchanged gets its url updated.
/// - An owned identifier whose platform changed keeps its identifier on the
///   new platform when that platform is free or its holder is moving away
///   in the same batch. Otherwise the holder takes the url and the moved
///   record is deleted.
/// - When one identifier appears several times, its last entry decides
///   where the record goes; earlier ones are keyed by platform.
///
/// Repeated platforms in one batch resolve to the last entry.
///
/// # Errors
///
/// Propagates store errors unchanged. The caller discards the unit of work.
pub async fn apply_changes<U>(
    uow: &mut U,
    owner_id: &str,
    changes: &LinkChangeSet,
) -> Result<ReconcileOutcome, AppError>
where
    U: LinkUnitOfWork + ?Sized,
{
    let mut removed = if changes.removals.is_empty() {
        0
    } else {
        uow.delete_owned(&changes.removals, owner_id).await?
    };

    let plan = plan_upserts(uow, owner_id, &changes.upserts).await?;

    if !plan.merged.is_empty() {
        removed += uow.delete_owned(&plan.merged, owner_id).await?;
    }
    if !plan.moves.is_empty() {
        uow.relocate(owner_id, &plan.moves).await?;
    }

    let mut links: Vec<LinkRecord> = Vec::with_capacity(changes.upserts.len());

    for (upsert, key) in changes.upserts.iter().zip(&plan.keys) {
        let record = match *key {
            UpsertKey::Id(id) => uow.patch(id, &LinkPatch::url(upsert.url.as_str())).await?,
            UpsertKey::Platform => {
                uow.upsert_by_platform(owner_id, upsert.platform, &upsert.url)
                    .await?
            }
        };

        uow.index_link(owner_id, &record.id).await?;

        match links.iter_mut().find(|l| l.id == record.id) {
            Some(slot) => *slot = record,
            None => links.push(record),
        }
    }

    Ok(ReconcileOutcome { removed, links })
}
