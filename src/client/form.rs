//! Editable link list held by a client session.

use crate::api::dto::links::ReconcileRequest;
use crate::domain::entities::{LinkEntry, Platform};
use crate::domain::validation::ValidationError;

use super::gateway::{GatewayError, LinkGateway};
use super::request::build_request;

/// A single field change on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryEdit {
    Platform(Option<Platform>),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("No link at position {index} (list has {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Why a submit did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The list is malformed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another submit is still outstanding.
    #[error("Already saving")]
    AlreadySaving,

    /// The request was sent and failed; local state is unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Ordered, editable list of one owner's links.
///
/// Rows removed after being persisted are remembered as pending removals
/// until a submit succeeds. Rows that were never persisted vanish without
/// trace.
#[derive(Debug, Clone)]
pub struct LinkForm {
    owner_id: String,
    entries: Vec<LinkEntry>,
    pending_removals: Vec<String>,
    saving: bool,
}

impl LinkForm {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            entries: Vec::new(),
            pending_removals: Vec::new(),
            saving: false,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    /// Identifiers to delete on the next submit, in removal order.
    pub fn pending_removals(&self) -> &[String] {
        &self.pending_removals
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Replaces the list with server state.
    ///
    /// An empty list becomes one blank row so there is always something to edit.
    pub fn load(&mut self, entries: Vec<LinkEntry>) {
        self.entries = if entries.is_empty() {
            vec![LinkEntry::blank()]
        } else {
            entries
        };
        self.pending_removals.clear();
    }

    /// Adds a blank row at the end.
    pub fn append(&mut self) {
        self.entries.push(LinkEntry::blank());
    }

    pub fn update(&mut self, index: usize, edit: EntryEdit) -> Result<(), FormError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(FormError::IndexOutOfBounds { index, len })?;

        match edit {
            EntryEdit::Platform(platform) => entry.platform = platform,
            EntryEdit::Url(url) => entry.url = url,
        }
        Ok(())
    }

    /// Removes the row at `index` and returns it.
    ///
    /// A persisted row's identifier is queued for deletion.
    pub fn remove_at(&mut self, index: usize) -> Result<LinkEntry, FormError> {
        if index >= self.entries.len() {
            return Err(FormError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            });
        }

        let entry = self.entries.remove(index);

        if let Some(id) = &entry.id
            && !self.pending_removals.contains(id)
        {
            self.pending_removals.push(id.clone());
        }

        Ok(entry)
    }

    /// Validates the list and marks the form as saving.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::AlreadySaving`] if a submit is outstanding
    /// - [`SubmitError::Validation`] if the list is malformed; the form stays idle
    pub fn begin_submit(&mut self) -> Result<ReconcileRequest, SubmitError> {
        if self.saving {
            return Err(SubmitError::AlreadySaving);
        }

        let request = build_request(&self.owner_id, &self.entries, &self.pending_removals)?;
        self.saving = true;
        Ok(request)
    }

    /// Completes a submit started with [`begin_submit`](Self::begin_submit).
    ///
    /// On success the list becomes the canonical list returned by the
    /// service and pending removals are cleared. On failure nothing changes
    /// so the same edits can be resubmitted.
    pub fn finish_submit(
        &mut self,
        result: Result<Vec<LinkEntry>, GatewayError>,
    ) -> Result<(), SubmitError> {
        self.saving = false;

        match result {
            Ok(canonical) => {
                self.entries = canonical;
                self.pending_removals.clear();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    owner_id = %self.owner_id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Saving links failed"
                );
                Err(SubmitError::Gateway(e))
            }
        }
    }

    /// Validates, sends and applies the result in one call.
    pub async fn submit(&mut self, gateway: &dyn LinkGateway) -> Result<(), SubmitError> {
        let request = self.begin_submit()?;
        let result = gateway.apply(&request).await;
        self.finish_submit(result)
    }

    /// Reloads the list from the service.
    ///
    /// Unsaved edits and pending removals are discarded.
    pub async fn refresh(&mut self, gateway: &dyn LinkGateway) -> Result<(), GatewayError> {
        let entries = gateway.fetch_links(&self.owner_id).await?;
        self.load(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::gateway::MockLinkGateway;
    use pretty_assertions::assert_eq;

    fn persisted(id: &str, platform: Platform, url: &str) -> LinkEntry {
        LinkEntry {
            id: Some(id.to_string()),
            platform: Some(platform),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_load_empty_shows_one_blank_row() {
        let mut form = LinkForm::new("u1");
        form.load(vec![]);

        assert_eq!(form.entries(), &[LinkEntry::blank()]);
        assert!(form.entries()[0].platform.is_none());
        assert_eq!(form.entries()[0].url, "");
    }

    #[test]
    fn test_load_clears_pending_removals() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);
        form.remove_at(0).unwrap();
        assert_eq!(form.pending_removals(), &["a1".to_string()]);

        form.load(vec![]);

        assert!(form.pending_removals().is_empty());
    }

    #[test]
    fn test_append_keeps_pending_removals() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);
        form.remove_at(0).unwrap();

        form.append();

        assert_eq!(form.entries(), &[LinkEntry::blank()]);
        assert_eq!(form.pending_removals(), &["a1".to_string()]);
    }

    #[test]
    fn test_remove_unsaved_row_queues_nothing() {
        let mut form = LinkForm::new("u1");
        form.load(vec![]);
        form.update(0, EntryEdit::Platform(Some(Platform::Twitch)))
            .unwrap();

        let removed = form.remove_at(0).unwrap();

        assert_eq!(removed.platform, Some(Platform::Twitch));
        assert!(form.entries().is_empty());
        assert!(form.pending_removals().is_empty());
    }

    #[test]
    fn test_update_out_of_bounds() {
        let mut form = LinkForm::new("u1");
        form.load(vec![]);

        assert_eq!(
            form.update(3, EntryEdit::Url("https://a".to_string())),
            Err(FormError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(
            form.remove_at(1).unwrap_err(),
            FormError::IndexOutOfBounds { index: 1, len: 1 }
        );
    }

    #[tokio::test]
    async fn test_duplicate_platform_never_reaches_gateway() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);
        form.append();
        form.update(1, EntryEdit::Platform(Some(Platform::Github)))
            .unwrap();
        form.update(1, EntryEdit::Url("https://b".to_string()))
            .unwrap();

        let gateway = MockLinkGateway::new();
        let result = form.submit(&gateway).await;

        assert_eq!(
            result,
            Err(SubmitError::Validation(ValidationError::DuplicatePlatform {
                platform: Platform::Github
            }))
        );
        assert!(!form.is_saving());
        assert_eq!(form.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_gateway() {
        let mut form = LinkForm::new("u1");
        form.load(vec![]);
        form.update(0, EntryEdit::Platform(Some(Platform::Youtube)))
            .unwrap();
        form.update(0, EntryEdit::Url("youtube".to_string())).unwrap();

        let gateway = MockLinkGateway::new();
        let result = form.submit(&gateway).await;

        assert!(matches!(
            result,
            Err(SubmitError::Validation(ValidationError::InvalidUrl { .. }))
        ));
    }

    #[tokio::test]
    async fn test_submit_replaces_state_with_canonical_list() {
        let mut form = LinkForm::new("u1");
        form.load(vec![
            persisted("a1", Platform::Github, "https://a"),
            persisted("a2", Platform::Gitlab, "https://g"),
        ]);
        form.remove_at(1).unwrap();
        form.update(0, EntryEdit::Url("https://a2".to_string()))
            .unwrap();

        let mut gateway = MockLinkGateway::new();
        gateway
            .expect_apply()
            .withf(|request| {
                request.user_id == "u1"
                    && request.links_to_remove == vec!["a2".to_string()]
                    && request.links.len() == 1
                    && request.links[0].id.as_deref() == Some("a1")
            })
            .times(1)
            .returning(|_| Ok(vec![persisted("a1", Platform::Github, "https://a2")]));

        form.submit(&gateway).await.unwrap();

        assert_eq!(
            form.entries(),
            &[persisted("a1", Platform::Github, "https://a2")]
        );
        assert!(form.pending_removals().is_empty());
        assert!(!form.is_saving());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_state() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);
        form.remove_at(0).unwrap();
        form.append();
        form.update(0, EntryEdit::Platform(Some(Platform::Hashnode)))
            .unwrap();
        form.update(0, EntryEdit::Url("https://hashnode.com/@u1".to_string()))
            .unwrap();
        let before = form.entries().to_vec();

        let mut gateway = MockLinkGateway::new();
        gateway.expect_apply().times(1).returning(|_| {
            Err(GatewayError::Network {
                message: "operation timed out".to_string(),
                retryable: true,
            })
        });

        let err = form.submit(&gateway).await.unwrap_err();

        match err {
            SubmitError::Gateway(e) => assert!(e.is_retryable()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(form.entries(), before.as_slice());
        assert_eq!(form.pending_removals(), &["a1".to_string()]);
        assert!(!form.is_saving());
    }

    #[test]
    fn test_second_submit_is_rejected_while_saving() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);

        let request = form.begin_submit().unwrap();
        assert!(form.is_saving());
        assert_eq!(request.links.len(), 1);

        assert_eq!(form.begin_submit(), Err(SubmitError::AlreadySaving));

        form.finish_submit(Ok(vec![])).unwrap();
        assert!(!form.is_saving());
        assert!(form.begin_submit().is_ok());
    }

    #[test]
    fn test_submit_success_does_not_pad_empty_list() {
        let mut form = LinkForm::new("u1");
        form.load(vec![persisted("a1", Platform::Github, "https://a")]);
        form.remove_at(0).unwrap();

        form.begin_submit().unwrap();
        form.finish_submit(Ok(vec![])).unwrap();

        assert!(form.entries().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_loads_from_gateway() {
        let mut form = LinkForm::new("u1");

        let mut gateway = MockLinkGateway::new();
        gateway
            .expect_fetch_links()
            .withf(|owner| owner == "u1")
            .times(1)
            .returning(|_| Ok(vec![]));

        form.refresh(&gateway).await.unwrap();

        assert_eq!(form.entries(), &[LinkEntry::blank()]);
    }
}
