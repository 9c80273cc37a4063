use std::sync::Arc;

use shared::domain::{ContentId, ContentKind};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    mapper::{denormalize, normalize, WriteMode},
    model::{ContentForm, ContentItem},
    orchestrator::FetchOrchestrator,
    query::QueryState,
    transport::{ContentTransport, ImageUpload},
};

/// Yes/no decision supplied by the hosting shell before destructive actions.
pub trait ConfirmationProvider: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Confirms everything; for non-interactive shells that already asked.
pub struct AutoConfirm;

impl ConfirmationProvider for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Cancelled,
    Removed,
}

pub fn delete_prompt(kind: Option<ContentKind>) -> &'static str {
    match kind {
        Some(ContentKind::News) => "Are you sure you want to delete this news item?",
        Some(ContentKind::Announcement) => "Are you sure you want to delete this announcement?",
        None => "Are you sure you want to delete this item?",
    }
}

/// Runs create/update/delete for a listing and then reloads it through the
/// listing's orchestrator, so the refetch obeys the same staleness rules as
/// any other search.
pub struct MutationCoordinator {
    transport: Arc<dyn ContentTransport>,
    orchestrator: Arc<FetchOrchestrator>,
    confirm: Arc<dyn ConfirmationProvider>,
}

impl MutationCoordinator {
    pub fn new(
        transport: Arc<dyn ContentTransport>,
        orchestrator: Arc<FetchOrchestrator>,
        confirm: Arc<dyn ConfirmationProvider>,
    ) -> Self {
        Self {
            transport,
            orchestrator,
            confirm,
        }
    }

    /// On success the listing jumps back to the first page, where the newest
    /// item shows up under the default id-descending sort.
    pub async fn create(
        &self,
        query: &mut QueryState,
        kind: ContentKind,
        form: &ContentForm,
    ) -> Result<ContentItem, ClientError> {
        self.orchestrator.clear_error().await;
        let payload = match denormalize(form, kind, WriteMode::Create) {
            Ok(payload) => payload,
            Err(err) => return self.fail(err.into()).await,
        };

        let created = match self.transport.create_item(&payload).await {
            Ok(wire) => normalize(wire),
            Err(err) => {
                warn!(%kind, "mutation: create failed: {err:#}");
                return self.fail(ClientError::transport(&err)).await;
            }
        };
        info!(id = created.id.0, %kind, "mutation: created");

        self.reload_from_first_page(query).await;
        Ok(created)
    }

    pub async fn update(
        &self,
        query: &mut QueryState,
        id: ContentId,
        kind: ContentKind,
        form: &ContentForm,
    ) -> Result<ContentItem, ClientError> {
        self.orchestrator.clear_error().await;
        let payload = match denormalize(form, kind, WriteMode::Update) {
            Ok(payload) => payload,
            Err(err) => return self.fail(err.into()).await,
        };

        let updated = match self.transport.update_item(id, &payload).await {
            Ok(wire) => normalize(wire),
            Err(err) => {
                warn!(id = id.0, %kind, "mutation: update failed: {err:#}");
                return self.fail(ClientError::transport(&err)).await;
            }
        };
        info!(id = updated.id.0, %kind, "mutation: updated");

        self.reload_from_first_page(query).await;
        Ok(updated)
    }

    /// Deleting the only item of a page other than the first steps back one
    /// page before reloading. The decision uses the page as it was before
    /// the delete, without asking the server.
    pub async fn remove(
        &self,
        query: &mut QueryState,
        id: ContentId,
    ) -> Result<RemoveOutcome, ClientError> {
        if !self.confirm.confirm(delete_prompt(self.orchestrator.kind())) {
            info!(id = id.0, "mutation: delete declined");
            return Ok(RemoveOutcome::Cancelled);
        }

        self.orchestrator.clear_error().await;
        let items_on_page = self.orchestrator.current_page().await.items.len();

        if let Err(err) = self.transport.delete_item(id).await {
            warn!(id = id.0, "mutation: delete failed: {err:#}");
            return self.fail(ClientError::transport(&err)).await;
        }
        info!(id = id.0, "mutation: deleted");

        if items_on_page == 1 && query.page_index() > 0 {
            query.set_page_index(query.page_index() - 1);
        }
        self.orchestrator.search_now(query.clone()).await;
        Ok(RemoveOutcome::Removed)
    }

    /// Attaches an image to an announcement and reloads the current page.
    pub async fn upload_image(
        &self,
        query: &QueryState,
        id: ContentId,
        upload: ImageUpload,
    ) -> Result<ContentItem, ClientError> {
        self.orchestrator.clear_error().await;
        let updated = match self.transport.upload_image(id, upload).await {
            Ok(wire) => normalize(wire),
            Err(err) => {
                warn!(id = id.0, "mutation: image upload failed: {err:#}");
                return self.fail(ClientError::transport(&err)).await;
            }
        };

        self.orchestrator.search_now(query.clone()).await;
        Ok(updated)
    }

    async fn reload_from_first_page(&self, query: &mut QueryState) {
        query.set_page_index(0);
        self.orchestrator.search_now(query.clone()).await;
    }

    async fn fail<T>(&self, err: ClientError) -> Result<T, ClientError> {
        self.orchestrator.record_error(&err).await;
        Err(err)
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
