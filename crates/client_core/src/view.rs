use std::{fmt, str::FromStr, sync::Arc};

use shared::{
    domain::{ContentId, ContentKind, SortKey},
    error::UnknownVariant,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::{ClientError, ValidationError},
    mapper::normalize,
    model::{ContentForm, ContentItem},
    mutation::{ConfirmationProvider, MutationCoordinator, RemoveOutcome},
    orchestrator::{FetchOrchestrator, FetchOutcome, ListingEvent},
    page::PageResult,
    query::QueryState,
    transport::{ContentTransport, ImageUpload},
};

const PUBLIC_PAGE_SIZES: &[u32] = &[6, 12, 24];
const ADMIN_PAGE_SIZES: &[u32] = &[5, 10, 20];

/// The four listing screens. Public listings are read-only card grids with a
/// fixed newest-first order; admin listings are sortable tables with an
/// editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingProfile {
    PublicNews,
    PublicAnnouncements,
    AdminNews,
    AdminAnnouncements,
}

impl ListingProfile {
    pub const ALL: [ListingProfile; 4] = [
        ListingProfile::PublicNews,
        ListingProfile::PublicAnnouncements,
        ListingProfile::AdminNews,
        ListingProfile::AdminAnnouncements,
    ];

    pub fn kind(self) -> ContentKind {
        match self {
            Self::PublicNews | Self::AdminNews => ContentKind::News,
            Self::PublicAnnouncements | Self::AdminAnnouncements => ContentKind::Announcement,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::AdminNews | Self::AdminAnnouncements)
    }

    pub fn allowed_page_sizes(self) -> &'static [u32] {
        if self.is_admin() {
            ADMIN_PAGE_SIZES
        } else {
            PUBLIC_PAGE_SIZES
        }
    }

    pub fn default_page_size(self) -> u32 {
        if self.is_admin() {
            10
        } else {
            12
        }
    }

    pub fn sort_selectable(self) -> bool {
        self.is_admin()
    }

    pub fn allows_mutations(self) -> bool {
        self.is_admin()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicNews => "news",
            Self::PublicAnnouncements => "announcements",
            Self::AdminNews => "admin-news",
            Self::AdminAnnouncements => "admin-announcements",
        }
    }

    /// Admin listing that manages the given kind.
    pub fn admin_for(kind: ContentKind) -> Self {
        match kind {
            ContentKind::News => Self::AdminNews,
            ContentKind::Announcement => Self::AdminAnnouncements,
        }
    }
}

impl fmt::Display for ListingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingProfile {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("listing", s))
    }
}

/// Pagination controls as a screen shows them. `page_number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page_number: u32,
    pub total_pages: u32,
    pub can_previous: bool,
    pub can_next: bool,
}

impl Pager {
    fn new(page_index: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            page_number: page_index + 1,
            total_pages,
            can_previous: page_index > 0,
            can_next: page_index + 1 < total_pages,
        }
    }
}

/// Open create/edit form. `target` is `None` while creating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub target: Option<ContentId>,
    pub form: ContentForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub profile: ListingProfile,
    pub query: QueryState,
    pub page: PageResult,
    pub loading: bool,
    pub last_error: Option<String>,
    pub pager: Pager,
    pub editor: EditorState,
    pub selected: Option<ContentItem>,
}

struct ViewModel {
    query: QueryState,
    editor: EditorState,
    selected: Option<ContentItem>,
}

/// State owner of one listing screen.
///
/// Query edits go through [`QueryState`] and are handed to the listing's
/// [`FetchOrchestrator`]; the lock on the view model is never held across a
/// request, so snapshots stay readable while a search is in flight.
pub struct ListingView {
    profile: ListingProfile,
    transport: Arc<dyn ContentTransport>,
    orchestrator: Arc<FetchOrchestrator>,
    mutations: MutationCoordinator,
    model: Mutex<ViewModel>,
}

impl ListingView {
    pub fn new(
        profile: ListingProfile,
        transport: Arc<dyn ContentTransport>,
        confirm: Arc<dyn ConfirmationProvider>,
        settings: &ClientSettings,
    ) -> Self {
        let page_size = profile.default_page_size();
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&transport),
            Some(profile.kind()),
            page_size,
            settings.search_debounce(),
        );
        let mutations =
            MutationCoordinator::new(Arc::clone(&transport), Arc::clone(&orchestrator), confirm);

        Self {
            profile,
            transport,
            orchestrator,
            mutations,
            model: Mutex::new(ViewModel {
                query: QueryState::with_page_size(page_size),
                editor: EditorState::default(),
                selected: None,
            }),
        }
    }

    pub fn profile(&self) -> ListingProfile {
        self.profile
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.orchestrator.subscribe()
    }

    pub async fn load(&self) -> FetchOutcome {
        info!(profile = %self.profile, "view: initial load");
        self.refresh().await
    }

    pub async fn refresh(&self) -> FetchOutcome {
        let query = self.model.lock().await.query.clone();
        self.orchestrator.search_now(query).await
    }

    /// Search text is debounced; the page jumps back to the first one.
    pub async fn set_text(&self, text: &str) {
        let (query, change) = {
            let mut model = self.model.lock().await;
            let change = model.query.set_text(text);
            (model.query.clone(), change)
        };
        self.orchestrator.request_search(query, change).await;
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome, ClientError> {
        let allowed = self.profile.allowed_page_sizes();
        if !allowed.contains(&page_size) {
            return Err(ValidationError::UnsupportedPageSize {
                requested: page_size,
                allowed: allowed.to_vec(),
            }
            .into());
        }
        let query = {
            let mut model = self.model.lock().await;
            model.query.set_page_size(page_size);
            model.query.clone()
        };
        Ok(self.orchestrator.search_now(query).await)
    }

    pub async fn set_sort_key(&self, sort_key: SortKey) -> Result<FetchOutcome, ClientError> {
        if !self.profile.sort_selectable() {
            return Err(ValidationError::SortNotSelectable.into());
        }
        let query = {
            let mut model = self.model.lock().await;
            model.query.set_sort_key(sort_key);
            model.query.clone()
        };
        Ok(self.orchestrator.search_now(query).await)
    }

    /// Moves to a zero-based page. Pages outside the last known page count
    /// are ignored and reported as `false`.
    pub async fn go_to_page(&self, page_index: u32) -> bool {
        let total_pages = self.orchestrator.current_page().await.total_pages.max(1);
        if page_index >= total_pages {
            debug!(page_index, total_pages, "view: page out of range");
            return false;
        }
        let query = {
            let mut model = self.model.lock().await;
            model.query.set_page_index(page_index);
            model.query.clone()
        };
        self.orchestrator.search_now(query).await;
        true
    }

    pub async fn first_page(&self) -> bool {
        self.go_to_page(0).await
    }

    pub async fn previous_page(&self) -> bool {
        match self.current_index().await.checked_sub(1) {
            Some(index) => self.go_to_page(index).await,
            None => false,
        }
    }

    pub async fn next_page(&self) -> bool {
        let index = self.current_index().await;
        self.go_to_page(index.saturating_add(1)).await
    }

    pub async fn last_page(&self) -> bool {
        let total_pages = self.orchestrator.current_page().await.total_pages.max(1);
        self.go_to_page(total_pages - 1).await
    }

    /// Steps are taken from the page on screen, which the server may have
    /// clamped below the requested one.
    async fn current_index(&self) -> u32 {
        self.orchestrator.current_page().await.page_index
    }

    /// Opens the editor prefilled from the selected detail item or, failing
    /// that, from an item on the current page.
    pub async fn begin_edit(&self, id: ContentId) -> Result<(), ClientError> {
        self.ensure_mutable()?;
        let selected = self
            .model
            .lock()
            .await
            .selected
            .clone()
            .filter(|item| item.id == id);
        let item = match selected {
            Some(item) => item,
            None => self.item_on_page(id).await?,
        };
        let mut model = self.model.lock().await;
        model.editor = EditorState {
            target: Some(id),
            form: ContentForm::from_item(&item),
        };
        Ok(())
    }

    pub async fn edit_form<F>(&self, edit: F)
    where
        F: FnOnce(&mut ContentForm),
    {
        edit(&mut self.model.lock().await.editor.form);
    }

    pub async fn cancel_edit(&self) {
        self.model.lock().await.editor = EditorState::default();
    }

    /// Creates or updates from the open form. The form is only reset when
    /// the backend accepted it.
    pub async fn submit(&self) -> Result<ContentItem, ClientError> {
        self.ensure_mutable()?;
        let kind = self.profile.kind();
        let (mut query, editor) = {
            let model = self.model.lock().await;
            (model.query.clone(), model.editor.clone())
        };
        let issued = query.clone();

        let saved = match editor.target {
            Some(id) => {
                self.mutations
                    .update(&mut query, id, kind, &editor.form)
                    .await?
            }
            None => self.mutations.create(&mut query, kind, &editor.form).await?,
        };

        let mut model = self.model.lock().await;
        self.adopt_query(&mut model, &issued, query);
        if model.editor == editor {
            model.editor = EditorState::default();
        }
        Ok(saved)
    }

    pub async fn delete(&self, id: ContentId) -> Result<RemoveOutcome, ClientError> {
        self.ensure_mutable()?;
        let mut query = self.model.lock().await.query.clone();
        let issued = query.clone();

        let outcome = self.mutations.remove(&mut query, id).await?;
        if outcome == RemoveOutcome::Removed {
            let mut model = self.model.lock().await;
            self.adopt_query(&mut model, &issued, query);
            if model.editor.target == Some(id) {
                model.editor = EditorState::default();
            }
            if model.selected.as_ref().is_some_and(|item| item.id == id) {
                model.selected = None;
            }
        }
        Ok(outcome)
    }

    pub async fn upload_image(
        &self,
        id: ContentId,
        upload: ImageUpload,
    ) -> Result<ContentItem, ClientError> {
        self.ensure_mutable()?;
        let query = self.model.lock().await.query.clone();
        self.mutations.upload_image(&query, id, upload).await
    }

    /// Selects an item from the current page for the detail pane.
    pub async fn select(&self, id: ContentId) -> Result<ContentItem, ClientError> {
        let item = self.item_on_page(id).await?;
        self.model.lock().await.selected = Some(item.clone());
        Ok(item)
    }

    /// Fetches a single item by id, whether or not it is on the current page.
    pub async fn open_detail(&self, id: ContentId) -> Result<ContentItem, ClientError> {
        let item = match self.transport.get_item(id).await {
            Ok(wire) => normalize(wire),
            Err(err) => {
                warn!(id = id.0, "view: detail fetch failed: {err:#}");
                let err = ClientError::transport(&err);
                self.orchestrator.record_error(&err).await;
                return Err(err);
            }
        };
        self.model.lock().await.selected = Some(item.clone());
        Ok(item)
    }

    pub async fn clear_selection(&self) {
        self.model.lock().await.selected = None;
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        let status = self.orchestrator.status().await;
        let model = self.model.lock().await;
        ViewSnapshot {
            profile: self.profile,
            query: model.query.clone(),
            pager: Pager::new(status.page.page_index, status.page.total_pages),
            page: status.page,
            loading: status.loading,
            last_error: status.last_error,
            editor: model.editor.clone(),
            selected: model.selected.clone(),
        }
    }

    fn ensure_mutable(&self) -> Result<(), ClientError> {
        if self.profile.allows_mutations() {
            Ok(())
        } else {
            Err(ValidationError::MutationsNotAllowed(self.profile.kind()).into())
        }
    }

    async fn item_on_page(&self, id: ContentId) -> Result<ContentItem, ClientError> {
        self.orchestrator
            .current_page()
            .await
            .find(id)
            .cloned()
            .ok_or_else(|| ValidationError::NotOnCurrentPage(id).into())
    }

    /// Takes over the page index a mutation settled on, unless the query was
    /// edited while the mutation was running.
    fn adopt_query(&self, model: &mut ViewModel, issued: &QueryState, settled: QueryState) {
        if model.query == *issued {
            model.query = settled;
        } else {
            debug!(profile = %self.profile, "view: query changed during mutation, keeping it");
        }
    }
}

/// Home screen feed: every event, unpaged, news only.
pub async fn load_home_feed(
    transport: &dyn ContentTransport,
) -> Result<Vec<ContentItem>, ClientError> {
    let events = transport.list_all().await.map_err(|err| {
        warn!("view: home feed failed: {err:#}");
        ClientError::transport(&err)
    })?;
    Ok(events
        .into_iter()
        .map(normalize)
        .filter(|item| item.kind() == ContentKind::News)
        .collect())
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
