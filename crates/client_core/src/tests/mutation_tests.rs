use super::*;
use std::time::Duration;

use chrono::NaiveDate;
use shared::{domain::SortKey, protocol::Patch};

use crate::{
    error::ValidationError,
    orchestrator::FetchOutcome,
    test_support::{RecordingConfirm, ScriptedTransport},
};

struct Harness {
    transport: Arc<ScriptedTransport>,
    orchestrator: Arc<FetchOrchestrator>,
    confirm: Arc<RecordingConfirm>,
    coordinator: MutationCoordinator,
}

fn harness(kind: ContentKind, items: i64, confirm_answer: bool) -> Harness {
    let transport = Arc::new(ScriptedTransport::with_items(kind, items));
    let orchestrator = FetchOrchestrator::new(
        Arc::clone(&transport) as Arc<dyn ContentTransport>,
        Some(kind),
        10,
        Duration::from_millis(300),
    );
    let confirm = Arc::new(RecordingConfirm::answering(confirm_answer));
    let coordinator = MutationCoordinator::new(
        Arc::clone(&transport) as Arc<dyn ContentTransport>,
        Arc::clone(&orchestrator),
        Arc::clone(&confirm) as Arc<dyn ConfirmationProvider>,
    );
    Harness {
        transport,
        orchestrator,
        confirm,
        coordinator,
    }
}

async fn load_page(h: &Harness, page_index: u32) -> QueryState {
    let mut query = QueryState::default();
    query.set_page_index(page_index);
    let outcome = h.orchestrator.search_now(query.clone()).await;
    assert!(matches!(outcome, FetchOutcome::Applied(_)));
    query
}

#[tokio::test]
async fn deleting_sole_item_on_later_page_steps_back_one_page() {
    // 21 items at 10 per page: page index 2 holds exactly one item.
    let h = harness(ContentKind::News, 21, true);
    let mut query = load_page(&h, 2).await;
    assert_eq!(h.orchestrator.current_page().await.items.len(), 1);

    let outcome = h
        .coordinator
        .remove(&mut query, ContentId(1))
        .await
        .expect("remove");

    assert_eq!(outcome, RemoveOutcome::Removed);
    assert_eq!(query.page_index(), 1);
    let searches = h.transport.searches().await;
    assert_eq!(searches.last().map(|s| s.page), Some(1));
    assert_eq!(h.orchestrator.current_page().await.items.len(), 10);
}

#[tokio::test]
async fn deleting_on_first_page_never_goes_negative() {
    let h = harness(ContentKind::News, 1, true);
    let mut query = load_page(&h, 0).await;

    h.coordinator
        .remove(&mut query, ContentId(1))
        .await
        .expect("remove");

    assert_eq!(query.page_index(), 0);
    assert_eq!(h.transport.searches().await.last().map(|s| s.page), Some(0));
    assert!(h.orchestrator.current_page().await.is_empty());
}

#[tokio::test]
async fn deleting_from_a_full_page_keeps_the_page() {
    let h = harness(ContentKind::News, 25, true);
    let mut query = load_page(&h, 1).await;

    h.coordinator
        .remove(&mut query, ContentId(12))
        .await
        .expect("remove");

    assert_eq!(query.page_index(), 1);
    assert_eq!(h.transport.deleted().await, vec![ContentId(12)]);
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let h = harness(ContentKind::Announcement, 3, false);
    let mut query = load_page(&h, 0).await;
    let searches_before = h.transport.searches().await.len();

    let outcome = h
        .coordinator
        .remove(&mut query, ContentId(2))
        .await
        .expect("remove");

    assert_eq!(outcome, RemoveOutcome::Cancelled);
    assert!(h.transport.deleted().await.is_empty());
    assert_eq!(h.transport.searches().await.len(), searches_before);
    assert_eq!(
        h.confirm.asked(),
        vec!["Are you sure you want to delete this announcement?".to_string()]
    );
}

#[tokio::test]
async fn failed_delete_keeps_page_index_and_reports_error() {
    let h = harness(ContentKind::News, 21, true);
    let mut query = load_page(&h, 2).await;
    let searches_before = h.transport.searches().await.len();
    h.transport.fail_mutations("500 Internal Server Error").await;

    let err = h
        .coordinator
        .remove(&mut query, ContentId(1))
        .await
        .expect_err("delete fails");

    assert_eq!(err, ClientError::Transport("500 Internal Server Error".into()));
    assert_eq!(query.page_index(), 2);
    assert_eq!(h.transport.searches().await.len(), searches_before);
    assert_eq!(h.orchestrator.current_page().await.items.len(), 1);
    assert_eq!(
        h.orchestrator.status().await.last_error.as_deref(),
        Some("500 Internal Server Error")
    );
}

#[tokio::test]
async fn create_resets_to_first_page_and_refetches() {
    let h = harness(ContentKind::Announcement, 15, true);
    let mut query = load_page(&h, 1).await;

    let form = ContentForm::new("Maintenance", "Service window").with_valid_until("2025-01-10");
    let created = h
        .coordinator
        .create(&mut query, ContentKind::Announcement, &form)
        .await
        .expect("create");

    assert_eq!(created.kind(), ContentKind::Announcement);
    assert_eq!(created.valid_until(), NaiveDate::from_ymd_opt(2025, 1, 10));
    assert_eq!(query.page_index(), 0);

    let page = h.orchestrator.current_page().await;
    assert_eq!(query.sort_key(), SortKey::IdDesc);
    assert_eq!(page.items.first().map(|i| i.id), Some(created.id));
}

#[tokio::test]
async fn invalid_form_is_rejected_before_transport() {
    let h = harness(ContentKind::News, 2, true);
    let mut query = load_page(&h, 0).await;
    let searches_before = h.transport.searches().await.len();

    let err = h
        .coordinator
        .create(&mut query, ContentKind::News, &ContentForm::new(" ", "body"))
        .await
        .expect_err("blank subject");

    assert_eq!(err, ClientError::Validation(ValidationError::EmptySubject));
    assert!(h.transport.payloads().await.is_empty());
    assert_eq!(h.transport.searches().await.len(), searches_before);
}

#[tokio::test]
async fn failed_update_changes_nothing() {
    let h = harness(ContentKind::News, 12, true);
    let mut query = load_page(&h, 1).await;
    h.transport.fail_mutations("409 Conflict").await;

    let err = h
        .coordinator
        .update(
            &mut query,
            ContentId(2),
            ContentKind::News,
            &ContentForm::new("Edited", "Body"),
        )
        .await
        .expect_err("update fails");

    assert_eq!(err, ClientError::Transport("409 Conflict".into()));
    assert_eq!(query.page_index(), 1);
}

#[tokio::test]
async fn update_can_clear_optional_field() {
    let h = harness(ContentKind::News, 3, true);
    let mut query = load_page(&h, 0).await;

    let mut form = ContentForm::new("Edited", "Body").with_news_url("https://example.com");
    h.coordinator
        .update(&mut query, ContentId(3), ContentKind::News, &form)
        .await
        .expect("first update");

    form.clear(crate::model::ClearableField::NewsUrl);
    let updated = h
        .coordinator
        .update(&mut query, ContentId(3), ContentKind::News, &form)
        .await
        .expect("second update");

    assert_eq!(updated.news_url(), None);
    let payloads = h.transport.payloads().await;
    assert_eq!(payloads[1].news_url, Patch::Clear);
}

#[tokio::test]
async fn upload_attaches_image_and_keeps_page() {
    let h = harness(ContentKind::Announcement, 12, true);
    let query = load_page(&h, 1).await;

    let updated = h
        .coordinator
        .upload_image(
            &query,
            ContentId(2),
            ImageUpload {
                filename: "banner.png".into(),
                mime_type: Some("image/png".into()),
                bytes: vec![1, 2, 3],
            },
        )
        .await
        .expect("upload");

    assert_eq!(updated.image_path(), Some("/uploads/banner.png"));
    assert_eq!(h.transport.searches().await.last().map(|s| s.page), Some(1));
}
