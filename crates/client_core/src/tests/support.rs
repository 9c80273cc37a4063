//! In-memory transport and confirmation doubles shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Mutex as StdMutex,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use shared::{
    domain::{ContentId, ContentKind, SortKey},
    protocol::{Patch, SearchParams, WireEvent, WirePage, WritePayload},
};
use tokio::sync::{oneshot, Mutex};

use crate::{
    mapper::resolve_kind,
    mutation::ConfirmationProvider,
    transport::{ContentTransport, ImageUpload},
};

type GateResult = std::result::Result<WirePage, String>;

/// Small events backend. Searches either answer from the stored events or,
/// once [`ScriptedTransport::gate_searches`] is on, park until the test
/// releases them in whatever order it wants.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    events: Mutex<Vec<WireEvent>>,
    next_id: AtomicI64,
    searches: Mutex<Vec<SearchParams>>,
    gated: AtomicBool,
    pending: Mutex<Vec<Option<oneshot::Sender<GateResult>>>>,
    search_failure: Mutex<Option<String>>,
    mutation_failure: Mutex<Option<String>>,
    payloads: Mutex<Vec<WritePayload>>,
    deleted: Mutex<Vec<ContentId>>,
}

pub(crate) fn wire_item(id: i64, kind: ContentKind, subject: &str) -> WireEvent {
    WireEvent {
        id: Some(ContentId(id)),
        subject: Some(subject.to_string()),
        content: Some(format!("{subject} body")),
        type_tag: Some(kind.as_wire().to_string()),
        ..WireEvent::default()
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_items(kind: ContentKind, count: i64) -> Self {
        let events = (1..=count)
            .map(|id| wire_item(id, kind, &format!("{} {id}", kind.as_wire().to_lowercase())))
            .collect();
        Self {
            events: Mutex::new(events),
            next_id: AtomicI64::new(count),
            ..Self::default()
        }
    }

    pub(crate) async fn push(&self, event: WireEvent) {
        if let Some(id) = event.id {
            self.next_id.fetch_max(id.0, Ordering::SeqCst);
        }
        self.events.lock().await.push(event);
    }

    pub(crate) fn gate_searches(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn fail_next_search(&self, message: &str) {
        *self.search_failure.lock().await = Some(message.to_string());
    }

    pub(crate) async fn fail_mutations(&self, message: &str) {
        *self.mutation_failure.lock().await = Some(message.to_string());
    }

    pub(crate) async fn searches(&self) -> Vec<SearchParams> {
        self.searches.lock().await.clone()
    }

    pub(crate) async fn payloads(&self) -> Vec<WritePayload> {
        self.payloads.lock().await.clone()
    }

    pub(crate) async fn deleted(&self) -> Vec<ContentId> {
        self.deleted.lock().await.clone()
    }

    /// Yields until at least `count` searches reached the transport.
    pub(crate) async fn wait_for_searches(&self, count: usize) {
        for _ in 0..10_000 {
            if self.searches.lock().await.len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} searches to reach the transport");
    }

    /// Resolves the gated search with the given zero-based arrival index.
    pub(crate) async fn release(&self, index: usize, result: GateResult) {
        for _ in 0..10_000 {
            let sender = self
                .pending
                .lock()
                .await
                .get_mut(index)
                .and_then(Option::take);
            if let Some(sender) = sender {
                let _ = sender.send(result);
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no gated search at index {index}");
    }

    async fn page_for(&self, params: &SearchParams) -> WirePage {
        let events = self.events.lock().await;
        let needle = params.q.as_deref().map(str::to_lowercase);
        let mut matching: Vec<WireEvent> = events
            .iter()
            .filter(|e| params.kind.map_or(true, |kind| resolve_kind(e) == kind))
            .filter(|e| {
                needle.as_deref().map_or(true, |needle| {
                    let subject = e.subject.as_deref().unwrap_or_default().to_lowercase();
                    let content = e.content.as_deref().unwrap_or_default().to_lowercase();
                    subject.contains(needle) || content.contains(needle)
                })
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| match params.sort {
            SortKey::IdAsc => a.id.cmp(&b.id),
            SortKey::IdDesc => b.id.cmp(&a.id),
            SortKey::SubjectAsc => a.subject.cmp(&b.subject),
            SortKey::SubjectDesc => b.subject.cmp(&a.subject),
        });

        let total = matching.len() as u64;
        let size = params.size.max(1) as usize;
        let content = matching
            .into_iter()
            .skip(params.page as usize * size)
            .take(size)
            .collect();

        WirePage {
            content,
            total_elements: Some(total),
            total_pages: None,
            number: Some(params.page),
            size: Some(params.size),
        }
    }

    async fn check_mutation(&self) -> Result<()> {
        if let Some(message) = self.mutation_failure.lock().await.clone() {
            bail!(message);
        }
        Ok(())
    }
}

fn apply_payload(event: &mut WireEvent, payload: &WritePayload) {
    event.subject = Some(payload.subject.clone());
    event.content = Some(payload.content.clone());
    event.type_tag = Some(payload.event_class.as_wire().to_string());
    for (slot, patch) in [
        (&mut event.news_url, &payload.news_url),
        (&mut event.valid_until, &payload.valid_until),
        (&mut event.image_path, &payload.image_path),
    ] {
        match patch {
            Patch::Omit => {}
            Patch::Clear => *slot = None,
            Patch::Set(value) => *slot = Some(value.clone()),
        }
    }
}

#[async_trait]
impl ContentTransport for ScriptedTransport {
    async fn search(&self, params: &SearchParams) -> Result<WirePage> {
        self.searches.lock().await.push(params.clone());

        if self.gated.load(Ordering::SeqCst) {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().await.push(Some(tx));
            return match rx.await {
                Ok(Ok(page)) => Ok(page),
                Ok(Err(message)) => Err(anyhow!(message)),
                Err(_) => Err(anyhow!("gated search was never released")),
            };
        }

        if let Some(message) = self.search_failure.lock().await.take() {
            bail!(message);
        }
        Ok(self.page_for(params).await)
    }

    async fn list_all(&self) -> Result<Vec<WireEvent>> {
        Ok(self.events.lock().await.clone())
    }

    async fn get_item(&self, id: ContentId) -> Result<WireEvent> {
        self.events
            .lock()
            .await
            .iter()
            .find(|e| e.id == Some(id))
            .cloned()
            .ok_or_else(|| anyhow!("event {id} not found"))
    }

    async fn create_item(&self, payload: &WritePayload) -> Result<WireEvent> {
        self.check_mutation().await?;
        self.payloads.lock().await.push(payload.clone());

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut event = WireEvent {
            id: Some(ContentId(id)),
            ..WireEvent::default()
        };
        apply_payload(&mut event, payload);
        self.events.lock().await.push(event.clone());
        Ok(event)
    }

    async fn update_item(&self, id: ContentId, payload: &WritePayload) -> Result<WireEvent> {
        self.check_mutation().await?;
        self.payloads.lock().await.push(payload.clone());

        let mut events = self.events.lock().await;
        let event = events
            .iter_mut()
            .find(|e| e.id == Some(id))
            .ok_or_else(|| anyhow!("event {id} not found"))?;
        apply_payload(event, payload);
        Ok(event.clone())
    }

    async fn delete_item(&self, id: ContentId) -> Result<()> {
        self.check_mutation().await?;
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|e| e.id != Some(id));
        if events.len() == before {
            bail!("event {id} not found");
        }
        self.deleted.lock().await.push(id);
        Ok(())
    }

    async fn upload_image(&self, id: ContentId, upload: ImageUpload) -> Result<WireEvent> {
        self.check_mutation().await?;
        let mut events = self.events.lock().await;
        let event = events
            .iter_mut()
            .find(|e| e.id == Some(id))
            .ok_or_else(|| anyhow!("event {id} not found"))?;
        event.image_path = Some(format!("/uploads/{}", upload.filename));
        Ok(event.clone())
    }
}

pub(crate) struct RecordingConfirm {
    answer: bool,
    asked: StdMutex<Vec<String>>,
}

impl RecordingConfirm {
    pub(crate) fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: StdMutex::new(Vec::new()),
        }
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("confirm log").clone()
    }
}

impl ConfirmationProvider for RecordingConfirm {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().expect("confirm log").push(message.to_string());
        self.answer
    }
}
