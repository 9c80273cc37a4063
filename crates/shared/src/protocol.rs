use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{ContentKind, ContentId, SortKey};

/// Event as the backend returns it.
///
/// The backend serializes a polymorphic hierarchy, so the kind tag shows up
/// as `type` on most read paths, `eventType` on some, and `eventClass` when a
/// write payload is echoed back. All three are kept raw and resolved by the
/// client's mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Spring-style page envelope. Only `content` is reliably present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePage {
    #[serde(default)]
    pub content: Vec<WireEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// Query string of `GET /events/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    pub page: u32,
    pub size: u32,
    pub sort: SortKey,
}

/// Three-state optional field of a write payload.
///
/// `Omit` leaves the field out of the JSON entirely, `Clear` sends an
/// explicit `null`, `Set` sends the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Omit,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Patch::Omit)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => value.serialize(serializer),
            Patch::Omit | Patch::Clear => serializer.serialize_none(),
        }
    }
}

/// Body of `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritePayload {
    pub event_class: ContentKind,
    pub subject: String,
    pub content: String,
    #[serde(skip_serializing_if = "Patch::is_omitted")]
    pub news_url: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_omitted")]
    pub valid_until: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_omitted")]
    pub image_path: Patch<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn write_payload_omits_and_clears() {
        let payload = WritePayload {
            event_class: ContentKind::Announcement,
            subject: "Maintenance".into(),
            content: "Service window".into(),
            news_url: Patch::Omit,
            valid_until: Patch::Set("2025-01-10".into()),
            image_path: Patch::Clear,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "eventClass": "ANNOUNCEMENT",
                "subject": "Maintenance",
                "content": "Service window",
                "validUntil": "2025-01-10",
                "imagePath": null,
            })
        );
    }

    #[test]
    fn page_tolerates_missing_metadata() {
        let page: WirePage = serde_json::from_value(json!({
            "content": [{ "id": 4, "subject": "s", "content": "c", "type": "NEWS" }]
        }))
        .unwrap();

        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id, Some(ContentId(4)));
        assert_eq!(page.content[0].type_tag.as_deref(), Some("NEWS"));
        assert!(page.total_elements.is_none());
        assert!(page.total_pages.is_none());
    }

    #[test]
    fn search_params_skip_empty_filters() {
        let params = SearchParams {
            kind: Some(ContentKind::News),
            q: None,
            page: 2,
            size: 10,
            sort: SortKey::SubjectAsc,
        };

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({ "type": "NEWS", "page": 2, "size": 10, "sort": "subject,asc" })
        );
    }
}
