//! Translation between backend wire events and [`ContentItem`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared::{
    domain::{ContentId, ContentKind},
    protocol::{Patch, WireEvent, WritePayload},
};
use tracing::warn;

use crate::{
    error::ValidationError,
    model::{ClearableField, ContentDetails, ContentForm, ContentItem},
};

const ISO_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Never fails: absent or malformed fields become absent values.
pub fn normalize(wire: WireEvent) -> ContentItem {
    let kind = resolve_kind(&wire);

    let id = wire.id.unwrap_or_else(|| {
        warn!("mapper: wire event without id, defaulting to 0");
        ContentId::default()
    });
    let subject = wire.subject.unwrap_or_else(|| {
        warn!(id = id.0, "mapper: wire event without subject");
        String::new()
    });

    let details = match kind {
        ContentKind::News => ContentDetails::News {
            news_url: non_blank(wire.news_url),
        },
        ContentKind::Announcement => ContentDetails::Announcement {
            valid_until: non_blank(wire.valid_until).and_then(|raw| {
                let parsed = parse_date(&raw);
                if parsed.is_none() {
                    warn!(id = id.0, valid_until = %raw, "mapper: dropping unparseable validUntil");
                }
                parsed
            }),
            image_path: non_blank(wire.image_path),
        },
    };

    ContentItem {
        id,
        subject,
        content: wire.content.unwrap_or_else(|| {
            warn!(id = id.0, "mapper: wire event without content");
            String::new()
        }),
        details,
    }
}

/// `type` wins over `eventType`, which wins over `eventClass`. Untagged
/// events are classified by the fields only announcements carry.
pub fn resolve_kind(wire: &WireEvent) -> ContentKind {
    let tagged = [&wire.type_tag, &wire.event_type, &wire.event_class]
        .into_iter()
        .flatten()
        .find_map(|tag| tag.parse::<ContentKind>().ok());

    match tagged {
        Some(kind) => kind,
        None if wire.valid_until.is_some() || wire.image_path.is_some() => {
            ContentKind::Announcement
        }
        None => ContentKind::News,
    }
}

/// Builds the create/update body for `kind`. Fields of the other kind are
/// never included, whatever the form holds.
pub fn denormalize(
    form: &ContentForm,
    kind: ContentKind,
    mode: WriteMode,
) -> Result<WritePayload, ValidationError> {
    let subject = form.subject.trim();
    if subject.is_empty() {
        return Err(ValidationError::EmptySubject);
    }
    let content = form.content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let mut payload = WritePayload {
        event_class: kind,
        subject: subject.to_string(),
        content: content.to_string(),
        news_url: Patch::Omit,
        valid_until: Patch::Omit,
        image_path: Patch::Omit,
    };

    match kind {
        ContentKind::News => {
            payload.news_url = optional_patch(form, ClearableField::NewsUrl, &form.news_url, mode);
        }
        ContentKind::Announcement => {
            payload.valid_until =
                match optional_patch(form, ClearableField::ValidUntil, &form.valid_until, mode) {
                    Patch::Set(raw) => Patch::Set(to_iso_date(&raw)?),
                    other => other,
                };
            payload.image_path =
                optional_patch(form, ClearableField::ImagePath, &form.image_path, mode);
        }
    }

    Ok(payload)
}

fn optional_patch(
    form: &ContentForm,
    field: ClearableField,
    text: &str,
    mode: WriteMode,
) -> Patch<String> {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        Patch::Set(trimmed.to_string())
    } else if mode == WriteMode::Update && form.is_cleared(field) {
        Patch::Clear
    } else {
        Patch::Omit
    }
}

/// Bare `yyyy-MM-dd` passes through untouched; other recognizable date or
/// timestamp forms are reduced to their UTC calendar date.
pub fn to_iso_date(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if is_bare_iso_date(trimmed) {
        return Ok(trimmed.to_string());
    }
    parse_date(trimmed)
        .map(|date| date.format(ISO_DATE).to_string())
        .ok_or_else(|| ValidationError::InvalidDate(trimmed.to_string()))
}

fn is_bare_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, ISO_DATE) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y/%m/%d").ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/mapper_tests.rs"]
mod tests;
