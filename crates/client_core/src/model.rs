use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::domain::{ContentId, ContentKind};

/// Normalized news item or announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: ContentId,
    pub subject: String,
    pub content: String,
    pub details: ContentDetails,
}

/// Kind-specific fields. Fields that belong to the other kind cannot be
/// represented, so they never reach a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDetails {
    News {
        news_url: Option<String>,
    },
    Announcement {
        valid_until: Option<NaiveDate>,
        image_path: Option<String>,
    },
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self.details {
            ContentDetails::News { .. } => ContentKind::News,
            ContentDetails::Announcement { .. } => ContentKind::Announcement,
        }
    }

    pub fn news_url(&self) -> Option<&str> {
        match &self.details {
            ContentDetails::News { news_url } => news_url.as_deref(),
            ContentDetails::Announcement { .. } => None,
        }
    }

    pub fn valid_until(&self) -> Option<NaiveDate> {
        match &self.details {
            ContentDetails::Announcement { valid_until, .. } => *valid_until,
            ContentDetails::News { .. } => None,
        }
    }

    pub fn image_path(&self) -> Option<&str> {
        match &self.details {
            ContentDetails::Announcement { image_path, .. } => image_path.as_deref(),
            ContentDetails::News { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClearableField {
    NewsUrl,
    ValidUntil,
    ImagePath,
}

/// Raw create/edit form as typed by the user.
///
/// Optional fields are plain text: blank means "leave out". Removing a stored
/// value on update needs an explicit [`ContentForm::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentForm {
    pub subject: String,
    pub content: String,
    pub news_url: String,
    pub valid_until: String,
    pub image_path: String,
    cleared: BTreeSet<ClearableField>,
}

impl ContentForm {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_news_url(mut self, news_url: impl Into<String>) -> Self {
        self.news_url = news_url.into();
        self
    }

    pub fn with_valid_until(mut self, valid_until: impl Into<String>) -> Self {
        self.valid_until = valid_until.into();
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = image_path.into();
        self
    }

    /// Prefills the form for editing an existing item.
    pub fn from_item(item: &ContentItem) -> Self {
        let mut form = Self::new(item.subject.clone(), item.content.clone());
        match &item.details {
            ContentDetails::News { news_url } => {
                form.news_url = news_url.clone().unwrap_or_default();
            }
            ContentDetails::Announcement {
                valid_until,
                image_path,
            } => {
                form.valid_until = valid_until
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                form.image_path = image_path.clone().unwrap_or_default();
            }
        }
        form
    }

    /// Marks a stored optional field for removal and blanks its text.
    pub fn clear(&mut self, field: ClearableField) {
        match field {
            ClearableField::NewsUrl => self.news_url.clear(),
            ClearableField::ValidUntil => self.valid_until.clear(),
            ClearableField::ImagePath => self.image_path.clear(),
        }
        self.cleared.insert(field);
    }

    pub fn is_cleared(&self, field: ClearableField) -> bool {
        self.cleared.contains(&field)
    }
}
