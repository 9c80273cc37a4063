use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ContentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    News,
    Announcement,
}

impl ContentKind {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::News => "NEWS",
            Self::Announcement => "ANNOUNCEMENT",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Accepts the wire tags case-insensitively; the backend is not consistent
/// about casing across its read and write paths.
impl FromStr for ContentKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEWS" => Ok(Self::News),
            "ANNOUNCEMENT" => Ok(Self::Announcement),
            _ => Err(UnknownVariant::new("content kind", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    IdAsc,
    #[default]
    IdDesc,
    SubjectAsc,
    SubjectDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::IdDesc,
        SortKey::IdAsc,
        SortKey::SubjectAsc,
        SortKey::SubjectDesc,
    ];

    /// `field,direction` pair understood by the search endpoint.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::IdAsc => "id,asc",
            Self::IdDesc => "id,desc",
            Self::SubjectAsc => "subject,asc",
            Self::SubjectDesc => "subject,desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for SortKey {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace(' ', "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_wire() == normalized)
            .ok_or_else(|| UnknownVariant::new("sort key", s))
    }
}

impl Serialize for SortKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
