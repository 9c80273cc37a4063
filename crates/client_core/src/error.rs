use reqwest::StatusCode;
use shared::domain::{ContentId, ContentKind};
use thiserror::Error;

/// Rejections raised before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("content must not be empty")]
    EmptyContent,
    #[error("'{0}' is not a recognizable date")]
    InvalidDate(String),
    #[error("page size {requested} is not one of {allowed:?}")]
    UnsupportedPageSize { requested: u32, allowed: Vec<u32> },
    #[error("sorting is fixed for this view")]
    SortNotSelectable,
    #[error("this view does not allow changes to {0} content")]
    MutationsNotAllowed(ContentKind),
    #[error("item {0} is not on the current page")]
    NotOnCurrentPage(ContentId),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Failure surfaced to a view. Transport failures carry only the
/// human-readable message; the raw error has already been logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Transport(String),
}

impl ClientError {
    pub fn transport(err: &anyhow::Error) -> Self {
        let message = match err.downcast_ref::<TransportError>() {
            Some(TransportError::Status { message, .. }) => message.clone(),
            None => format!("{err:#}"),
        };
        Self::Transport(message)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
