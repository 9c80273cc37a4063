//! Listing, search and editing state for the newsroom client.
//!
//! Every listing screen owns a [`ListingView`], which pairs a [`QueryState`]
//! with a [`FetchOrchestrator`] and a [`MutationCoordinator`] over a shared
//! [`ContentTransport`].

pub mod config;
pub mod debounce;
pub mod error;
pub mod mapper;
pub mod model;
pub mod mutation;
pub mod orchestrator;
pub mod page;
pub mod query;
pub mod transport;
pub mod view;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::{ClientError, TransportError, ValidationError};
pub use model::{ClearableField, ContentDetails, ContentForm, ContentItem};
pub use mutation::{AutoConfirm, ConfirmationProvider, MutationCoordinator, RemoveOutcome};
pub use orchestrator::{FetchOrchestrator, FetchOutcome, FetchStatus, ListingEvent};
pub use page::PageResult;
pub use query::{QueryChange, QueryState};
pub use transport::{ContentTransport, HttpTransport, ImageUpload};
pub use view::{load_home_feed, EditorState, ListingProfile, ListingView, Pager, ViewSnapshot};
