//! Client for a text mutation service used for proofreading practice.
//!
//! The user's text is sent to a remote service that introduces small errors
//! (swapped letters, removed punctuation, homophone swaps). The user then
//! hunts for them, marking each one found, until the session is done.
//!
//! Data flows one way: live edits → [`session::SessionController::on_submit`]
//! builds a [`request::MutationRequest`] → [`cache::MutationQueryCache`]
//! resolves it → [`progress::ProgressTracker`] tracks what has been found.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod progress;
pub mod request;
pub mod service;
pub mod session;
pub mod ui;

pub use cache::{CacheConfig, MutationQueryCache, QueryHandle, QueryState};
pub use config::ClientConfig;
pub use error::{FetchError, MutatorError, ProgressError, ValidationError};
pub use models::{MutationItem, MutationResponse, MutationType};
pub use options::{FieldEdit, MutationOptions, OptionField};
pub use progress::{ProgressTracker, Status};
pub use request::MutationRequest;
pub use service::{HealthMonitor, HttpMutatorClient, MutatorApi, ServerStatus};
pub use session::SessionController;
