//! # Stage: Session Controller
//!
//! ## Responsibility
//! Hold the live text and options, turn an explicit submit into a request,
//! and keep the displayed result and progress tied to that request.
//!
//! ## Guarantees
//! - Editing text or options never changes what is displayed; only
//!   [`SessionController::on_submit`] replaces the active request
//! - Every accepted submit resets `found` to 0 before its response arrives
//! - A rejected submit (empty or over-long text) changes nothing and issues
//!   no network call
//! - The active request is pinned in the cache so it cannot be evicted
//!   while displayed
//!
//! ## NOT Responsible For
//! - Rendering (the terminal front end in `ui` does that)
//! - Network I/O (delegated to [`MutationQueryCache`])

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{MutationQueryCache, QueryHandle, QueryState};
use crate::error::{ProgressError, ValidationError};
use crate::models::MutationResponse;
use crate::options::{FieldEdit, MutationOptions, OptionField};
use crate::progress::{ProgressTracker, Status};
use crate::request::{self, MutationRequest};
use crate::service::MutatorApi;

pub struct SessionController<A> {
    id: Uuid,
    current_text: String,
    live_options: MutationOptions,
    active: Option<QueryHandle>,
    progress: ProgressTracker,
    cache: MutationQueryCache<A>,
}

impl<A: MutatorApi> SessionController<A> {
    /// Start an empty session with default options on top of `cache`.
    pub fn new(cache: MutationQueryCache<A>) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "session started");
        Self {
            id,
            current_text: String::new(),
            live_options: MutationOptions::default(),
            active: None,
            progress: ProgressTracker::new(),
            cache,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cache(&self) -> &MutationQueryCache<A> {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Input events
    // -----------------------------------------------------------------------

    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.current_text = text.into();
    }

    pub fn on_options_changed(&mut self, options: MutationOptions) {
        self.live_options = options;
    }

    /// Apply one raw form edit to the live options.
    ///
    /// # Errors
    /// The edit's [`ValidationError`]; the live options keep their prior value.
    pub fn on_option_edit(&mut self, field: OptionField, edit: FieldEdit) -> Result<(), ValidationError> {
        self.live_options = self.live_options.apply_edit(field, edit)?;
        Ok(())
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn live_options(&self) -> &MutationOptions {
        &self.live_options
    }

    /// Whether the mutate action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.current_text.trim().is_empty()
    }

    /// Snapshot the live text and options and make them the active request.
    ///
    /// Returns a handle on the request's cache entry; identical requests are
    /// served from the cache without a new network call.
    ///
    /// # Errors
    /// The [`ValidationError`] from building the request. The session is left
    /// exactly as it was.
    pub fn on_submit(&mut self) -> Result<QueryHandle, ValidationError> {
        let request = request::build(&self.current_text, &self.live_options)?;

        self.progress.reset();
        self.cache.pin(Some(request.clone()));
        let handle = self.cache.submit(&request);
        info!(
            session = %self.id,
            chars = request.text().chars().count(),
            rate = request.options().mutation_rate(),
            seed = ?request.options().seed,
            "submitted mutation request"
        );
        self.active = Some(handle.clone());
        Ok(handle)
    }

    /// Abort the active request if it is still in flight.
    pub fn cancel(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|h| self.cache.cancel(h.request()))
    }

    // -----------------------------------------------------------------------
    // Progress events
    // -----------------------------------------------------------------------

    /// # Errors
    /// [`ProgressError::NoResponse`] unless the active request succeeded.
    pub fn on_found(&mut self) -> Result<usize, ProgressError> {
        let state = self.query_state();
        self.progress.mark_found(&state)
    }

    /// # Errors
    /// [`ProgressError::PrematureCompletion`] unless the active request
    /// succeeded.
    pub fn on_done(&mut self) -> Result<(), ProgressError> {
        let state = self.query_state();
        self.progress.mark_done(&state)?;
        info!(session = %self.id, found = self.progress.found(), "session marked done");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived view
    // -----------------------------------------------------------------------

    pub fn active_request(&self) -> Option<&MutationRequest> {
        self.active.as_ref().map(QueryHandle::request)
    }

    /// State of the active request's entry, `Idle` before the first submit.
    pub fn query_state(&self) -> QueryState {
        self.active
            .as_ref()
            .map(QueryHandle::state)
            .unwrap_or(QueryState::Idle)
    }

    pub fn displayed_response(&self) -> Option<Arc<MutationResponse>> {
        self.query_state().response().cloned()
    }

    pub fn found(&self) -> usize {
        self.progress.found()
    }

    pub fn is_done(&self) -> bool {
        self.progress.is_done(&self.query_state())
    }

    pub fn status(&self) -> Status {
        self.progress.status(&self.query_state())
    }

    /// Wait for the active request to settle. `Idle` when nothing is active.
    pub async fn settle(&mut self) -> QueryState {
        match self.active.as_mut() {
            Some(handle) => handle.settled().await,
            None => QueryState::Idle,
        }
    }
}
