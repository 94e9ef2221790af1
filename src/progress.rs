//! Found/done bookkeeping for the displayed mutation result.
//!
//! `done` is never stored: it is `found == total` for the response currently
//! displayed. [`ProgressTracker::mark_done`] just jumps `found` to `total`.

use crate::cache::QueryState;
use crate::error::ProgressError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    found: usize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(&self) -> usize {
        self.found
    }

    pub fn reset(&mut self) {
        self.found = 0;
    }

    /// `true` once every site of a successful response has been found.
    pub fn is_done(&self, state: &QueryState) -> bool {
        state.response().is_some_and(|r| self.found == r.total())
    }

    /// Count one more site as found. A no-op once done.
    ///
    /// # Errors
    /// [`ProgressError::NoResponse`] unless `state` is a success.
    pub fn mark_found(&mut self, state: &QueryState) -> Result<usize, ProgressError> {
        let total = state.response().ok_or(ProgressError::NoResponse)?.total();
        if self.found < total {
            self.found += 1;
        }
        Ok(self.found)
    }

    /// Mark every site as found.
    ///
    /// # Errors
    /// [`ProgressError::PrematureCompletion`] while the response is missing,
    /// pending or failed; `found` is left unchanged.
    pub fn mark_done(&mut self, state: &QueryState) -> Result<(), ProgressError> {
        let total = state.response().ok_or(ProgressError::PrematureCompletion)?.total();
        self.found = total;
        Ok(())
    }

    pub fn status(&self, state: &QueryState) -> Status {
        status(state, self.found)
    }
}

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

/// The status line shown under the mutated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Nothing submitted yet.
    Prompt,
    Loading,
    Failed(String),
    /// The service introduced no mutations.
    TooShort,
    Complete,
    Progress { found: usize, total: usize },
}

/// Colouring class of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Complete,
    Incomplete,
}

/// Derive the status line from the displayed entry and the found count.
pub fn status(state: &QueryState, found: usize) -> Status {
    match state {
        QueryState::Idle => Status::Prompt,
        QueryState::Pending => Status::Loading,
        QueryState::Failed(e) => Status::Failed(e.to_string()),
        QueryState::Success(r) if r.total() == 0 => Status::TooShort,
        QueryState::Success(r) if found >= r.total() => Status::Complete,
        QueryState::Success(r) => Status::Progress { found, total: r.total() },
    }
}

impl Status {
    pub fn class(&self) -> StatusClass {
        match self {
            Status::Complete => StatusClass::Complete,
            _ => StatusClass::Incomplete,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Prompt => write!(f, "Enter some text and click 'mutate' to get started!"),
            Status::Loading => write!(f, "Mutating..."),
            Status::Failed(e) => write!(f, "Error! {e}"),
            Status::TooShort => {
                write!(f, "Your text was too short to introduce any mutations, sorry.")
            }
            Status::Complete => write!(f, "All mutations found!"),
            Status::Progress { found, total } => write!(f, "{found}/{total} mutations found."),
        }
    }
}
