//! Crate-level error types.
//!
//! Errors are split by where they are recovered:
//!
//! - [`ValidationError`] never leaves the client; the session stays in its
//!   pre-submission state.
//! - [`FetchError`] is stored inside the cache entry of the request that
//!   produced it. It is `Clone` so every handle on that entry can observe it.
//! - [`ProgressError`] signals a found/done action taken before a response
//!   was available.

use thiserror::Error;

/// Rejected user input. Recovered locally, never reaches the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("text is empty")]
    EmptyText,

    #[error("text is {length} characters long, the limit is {limit}")]
    TextTooLong { length: usize, limit: usize },

    #[error("'{value}' is not a valid number for {field}")]
    NotANumber { field: String, value: String },

    #[error("{field} expects a {expected} value")]
    WrongKind { field: String, expected: &'static str },

    #[error("unknown option field '{0}'")]
    UnknownField(String),
}

/// Failure of a remote call. Terminal for the fingerprint it is stored under.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The server could not be reached at all.
    #[error("connection to {url} failed: {detail}")]
    Network { url: String, detail: String },

    /// The server replied with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    /// The body was not a well-formed mutation response.
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no response after {0} ms")]
    Timeout(u64),

    #[error("request was cancelled")]
    Cancelled,
}

/// A progress action taken while no successful response is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("cannot complete a session before its mutations have arrived")]
    PrematureCompletion,

    #[error("there is no mutation result to mark progress against")]
    NoResponse,
}

/// Top-level error returned by the public API.
#[derive(Debug, Error)]
pub enum MutatorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for MutatorError {
    fn from(e: toml::de::Error) -> Self {
        MutatorError::Config(e.to_string())
    }
}

pub type Result<T, E = MutatorError> = std::result::Result<T, E>;
