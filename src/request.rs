//! Immutable request snapshots.
//!
//! A [`MutationRequest`] is built once per explicit "mutate" action and is
//! also the cache key: two requests with the same text and the same options
//! are the same fingerprint.

use serde::Serialize;

use crate::error::ValidationError;
use crate::options::MutationOptions;

/// Longest text the mutation service accepts, in characters.
pub const MAX_INPUT_LENGTH: usize = 5000;

/// Body of `POST /mutate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MutationRequest {
    text: String,
    #[serde(rename = "config")]
    options: MutationOptions,
}

impl MutationRequest {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }
}

/// Snapshot `text` and `options` into a request.
///
/// The options are copied, so later edits to the live options never reach a
/// request that has already been built.
///
/// # Errors
/// - [`ValidationError::EmptyText`] when `text` is empty or whitespace-only.
/// - [`ValidationError::TextTooLong`] when `text` exceeds
///   [`MAX_INPUT_LENGTH`] characters.
pub fn build(text: &str, options: &MutationOptions) -> Result<MutationRequest, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let length = text.chars().count();
    if length > MAX_INPUT_LENGTH {
        return Err(ValidationError::TextTooLong { length, limit: MAX_INPUT_LENGTH });
    }
    Ok(MutationRequest {
        text: text.to_string(),
        options: options.clone(),
    })
}
