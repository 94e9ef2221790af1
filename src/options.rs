//! # Stage: Options Model
//!
//! ## Responsibility
//! Turn raw form-control edits (checkbox states, number-field strings) into a
//! well-typed [`MutationOptions`] value.
//!
//! ## Guarantees
//! - `mutation_rate` is always inside `[0.0, 1.0]`; it is clamped on every
//!   write path, including deserialization
//! - Rejected edits leave the prior options untouched
//! - Pure: applying an edit returns a new value and performs no I/O
//!
//! ## NOT Responsible For
//! - Deciding when a request is sent (that is the session controller)

use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ValidationError;

/// Mutation rate used when the user has not changed it.
pub const DEFAULT_MUTATION_RATE: f64 = 0.05;

/// Clamp a rate into `[0.0, 1.0]`.
///
/// `NaN` maps to `0.0` and `-0.0` is normalized to `0.0` so that equal rates
/// always share one bit pattern (the cache keys on it).
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 0.0;
    }
    let clamped = rate.clamp(0.0, 1.0);
    if clamped == 0.0 {
        0.0
    } else {
        clamped
    }
}

fn deserialize_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_rate)
}

// ---------------------------------------------------------------------------
// MutationOptions
// ---------------------------------------------------------------------------

/// Configuration sent alongside the text in every mutation request.
///
/// Serializes to the service's `config` object (camelCase keys, `seed` as
/// `null` when absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOptions {
    pub allow_swaps: bool,
    pub allow_punctuation_removal: bool,
    pub allow_homophones: bool,
    pub seed: Option<u64>,
    #[serde(deserialize_with = "deserialize_rate")]
    mutation_rate: f64,
}

impl Default for MutationOptions {
    fn default() -> Self {
        MutationOptions {
            allow_swaps: true,
            allow_punctuation_removal: true,
            allow_homophones: true,
            seed: None,
            mutation_rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl PartialEq for MutationOptions {
    fn eq(&self, other: &Self) -> bool {
        self.allow_swaps == other.allow_swaps
            && self.allow_punctuation_removal == other.allow_punctuation_removal
            && self.allow_homophones == other.allow_homophones
            && self.seed == other.seed
            && self.mutation_rate.to_bits() == other.mutation_rate.to_bits()
    }
}

// Rates are clamped and never NaN, so bitwise equality is value equality.
impl Eq for MutationOptions {}

impl Hash for MutationOptions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.allow_swaps.hash(state);
        self.allow_punctuation_removal.hash(state);
        self.allow_homophones.hash(state);
        self.seed.hash(state);
        self.mutation_rate.to_bits().hash(state);
    }
}

impl MutationOptions {
    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    /// Return a copy with the rate replaced (clamped).
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = clamp_rate(rate);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Apply one raw form edit and return the updated options.
    ///
    /// # Errors
    /// - [`ValidationError::NotANumber`] when a numeric field gets text that
    ///   does not parse (including `NaN`).
    /// - [`ValidationError::WrongKind`] when a checkbox state is sent to a
    ///   numeric field, or text that is not `true`/`false` to a toggle.
    ///
    /// In both cases `self` is left as it was.
    pub fn apply_edit(&self, field: OptionField, edit: FieldEdit) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        match field {
            OptionField::AllowHomophones => next.allow_homophones = edit.as_checked(field)?,
            OptionField::AllowSwaps => next.allow_swaps = edit.as_checked(field)?,
            OptionField::AllowPunctuationRemoval => {
                next.allow_punctuation_removal = edit.as_checked(field)?
            }
            OptionField::MutationRate => {
                let raw = edit.as_text(field)?.trim();
                next.mutation_rate = if raw.is_empty() {
                    0.0
                } else {
                    let rate: f64 = raw.parse().map_err(|_| not_a_number(field, raw))?;
                    if rate.is_nan() {
                        return Err(not_a_number(field, raw));
                    }
                    clamp_rate(rate)
                };
            }
            OptionField::Seed => {
                let raw = edit.as_text(field)?.trim();
                next.seed = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse().map_err(|_| not_a_number(field, raw))?)
                };
            }
        }
        Ok(next)
    }
}

fn not_a_number(field: OptionField, raw: &str) -> ValidationError {
    ValidationError::NotANumber {
        field: field.to_string(),
        value: raw.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// The five editable option keys, named as the form controls name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    AllowHomophones,
    AllowPunctuationRemoval,
    AllowSwaps,
    MutationRate,
    Seed,
}

impl std::fmt::Display for OptionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OptionField::AllowHomophones         => "allowHomophones",
            OptionField::AllowPunctuationRemoval => "allowPunctuationRemoval",
            OptionField::AllowSwaps              => "allowSwaps",
            OptionField::MutationRate            => "mutationRate",
            OptionField::Seed                    => "seed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OptionField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowHomophones" => Ok(OptionField::AllowHomophones),
            "allowPunctuationRemoval" => Ok(OptionField::AllowPunctuationRemoval),
            "allowSwaps" => Ok(OptionField::AllowSwaps),
            "mutationRate" => Ok(OptionField::MutationRate),
            "seed" => Ok(OptionField::Seed),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// A raw value coming out of a form control.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Checkbox state.
    Checked(bool),
    /// Contents of a text or number input.
    Text(String),
}

impl FieldEdit {
    fn as_checked(&self, field: OptionField) -> Result<bool, ValidationError> {
        match self {
            FieldEdit::Checked(b) => Ok(*b),
            FieldEdit::Text(t) => t.trim().parse().map_err(|_| ValidationError::WrongKind {
                field: field.to_string(),
                expected: "boolean",
            }),
        }
    }

    fn as_text(&self, field: OptionField) -> Result<&str, ValidationError> {
        match self {
            FieldEdit::Text(t) => Ok(t),
            FieldEdit::Checked(_) => Err(ValidationError::WrongKind {
                field: field.to_string(),
                expected: "numeric",
            }),
        }
    }
}

impl From<bool> for FieldEdit {
    fn from(b: bool) -> Self {
        FieldEdit::Checked(b)
    }
}

impl From<&str> for FieldEdit {
    fn from(s: &str) -> Self {
        FieldEdit::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
