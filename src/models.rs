//! Wire types returned by the mutation service.

use serde::{Deserialize, Serialize};

/// Kind of alteration the service introduced at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationType {
    SwapLetters,
    RemovePunctuation,
    ReplaceHomophone,
}

impl std::fmt::Display for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationType::SwapLetters       => write!(f, "swapped letters"),
            MutationType::RemovePunctuation => write!(f, "removed punctuation"),
            MutationType::ReplaceHomophone  => write!(f, "replaced homophone"),
        }
    }
}

/// One mutation site: a half-open character range into `mutated_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationItem {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: MutationType,
}

impl MutationItem {
    /// `true` when `start < end <= len`.
    pub fn is_well_formed(&self, len: usize) -> bool {
        self.start < self.end && self.end <= len
    }

    /// Character range to highlight in a text of `len` characters.
    ///
    /// Point sites (`start == end`, as the service sends for swaps and
    /// removed punctuation) and inverted ranges widen to the one character at
    /// `start`; an `end` past the text is cut back. `None` when `start` lies
    /// outside the text.
    pub fn display_range(&self, len: usize) -> Option<(usize, usize)> {
        if self.start >= len {
            return None;
        }
        Some((self.start, self.end.max(self.start + 1).min(len)))
    }
}

/// Result of one `POST /mutate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(alias = "mutatedText")]
    pub mutated_text: String,
    /// Ordered by position of occurrence.
    pub mutations: Vec<MutationItem>,
}

/// A slice of the mutated text, either untouched or covering one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Mutated(&'a str, MutationType),
}

impl MutationResponse {
    pub fn total(&self) -> usize {
        self.mutations.len()
    }

    /// Indices of sites whose span breaks `start < end <= len(mutated_text)`,
    /// lengths counted in characters.
    ///
    /// Such sites still count toward [`total`](Self::total); the reveal
    /// clamps them through [`MutationItem::display_range`].
    pub fn malformed_sites(&self) -> Vec<usize> {
        let len = self.mutated_text.chars().count();
        self.mutations
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_well_formed(len))
            .map(|(i, _)| i)
            .collect()
    }

    /// Split the mutated text into plain and mutated segments, in order.
    ///
    /// Sites overlapping an earlier site, or starting past the end of the
    /// text, are skipped.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        // Byte offset of every char boundary, plus the end of the string.
        let bounds: Vec<usize> = self
            .mutated_text
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(self.mutated_text.len()))
            .collect();
        let byte_at = |c: usize| bounds.get(c).copied().unwrap_or(self.mutated_text.len());

        let len = bounds.len() - 1;

        let mut out = Vec::with_capacity(self.mutations.len() * 2 + 1);
        let mut cursor = 0usize;
        for m in &self.mutations {
            let Some((start, end)) = m.display_range(len) else {
                continue;
            };
            if start < cursor {
                continue;
            }
            if start > cursor {
                out.push(Segment::Plain(&self.mutated_text[byte_at(cursor)..byte_at(start)]));
            }
            out.push(Segment::Mutated(&self.mutated_text[byte_at(start)..byte_at(end)], m.kind));
            cursor = end;
        }
        if byte_at(cursor) < self.mutated_text.len() {
            out.push(Segment::Plain(&self.mutated_text[byte_at(cursor)..]));
        }
        out
    }
}
