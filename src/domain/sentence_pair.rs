// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One aligned translation example: a sentence in the source
// language and its reference translation in the target language.
//
// Example (Multi30k, de → en):
//   source: "Zwei junge Männer spielen Fußball."
//   target: "Two young men are playing soccer."

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    /// Sentence in the source language (encoder side)
    pub source: String,

    /// Reference translation in the target language (decoder side)
    pub target: String,
}

impl SentencePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// True when either side is blank — such pairs carry no signal
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty() || self.target.trim().is_empty()
    }
}
