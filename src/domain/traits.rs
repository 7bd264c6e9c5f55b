// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training pipeline only ever sees these traits, never the
// concrete file formats behind them:
//   - ParallelCorpusLoader implements PairSource
//   - TokenizerVocab       implements Vocabulary
//
// Swapping Multi30k text files for a TSV dump, or the word-level
// vocabulary for a subword one, only needs a new implementation.

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── Special tokens ───────────────────────────────────────────────────────────
// Fixed ids shared by every vocabulary. Specials always occupy the
// first four slots so the padding index is the same on both sides.
pub const UNK_TOKEN: &str = "<unk>";
pub const PAD_TOKEN: &str = "<pad>";
pub const BOS_TOKEN: &str = "<bos>";
pub const EOS_TOKEN: &str = "<eos>";

pub const UNK_IDX: u32 = 0;
pub const PAD_IDX: u32 = 1;
pub const BOS_IDX: u32 = 2;
pub const EOS_IDX: u32 = 3;

/// Specials in id order
pub const SPECIAL_TOKENS: [&str; 4] = [UNK_TOKEN, PAD_TOKEN, BOS_TOKEN, EOS_TOKEN];

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Anything that can produce an ordered list of translation pairs.
pub trait PairSource {
    fn load_all(&self) -> Result<Vec<SentencePair>>;
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Maps text to token ids for one language.
pub trait Vocabulary {
    /// Split raw text into surface tokens (no specials added)
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Look up each token; unknown tokens map to `UNK_IDX`
    fn tokens_to_ids(&self, tokens: &[String]) -> Vec<u32>;

    /// Number of ids, specials included
    fn vocab_size(&self) -> usize;

    fn pad_id(&self) -> u32 {
        PAD_IDX
    }

    /// Tokenise and wrap with `<bos>` / `<eos>`.
    /// Returns the tokens alongside their ids.
    fn preprocess(&self, text: &str) -> Result<(Vec<String>, Vec<u32>)> {
        let mut tokens = Vec::new();
        tokens.push(BOS_TOKEN.to_string());
        tokens.extend(self.tokenize(text)?);
        tokens.push(EOS_TOKEN.to_string());
        let ids = self.tokens_to_ids(&tokens);
        Ok((tokens, ids))
    }
}
