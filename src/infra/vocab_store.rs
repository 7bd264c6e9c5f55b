// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds, saves and reloads one word-level vocabulary per
// language. Each vocabulary is written as a HuggingFace
// tokenizer JSON (WordLevel model + Whitespace pre-tokenizer)
// and loaded back through `tokenizers::Tokenizer`, so the ids
// used during training are exactly the ids used afterwards.
//
// Id layout:
//   0..=3   <unk> <pad> <bos> <eos>
//   4..     corpus words, most frequent first
//           (ties broken alphabetically so rebuilds are stable)
//
// Files:
//   checkpoints/
//     vocab_de.json
//     vocab_en.json

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace,
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::domain::traits::{Vocabulary, SPECIAL_TOKENS, UNK_IDX, UNK_TOKEN};

// ─── TokenizerVocab ───────────────────────────────────────────────────────────
/// A loaded vocabulary for one language.
pub struct TokenizerVocab {
    tokenizer: Tokenizer,
}

impl TokenizerVocab {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }
}

impl Vocabulary for TokenizerVocab {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_tokens().to_vec())
    }

    fn tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.tokenizer.token_to_id(t).unwrap_or(UNK_IDX))
            .collect()
    }

    fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}

// ─── VocabStore ───────────────────────────────────────────────────────────────
pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn path_for(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("vocab_{lang}.json"))
    }

    /// Load the saved vocabulary for `lang`, or build it from `texts`
    pub fn load_or_build(
        &self,
        lang:     &str,
        texts:    &[&str],
        min_freq: usize,
    ) -> Result<TokenizerVocab> {
        if self.path_for(lang).exists() {
            tracing::info!("Loading existing '{}' vocabulary from disk", lang);
            self.load(lang)
        } else {
            tracing::info!("Building '{}' vocabulary (min_freq={})", lang, min_freq);
            self.build_and_save(lang, texts, min_freq)
        }
    }

    pub fn load(&self, lang: &str) -> Result<TokenizerVocab> {
        let path = self.path_for(lang);
        let tokenizer = Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load vocabulary from '{}': {}", path.display(), e)
        })?;
        Ok(TokenizerVocab::new(tokenizer))
    }

    fn build_and_save(
        &self,
        lang:     &str,
        texts:    &[&str],
        min_freq: usize,
    ) -> Result<TokenizerVocab> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count words ───────────────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in pre_tokenize(text)? {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(w, n)| *n >= min_freq && !SPECIAL_TOKENS.contains(&w.as_str()))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // ── Step 2: Assign ids ────────────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, tok) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(tok.to_string(), serde_json::json!(id));
        }
        for (offset, (word, _)) in words.iter().enumerate() {
            vocab.insert(word.clone(), serde_json::json!(SPECIAL_TOKENS.len() + offset));
        }
        let size = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, tok)| serde_json::json!({
                "id": id, "content": tok, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path_for(lang);
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary '{}'", path.display()))?;

        tracing::info!(
            "'{}' vocabulary built with {} entries, saved to '{}'",
            lang,
            size,
            path.display()
        );

        self.load(lang)
    }
}

/// Words as the saved tokenizer's `Whitespace` pre-tokenizer sees them,
/// so counted words and encoded words always agree.
fn pre_tokenize(text: &str) -> Result<Vec<String>> {
    let mut pretokenized = PreTokenizedString::from(text);
    Whitespace::default()
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;
    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}
