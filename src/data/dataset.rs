// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Turns sentence pairs into token-id sequences and stores them in
// two parallel Vecs indexed identically:
//
//   source_ids[i]  ↔  target_ids[i]
//
// Length policy: a pair is DROPPED (never truncated) if either
// side's id sequence, <bos>/<eos> included, is longer than
// `max_seq_len`. A cut-off sentence would teach the model wrong
// translations, and it would also overflow the positional table.
//
// Implements Burn's Dataset trait so the DataLoader can index it.

use anyhow::Result;
use burn::data::dataset::Dataset;

use crate::domain::{sentence_pair::SentencePair, traits::Vocabulary};

/// One tokenised example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationItem {
    pub source_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
}

pub struct TranslationDataset {
    source_ids: Vec<Vec<u32>>,
    target_ids: Vec<Vec<u32>>,
    dropped:    usize,
}

impl TranslationDataset {
    pub fn from_pairs(
        pairs:       &[SentencePair],
        src_vocab:   &impl Vocabulary,
        tgt_vocab:   &impl Vocabulary,
        max_seq_len: usize,
    ) -> Result<Self> {
        let mut source_ids = Vec::with_capacity(pairs.len());
        let mut target_ids = Vec::with_capacity(pairs.len());
        let mut dropped    = 0usize;

        for pair in pairs {
            let (_, src) = src_vocab.preprocess(&pair.source)?;
            let (_, tgt) = tgt_vocab.preprocess(&pair.target)?;

            if src.len() > max_seq_len || tgt.len() > max_seq_len {
                dropped += 1;
                continue;
            }
            source_ids.push(src);
            target_ids.push(tgt);
        }

        if dropped > 0 {
            tracing::info!(
                "Dropped {} of {} pairs longer than {} tokens",
                dropped,
                pairs.len(),
                max_seq_len
            );
        }

        Ok(Self { source_ids, target_ids, dropped })
    }

    /// Rebuild a dataset from already-tokenised items (e.g. after a split)
    pub fn from_items(items: Vec<TranslationItem>) -> Self {
        let (source_ids, target_ids) = items
            .into_iter()
            .map(|it| (it.source_ids, it.target_ids))
            .unzip();
        Self { source_ids, target_ids, dropped: 0 }
    }

    /// Number of pairs rejected by the length filter
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_items(self) -> Vec<TranslationItem> {
        self.source_ids
            .into_iter()
            .zip(self.target_ids)
            .map(|(source_ids, target_ids)| TranslationItem { source_ids, target_ids })
            .collect()
    }
}

impl Dataset<TranslationItem> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationItem> {
        Some(TranslationItem {
            source_ids: self.source_ids.get(index)?.clone(),
            target_ids: self.target_ids.get(index)?.clone(),
        })
    }

    fn len(&self) -> usize {
        self.source_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{BOS_IDX, EOS_IDX};

    /// Every whitespace word maps to id 10
    struct WordCounter;

    impl Vocabulary for WordCounter {
        fn tokenize(&self, text: &str) -> Result<Vec<String>> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }
        fn tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
            tokens
                .iter()
                .map(|t| match t.as_str() {
                    "<bos>" => BOS_IDX,
                    "<eos>" => EOS_IDX,
                    _ => 10,
                })
                .collect()
        }
        fn vocab_size(&self) -> usize {
            11
        }
    }

    fn words(n: usize) -> String {
        vec!["w"; n].join(" ")
    }

    #[test]
    fn test_overlong_source_is_excluded() {
        let pairs = vec![
            SentencePair::new(words(3), words(4)),
            // 9 words + <bos> + <eos> = 11 ids > 10
            SentencePair::new(words(9), words(2)),
            SentencePair::new(words(8), words(8)),
        ];
        let ds = TranslationDataset::from_pairs(&pairs, &WordCounter, &WordCounter, 10).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped(), 1);
        assert_eq!(ds.get(1).unwrap().source_ids.len(), 10);
    }

    #[test]
    fn test_overlong_target_is_excluded() {
        let pairs = vec![SentencePair::new(words(1), words(20))];
        let ds = TranslationDataset::from_pairs(&pairs, &WordCounter, &WordCounter, 10).unwrap();
        assert_eq!(ds.len(), 0);
    }

    #[test]
    fn test_sides_stay_aligned() {
        let pairs = vec![
            SentencePair::new(words(1), words(2)),
            SentencePair::new(words(3), words(4)),
        ];
        let ds = TranslationDataset::from_pairs(&pairs, &WordCounter, &WordCounter, 10).unwrap();
        let item = ds.get(1).unwrap();
        assert_eq!(item.source_ids, vec![BOS_IDX, 10, 10, 10, EOS_IDX]);
        assert_eq!(item.target_ids.len(), 6);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_items_round_trip_through_split() {
        let items = vec![
            TranslationItem { source_ids: vec![2, 5, 3], target_ids: vec![2, 3] },
            TranslationItem { source_ids: vec![2, 3],    target_ids: vec![2, 6, 6, 3] },
        ];
        let ds = TranslationDataset::from_items(items.clone());
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.into_items(), items);
    }
}
