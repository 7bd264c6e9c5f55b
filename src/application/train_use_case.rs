// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load sentence pairs         (Layer 4 - data)
//   Step 2: Build / load vocabularies   (Layer 6 - infra)
//   Step 3: Tokenise + length filter    (Layer 4 - data)
//   Step 4: Train / validation split    (Layer 4 - data)
//   Step 5: Save config                 (Layer 6 - infra)
//   Step 6: Run training loop           (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::TranslationDataset,
    loader::ParallelCorpusLoader,
    splitter::split_train_val,
};
use crate::domain::traits::{PairSource, Vocabulary};
use crate::infra::{
    checkpoint::{CheckpointManager, RetentionPolicy},
    vocab_store::VocabStore,
};
use crate::ml::{model::TranslationTransformerConfig, trainer::run_training};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a run. Saved as train_config.json so
// `evaluate` can rebuild the same vocabularies and architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:     String,
    pub split:          String,
    pub src_lang:       String,
    pub tgt_lang:       String,
    pub checkpoint_dir: String,
    pub min_freq:       usize,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub momentum:       f64,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub d_k:            usize,
    pub d_v:            usize,
    pub d_ff:           usize,
    pub encoder_layers: usize,
    pub decoder_layers: usize,
    pub dropout:        f64,
    pub val_fraction:   f64,
    pub seed:           u64,
    pub num_workers:    usize,
    pub retention:      RetentionPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:     "data/multi30k".to_string(),
            split:          "train".to_string(),
            src_lang:       "de".to_string(),
            tgt_lang:       "en".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            min_freq:       1,
            max_seq_len:    5000,
            batch_size:     200,
            epochs:         300,
            lr:             0.1,
            momentum:       0.99,
            d_model:        512,
            num_heads:      8,
            d_k:            64,
            d_v:            64,
            d_ff:           2048,
            encoder_layers: 6,
            decoder_layers: 6,
            dropout:        0.1,
            val_fraction:   0.0,
            seed:           42,
            num_workers:    1,
            retention:      RetentionPolicy::Latest,
        }
    }
}

impl TrainConfig {
    /// Architecture for the given vocabulary sizes.
    /// The positional table covers exactly `max_seq_len` positions,
    /// the same bound the dataset filter enforces.
    pub fn model_config(&self, src_vocab: usize, tgt_vocab: usize, pad_id: u32) -> TranslationTransformerConfig {
        TranslationTransformerConfig::new(src_vocab, tgt_vocab)
            .with_d_model(self.d_model)
            .with_num_heads(self.num_heads)
            .with_d_k(self.d_k)
            .with_d_v(self.d_v)
            .with_d_ff(self.d_ff)
            .with_encoder_layers(self.encoder_layers)
            .with_decoder_layers(self.decoder_layers)
            .with_dropout(self.dropout)
            .with_max_seq_len(self.max_seq_len)
            .with_pad_id(pad_id)
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load sentence pairs ───────────────────────────────────────
        tracing::info!("Loading '{}' split from '{}'", cfg.split, cfg.corpus_dir);
        let loader = ParallelCorpusLoader::new(&cfg.corpus_dir, &cfg.split, &cfg.src_lang, &cfg.tgt_lang);
        let pairs  = loader.load_all()?;
        if pairs.is_empty() {
            bail!("No sentence pairs found in '{}'", cfg.corpus_dir);
        }

        // ── Step 2: Build / load vocabularies ─────────────────────────────────
        let store = VocabStore::new(&cfg.checkpoint_dir);
        let src_texts: Vec<&str> = pairs.iter().map(|p| p.source.as_str()).collect();
        let tgt_texts: Vec<&str> = pairs.iter().map(|p| p.target.as_str()).collect();
        let src_vocab = store.load_or_build(&cfg.src_lang, &src_texts, cfg.min_freq)?;
        let tgt_vocab = store.load_or_build(&cfg.tgt_lang, &tgt_texts, cfg.min_freq)?;
        tracing::info!(
            "Vocabulary sizes: {}={} {}={}",
            cfg.src_lang, src_vocab.vocab_size(),
            cfg.tgt_lang, tgt_vocab.vocab_size(),
        );

        // ── Step 3: Tokenise and drop over-long pairs ─────────────────────────
        let dataset = TranslationDataset::from_pairs(&pairs, &src_vocab, &tgt_vocab, cfg.max_seq_len)?;
        let items   = dataset.into_items();
        if items.is_empty() {
            bail!("Every pair exceeds max_seq_len={}", cfg.max_seq_len);
        }

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_items, val_items) = split_train_val(items, 1.0 - cfg.val_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train_items.len(), val_items.len());
        if train_items.is_empty() {
            bail!("val_fraction={} leaves no training pairs", cfg.val_fraction);
        }

        let train_dataset = TranslationDataset::from_items(train_items);
        let val_dataset   = (!val_items.is_empty()).then(|| TranslationDataset::from_items(val_items));

        // ── Step 5: Save config ───────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir, cfg.retention);
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let model_cfg = cfg.model_config(src_vocab.vocab_size(), tgt_vocab.vocab_size(), src_vocab.pad_id());
        run_training(cfg, &model_cfg, train_dataset, val_dataset, &ckpt_manager)?;

        Ok(())
    }
}
