// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores the saved snapshot on a corpus split (e.g. `val`):
//
//   Step 1: Read train_config.json      (Layer 6 - infra)
//   Step 2: Reload both vocabularies    (Layer 6 - infra)
//   Step 3: Load + tokenise the split   (Layer 4 - data)
//   Step 4: Restore the snapshot        (Layer 6 - infra)
//   Step 5: Evaluate in Mode::Eval      (Layer 5 - ml)
//
// Unlike training, a missing or unusable snapshot is an error:
// there is nothing meaningful to score.

use anyhow::{bail, Result};
use burn::data::{dataloader::DataLoaderBuilder, dataset::Dataset};

use crate::data::{batcher::TranslationBatcher, dataset::TranslationDataset, loader::ParallelCorpusLoader};
use crate::domain::traits::{PairSource, Vocabulary};
use crate::infra::{
    checkpoint::{CheckpointManager, LoadOutcome, RetentionPolicy},
    vocab_store::VocabStore,
};
use crate::ml::evaluator::{evaluate, EvalSummary};

type EvalBackend = burn::backend::Wgpu;

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    split:          String,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, split: impl Into<String>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), split: split.into() }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        // ── Step 1 ────────────────────────────────────────────────────────────
        let probe = CheckpointManager::new(&self.checkpoint_dir, RetentionPolicy::Latest);
        let cfg   = probe.load_config()?;
        let ckpt  = CheckpointManager::new(&self.checkpoint_dir, cfg.retention);

        // ── Step 2 ────────────────────────────────────────────────────────────
        let store     = VocabStore::new(&self.checkpoint_dir);
        let src_vocab = store.load(&cfg.src_lang)?;
        let tgt_vocab = store.load(&cfg.tgt_lang)?;

        // ── Step 3 ────────────────────────────────────────────────────────────
        let pairs = ParallelCorpusLoader::new(&cfg.corpus_dir, &self.split, &cfg.src_lang, &cfg.tgt_lang)
            .load_all()?;
        let dataset = TranslationDataset::from_pairs(&pairs, &src_vocab, &tgt_vocab, cfg.max_seq_len)?;
        tracing::info!(
            "Scoring {} pairs ({} over max_seq_len skipped)",
            dataset.len(),
            dataset.dropped()
        );

        // ── Step 4 ────────────────────────────────────────────────────────────
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let model_cfg = cfg.model_config(src_vocab.vocab_size(), tgt_vocab.vocab_size(), src_vocab.pad_id());
        let model = match ckpt.load_model::<EvalBackend>(&model_cfg, &device) {
            LoadOutcome::Found(model)    => model,
            LoadOutcome::NotFound        => bail!("No snapshot in '{}'. Run 'train' first.", self.checkpoint_dir),
            LoadOutcome::Corrupt(reason) => bail!("Snapshot in '{}' is unusable: {}", self.checkpoint_dir, reason),
        };
        tracing::info!("Model loaded from checkpoint");

        // ── Step 5 ────────────────────────────────────────────────────────────
        let loader = DataLoaderBuilder::<EvalBackend, _, _>::new(TranslationBatcher::new(model_cfg.pad_id))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers.max(1))
            .set_device(device)
            .build(dataset);

        Ok(evaluate(&model, loader.iter()))
    }
}
