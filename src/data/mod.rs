// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From parallel text files to padded tensor batches:
//
//   train.de / train.en
//       │
//       ▼
//   ParallelCorpusLoader  → line-aligned SentencePairs
//       │
//       ▼
//   Preprocessor          → whitespace / control-char cleanup
//       │
//       ▼
//   Vocabulary (infra)    → <bos> ids <eos> per side
//       │
//       ▼
//   TranslationDataset    → length filter, Burn Dataset
//       │
//       ▼
//   split_train_val       → seeded train / validation split
//       │
//       ▼
//   TranslationBatcher    → per-batch right padding
//       │
//       ▼
//   DataLoader            → feeds batches to the training loop

/// Reads line-aligned parallel corpus files
pub mod loader;

/// Normalises raw sentence text
pub mod preprocessor;

/// Tokenised, length-filtered dataset (Burn Dataset)
pub mod dataset;

/// Per-batch padding into Int tensors (Burn Batcher)
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
