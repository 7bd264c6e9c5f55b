// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches disk on behalf of the other layers:
//
//   checkpoint.rs   — Whole-model snapshot at a fixed path,
//                     explicit load-or-create with LoadOutcome,
//                     configurable retention, TrainConfig JSON.
//
//   vocab_store.rs  — Word-level vocabularies per language,
//                     stored as HuggingFace tokenizer JSON and
//                     exposed through the Vocabulary trait.
//
//   metrics.rs      — Per-epoch CSV of losses and accuracy.

/// Model snapshot saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
