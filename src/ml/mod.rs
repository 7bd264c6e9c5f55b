// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here. Building blocks, leaves first:
//
//   mode.rs          — Train / Eval switch passed to every forward
//   mask.rs          — padding mask, causal mask, OR-combination
//   positional.rs    — fixed sinusoidal position table
//   attention.rs     — multi-head attention with separate d_k / d_v
//   feed_forward.rs  — position-wise two-layer MLP
//   encoder.rs       — encoder block + stack
//   decoder.rs       — decoder block + stack + vocabulary projection
//   model.rs         — encode / decode / forward / teacher-forced loss
//   evaluator.rs     — loss and token accuracy without gradients
//   trainer.rs       — epoch loop, SGD, validation, snapshots
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod mode;
pub mod mask;
pub mod positional;
pub mod attention;
pub mod feed_forward;
pub mod encoder;
pub mod decoder;

/// Encoder-decoder composition and loss
pub mod model;

/// Validation loss / token accuracy
pub mod evaluator;

/// Full training loop with validation and checkpointing
pub mod trainer;
