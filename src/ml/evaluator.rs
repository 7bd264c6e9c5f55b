// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a model on batches without touching its parameters:
//   - mean cross-entropy per batch (pad labels ignored)
//   - token accuracy: argmax hits over non-pad label positions
//
// Always runs in Mode::Eval. During training it is handed the
// `model.valid()` copy on the inner backend, so no autodiff graph
// is built for validation.

use burn::prelude::*;

use crate::data::batcher::TranslationBatch;
use crate::ml::{mode::Mode, model::TranslationTransformer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    /// Mean of per-batch losses; NaN with no batches
    pub loss:           f64,
    pub token_accuracy: f64,
    pub batches:        usize,
    /// Non-pad label positions scored
    pub tokens:         usize,
}

pub fn evaluate<B: Backend>(
    model:   &TranslationTransformer<B>,
    batches: impl IntoIterator<Item = TranslationBatch<B>>,
) -> EvalSummary {
    let mut loss_sum  = 0.0f64;
    let mut n_batches = 0usize;
    let mut hits      = 0usize;
    let mut tokens    = 0usize;

    for batch in batches {
        let out = model.forward_loss(batch.source, batch.target, Mode::Eval);
        loss_sum  += out.loss.into_scalar().elem::<f64>();
        n_batches += 1;

        let (h, t) = token_hits(out.logits, out.targets, model.pad_id);
        hits   += h;
        tokens += t;
    }

    EvalSummary {
        loss:           if n_batches > 0 { loss_sum / n_batches as f64 } else { f64::NAN },
        token_accuracy: if tokens > 0 { hits as f64 / tokens as f64 } else { 0.0 },
        batches:        n_batches,
        tokens,
    }
}

/// (correct, counted) over label positions that are not padding.
pub fn token_hits<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    pad_id:  u32,
) -> (usize, usize) {
    let [batch, steps] = targets.dims();
    let predicted = logits.argmax(2).reshape([batch, steps]);
    let real      = targets.clone().not_equal_elem(pad_id as i64).int();

    let correct = predicted.equal(targets).int() * real.clone();
    let hits:   i64 = correct.sum().into_scalar().elem();
    let counted: i64 = real.sum().into_scalar().elem();
    (hits as usize, counted as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::TranslationBatcher, dataset::TranslationItem};
    use crate::domain::traits::PAD_IDX;
    use crate::ml::model::TranslationTransformerConfig;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_token_hits_skip_padding() {
        let device = Default::default();
        // vocab 3; argmax per position = 2, 0, 1
        let logits = Tensor::<TestBackend, 1>::from_floats(
            [0.0, 0.1, 0.9, 0.8, 0.1, 0.1, 0.2, 0.7, 0.1].as_slice(),
            &device,
        )
        .reshape([1, 3, 3]);
        // last label is padding (PAD_IDX = 1) and must not count
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([2, 2, 1].as_slice(), &device)
            .reshape([1, 3]);

        assert_eq!(token_hits(logits, targets, PAD_IDX), (1, 2));
    }

    #[test]
    fn test_evaluate_counts_batches_and_tokens() {
        let device = Default::default();
        let model = TranslationTransformerConfig::new(10, 10)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16)
            .init::<TestBackend>(&device);

        let batcher = TranslationBatcher::new(PAD_IDX);
        let batches: Vec<TranslationBatch<TestBackend>> = vec![
            batcher.batch(
                vec![
                    TranslationItem { source_ids: vec![2, 5, 3], target_ids: vec![2, 6, 7, 3] },
                    TranslationItem { source_ids: vec![2, 3],    target_ids: vec![2, 3] },
                ],
                &device,
            ),
            batcher.batch(
                vec![TranslationItem { source_ids: vec![2, 8, 3], target_ids: vec![2, 9, 3] }],
                &device,
            ),
        ];

        let summary = evaluate(&model, batches);
        assert_eq!(summary.batches, 2);
        // labels: [6 7 3] + [3 pad pad] + [9 3]
        assert_eq!(summary.tokens, 6);
        assert!(summary.loss.is_finite());
        assert!((0.0..=1.0).contains(&summary.token_accuracy));
    }

    #[test]
    fn test_no_batches_gives_nan_loss() {
        let device = Default::default();
        let model = TranslationTransformerConfig::new(10, 10)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16)
            .init::<TestBackend>(&device);
        let summary = evaluate(&model, Vec::<TranslationBatch<TestBackend>>::new());
        assert!(summary.loss.is_nan());
        assert_eq!(summary.tokens, 0);
    }
}
