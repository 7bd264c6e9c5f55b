// ============================================================
// Layer 4 — Translation Batcher (collation)
// ============================================================
// Implements Burn's Batcher trait: a Vec of TranslationItems
// becomes two Int tensors, batch-first.
//
// Sequences inside a batch have different lengths, so each side
// is right-padded with the pad id up to the LONGEST sequence of
// that side in THIS batch:
//
//   [2 7 9 3]        [2 7 9 3 1 1]
//   [2 4 4 8 5 3] →  [2 4 4 8 5 3]
//
// Source and target are padded independently, and the padded
// length changes from batch to batch. Positional encoding and
// masks are sliced/derived per batch for that reason.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationItem;

/// Right-pad `seqs` to the longest one.
/// Returns the row-major flat buffer and its [rows, max_len] shape.
pub fn pad_sequences(seqs: &[&[u32]], pad_id: u32) -> (Vec<i32>, [usize; 2]) {
    let max_len = seqs.iter().map(|s| s.len()).max().unwrap_or(0);

    let flat = seqs
        .iter()
        .flat_map(|s| {
            s.iter()
                .map(|&id| id as i32)
                .chain(std::iter::repeat(pad_id as i32).take(max_len - s.len()))
        })
        .collect();

    (flat, [seqs.len(), max_len])
}

/// A padded batch ready for the model.
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// [batch, longest source in batch]
    pub source: Tensor<B, 2, Int>,
    /// [batch, longest target in batch]
    pub target: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct TranslationBatcher {
    pub pad_id: u32,
}

impl TranslationBatcher {
    pub fn new(pad_id: u32) -> Self {
        Self { pad_id }
    }

    fn side<B: Backend>(&self, seqs: &[&[u32]], device: &B::Device) -> Tensor<B, 2, Int> {
        let (flat, shape) = pad_sequences(seqs, self.pad_id);
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape(shape)
    }
}

impl<B: Backend> Batcher<B, TranslationItem, TranslationBatch<B>> for TranslationBatcher {
    fn batch(&self, items: Vec<TranslationItem>, device: &B::Device) -> TranslationBatch<B> {
        let sources: Vec<&[u32]> = items.iter().map(|it| it.source_ids.as_slice()).collect();
        let targets: Vec<&[u32]> = items.iter().map(|it| it.target_ids.as_slice()).collect();

        TranslationBatch {
            source: self.side::<B>(&sources, device),
            target: self.side::<B>(&targets, device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::PAD_IDX;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_rows_keep_prefix_and_pad_the_rest() {
        let seqs: Vec<&[u32]> = vec![&[2, 7, 3], &[2, 4, 4, 8, 3], &[2, 3]];
        let (flat, [rows, len]) = pad_sequences(&seqs, PAD_IDX);

        assert_eq!((rows, len), (3, 5));
        for (r, seq) in seqs.iter().enumerate() {
            let row = &flat[r * len..(r + 1) * len];
            let expected: Vec<i32> = seq.iter().map(|&x| x as i32).collect();
            assert_eq!(&row[..seq.len()], expected.as_slice());
            assert!(row[seq.len()..].iter().all(|&x| x == PAD_IDX as i32));
        }
    }

    #[test]
    fn test_batch_pads_each_side_independently() {
        let device = Default::default();
        let items = vec![
            TranslationItem { source_ids: vec![2, 5, 3],       target_ids: vec![2, 9, 9, 9, 3, 3] },
            TranslationItem { source_ids: vec![2, 5, 6, 7, 3], target_ids: vec![2, 3] },
        ];
        let batch: TranslationBatch<TestBackend> =
            TranslationBatcher::new(PAD_IDX).batch(items, &device);

        assert_eq!(batch.source.dims(), [2, 5]);
        assert_eq!(batch.target.dims(), [2, 6]);

        let src: Vec<i64> = batch.source.into_data().convert::<i64>().to_vec().unwrap();
        // length-3 row: last two entries are padding
        assert_eq!(&src[3..5], &[PAD_IDX as i64, PAD_IDX as i64]);
        assert_eq!(&src[5..], &[2, 5, 6, 7, 3]);
    }

    #[test]
    fn test_empty_input_gives_empty_shape() {
        let (flat, shape) = pad_sequences(&[], PAD_IDX);
        assert!(flat.is_empty());
        assert_eq!(shape, [0, 0]);
    }
}
