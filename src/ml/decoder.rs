// ============================================================
// Layer 5 — Decoder Block and Decoder Stack
// ============================================================
// One block:
//
//   x ─► masked self-attention (causal OR target pad) ─► drop ─► (+x) ─► LayerNorm
//     ─► cross-attention (q = x, kv = encoder output,
//                         mask = source pad)           ─► drop ─► (+x) ─► LayerNorm
//     ─► feed-forward                                  ─► drop ─► (+x) ─► LayerNorm
//
// The causal mask means output position i only depends on decoder
// inputs 0..=i (plus the full encoder output), which is what lets
// the whole target be trained in one pass with teacher forcing.
//
// The stack finishes with a projection to target-vocabulary logits.

use burn::{
    nn::{
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig, Linear,
        LinearConfig,
    },
    prelude::*,
};

use crate::ml::{
    attention::{MultiHeadAttention, MultiHeadAttentionConfig},
    feed_forward::{FeedForward, FeedForwardConfig},
    mask::{causal_mask, combine, padding_mask},
    mode::Mode,
    positional::{PositionalEncoding, PositionalEncodingConfig},
};

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub vocab_size:  usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub d_k:         usize,
    pub d_v:         usize,
    pub d_ff:        usize,
    pub num_layers:  usize,
    pub max_seq_len: usize,
    pub pad_id:      u32,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        let blocks = (0..self.num_layers)
            .map(|_| self.build_block(device))
            .collect();
        Decoder {
            embedding:  EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            positional: PositionalEncodingConfig::new(self.d_model, self.max_seq_len).init(device),
            blocks,
            output:     LinearConfig::new(self.d_model, self.vocab_size).init(device),
            pad_id:     self.pad_id,
        }
    }

    fn build_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads, self.d_k, self.d_v);
        DecoderBlock {
            self_attn:  attn.init(device),
            cross_attn: attn.init(device),
            ffn:        FeedForwardConfig::new(self.d_model, self.d_ff)
                .with_dropout(self.dropout)
                .init(device),
            norm1:      LayerNormConfig::new(self.d_model).init(device),
            norm2:      LayerNormConfig::new(self.d_model).init(device),
            norm3:      LayerNormConfig::new(self.d_model).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:  MultiHeadAttention<B>,
    pub cross_attn: MultiHeadAttention<B>,
    pub ffn:        FeedForward<B>,
    pub norm1:      LayerNorm<B>,
    pub norm2:      LayerNorm<B>,
    pub norm3:      LayerNorm<B>,
    pub dropout:    Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(
        &self,
        x:          Tensor<B, 3>,
        memory:     Tensor<B, 3>,
        self_mask:  Tensor<B, 3, Bool>,
        cross_mask: Tensor<B, 3, Bool>,
        mode:       Mode,
    ) -> Tensor<B, 3> {
        let attn = self.self_attn.forward(x.clone(), x.clone(), Some(self_mask)).context;
        let x    = self.norm1.forward(x + mode.dropout(&self.dropout, attn));

        let cross = self.cross_attn.forward(x.clone(), memory, Some(cross_mask)).context;
        let x     = self.norm2.forward(x + mode.dropout(&self.dropout, cross));

        let ffn = self.ffn.forward(x.clone(), mode);
        self.norm3.forward(x + mode.dropout(&self.dropout, ffn))
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub positional: PositionalEncoding<B>,
    pub blocks:     Vec<DecoderBlock<B>>,
    pub output:     Linear<B>,
    pub pad_id:     u32,
}

impl<B: Backend> Decoder<B> {
    /// tgt: [batch, tgt_len], memory: [batch, src_len, d_model],
    /// src: [batch, src_len] (only read for its pad positions)
    /// → logits [batch, tgt_len, tgt_vocab]
    pub fn forward(
        &self,
        tgt:    Tensor<B, 2, Int>,
        memory: Tensor<B, 3>,
        src:    Tensor<B, 2, Int>,
        mode:   Mode,
    ) -> Tensor<B, 3> {
        let [batch, tgt_len] = tgt.dims();

        let self_mask = combine(
            padding_mask(tgt.clone(), self.pad_id, tgt_len),
            causal_mask(batch, tgt_len, &tgt.device()),
        );
        let cross_mask = padding_mask(src, self.pad_id, tgt_len);

        let mut x = self.positional.forward(self.embedding.forward(tgt));
        for block in &self.blocks {
            x = block.forward(x, memory.clone(), self_mask.clone(), cross_mask.clone(), mode);
        }
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::PAD_IDX;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn ids(values: &[i32], device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, device).reshape([1, values.len()])
    }

    #[test]
    fn test_output_is_causal() {
        let device = Default::default();
        let dec = DecoderConfig::new(30, 16, 2, 8, 8, 32, 2, 16, PAD_IDX).init::<TestBackend>(&device);

        let memory = Tensor::<TestBackend, 3>::random([1, 5, 16], Distribution::Default, &device);
        let src    = ids(&[2, 9, 8, 7, 3], &device);

        let a: Vec<f32> = dec
            .forward(ids(&[2, 10, 11, 12, 13], &device), memory.clone(), src.clone(), Mode::Eval)
            .into_data().to_vec().unwrap();
        // change positions 3 and 4 only
        let b: Vec<f32> = dec
            .forward(ids(&[2, 10, 11, 20, 21], &device), memory, src, Mode::Eval)
            .into_data().to_vec().unwrap();

        // positions 0..3 unaffected, position 3 affected
        let row = 30;
        for (x, y) in a[..3 * row].iter().zip(&b[..3 * row]) {
            assert!((x - y).abs() < 1e-4);
        }
        let changed = a[3 * row..4 * row]
            .iter()
            .zip(&b[3 * row..4 * row])
            .any(|(x, y)| (x - y).abs() > 1e-6);
        assert!(changed);
    }

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let dec = DecoderConfig::new(12, 8, 2, 4, 4, 16, 1, 16, PAD_IDX).init::<TestBackend>(&device);
        let memory = Tensor::<TestBackend, 3>::random([1, 6, 8], Distribution::Default, &device);
        let logits = dec.forward(ids(&[2, 4, 5], &device), memory, ids(&[2, 4, 4, 4, 3, 1], &device), Mode::Eval);
        assert_eq!(logits.dims(), [1, 3, 12]);
    }

    #[test]
    fn test_source_padding_is_masked_in_cross_attention() {
        let device = Default::default();
        let dec = DecoderConfig::new(30, 16, 2, 8, 8, 32, 2, 16, PAD_IDX).init::<TestBackend>(&device);

        let memory = Tensor::<TestBackend, 3>::random([1, 5, 16], Distribution::Default, &device);
        // whatever the encoder put at pad positions must not leak through
        let extra  = Tensor::<TestBackend, 3>::random([1, 3, 16], Distribution::Default, &device);
        let padded_memory = Tensor::cat(vec![memory.clone(), extra], 1);

        let tgt = ids(&[2, 10, 11, 12], &device);
        let a: Vec<f32> = dec
            .forward(tgt.clone(), memory, ids(&[2, 9, 8, 7, 3], &device), Mode::Eval)
            .into_data().to_vec().unwrap();
        let b: Vec<f32> = dec
            .forward(tgt, padded_memory, ids(&[2, 9, 8, 7, 3, 1, 1, 1], &device), Mode::Eval)
            .into_data().to_vec().unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-4);
        }
    }
}
