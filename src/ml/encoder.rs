// ============================================================
// Layer 5 — Encoder Block and Encoder Stack
// ============================================================
// One block (post-norm, as in Vaswani et al.):
//
//   x ─► self-attention(x, x, pad mask) ─► dropout ─► (+x) ─► LayerNorm
//     ─► feed-forward                   ─► dropout ─► (+x) ─► LayerNorm
//
// The stack embeds source ids, adds positional encoding, then
// applies N identical-shape blocks in order. Only padding is
// masked, so every real source token sees the whole sentence.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig},
    prelude::*,
};

use crate::ml::{
    attention::{MultiHeadAttention, MultiHeadAttentionConfig},
    feed_forward::{FeedForward, FeedForwardConfig},
    mask::padding_mask,
    mode::Mode,
    positional::{PositionalEncoding, PositionalEncodingConfig},
};

#[derive(Config, Debug)]
pub struct EncoderConfig {
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

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let blocks = (0..self.num_layers)
            .map(|_| self.build_block(device))
            .collect();
        Encoder {
            embedding:  EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            positional: PositionalEncodingConfig::new(self.d_model, self.max_seq_len).init(device),
            blocks,
            pad_id:     self.pad_id,
        }
    }

    fn build_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn: MultiHeadAttentionConfig::new(self.d_model, self.num_heads, self.d_k, self.d_v)
                .init(device),
            ffn:       FeedForwardConfig::new(self.d_model, self.d_ff)
                .with_dropout(self.dropout)
                .init(device),
            norm1:     LayerNormConfig::new(self.d_model).init(device),
            norm2:     LayerNormConfig::new(self.d_model).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn: MultiHeadAttention<B>,
    pub ffn:       FeedForward<B>,
    pub norm1:     LayerNorm<B>,
    pub norm2:     LayerNorm<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 3, Bool>, mode: Mode) -> Tensor<B, 3> {
        let attn = self.self_attn.forward(x.clone(), x.clone(), Some(mask)).context;
        let x    = self.norm1.forward(x + mode.dropout(&self.dropout, attn));

        let ffn = self.ffn.forward(x.clone(), mode);
        self.norm2.forward(x + mode.dropout(&self.dropout, ffn))
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub positional: PositionalEncoding<B>,
    pub blocks:     Vec<EncoderBlock<B>>,
    pub pad_id:     u32,
}

impl<B: Backend> Encoder<B> {
    /// src: [batch, src_len] → [batch, src_len, d_model]
    pub fn forward(&self, src: Tensor<B, 2, Int>, mode: Mode) -> Tensor<B, 3> {
        let [_, src_len] = src.dims();
        let mask = padding_mask(src.clone(), self.pad_id, src_len);

        let mut x = self.positional.forward(self.embedding.forward(src));
        for block in &self.blocks {
            x = block.forward(x, mask.clone(), mode);
        }
        x
    }
}
