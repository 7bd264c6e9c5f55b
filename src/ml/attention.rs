// ============================================================
// Layer 5 — Multi-Head Attention
// ============================================================
// Burn ships a MultiHeadAttention module, but it ties the per-head
// size to d_model / n_heads. Here query/key and value heads have
// their own configurable widths (d_k, d_v), so the projections
// are built by hand from Linear layers.
//
// Per head h:
//   Q_h = X_q · W_q[h]          [batch, q_len, d_k]
//   K_h = X_kv · W_k[h]         [batch, k_len, d_k]
//   V_h = X_kv · W_v[h]         [batch, k_len, d_v]
//   A_h = softmax(Q_h K_hᵀ / √d_k + bias) · V_h
// Output = concat(A_1..A_H) · W_o → [batch, q_len, d_model]
//
// Masked keys get a -1e9 bias before the softmax, so their weight
// collapses to ~0. Nothing is removed by reshaping, which keeps the
// key length (and therefore the output shape) fixed per batch.
//
// Reference: Vaswani et al. (2017) §3.2

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

/// Additive bias used for masked scores
const MASK_BIAS: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct MultiHeadAttentionConfig {
    pub d_model:   usize,
    pub num_heads: usize,
    /// Per-head query/key width
    pub d_k:       usize,
    /// Per-head value width
    pub d_v:       usize,
}

impl MultiHeadAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        let h = self.num_heads;
        MultiHeadAttention {
            query:     LinearConfig::new(self.d_model, h * self.d_k).init(device),
            key:       LinearConfig::new(self.d_model, h * self.d_k).init(device),
            value:     LinearConfig::new(self.d_model, h * self.d_v).init(device),
            output:    LinearConfig::new(h * self.d_v, self.d_model).init(device),
            num_heads: h,
            d_k:       self.d_k,
            d_v:       self.d_v,
        }
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    pub query:     Linear<B>,
    pub key:       Linear<B>,
    pub value:     Linear<B>,
    pub output:    Linear<B>,
    pub num_heads: usize,
    pub d_k:       usize,
    pub d_v:       usize,
}

pub struct AttentionOutput<B: Backend> {
    /// [batch, q_len, d_model]
    pub context: Tensor<B, 3>,
    /// Post-softmax weights, [batch, heads, q_len, k_len]
    pub weights: Tensor<B, 4>,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// `query` supplies the queries; `key_value` supplies keys and values
    /// (the same tensor for self-attention, the encoder output for
    /// cross-attention). `mask` is [batch, q_len, k_len], `true` = hidden.
    pub fn forward(
        &self,
        query:     Tensor<B, 3>,
        key_value: Tensor<B, 3>,
        mask:      Option<Tensor<B, 3, Bool>>,
    ) -> AttentionOutput<B> {
        let [batch, q_len, _] = query.dims();
        let [_, k_len, _]     = key_value.dims();
        let h = self.num_heads;

        let q = self.split_heads(self.query.forward(query), self.d_k);
        let k = self.split_heads(self.key.forward(key_value.clone()), self.d_k);
        let v = self.split_heads(self.value.forward(key_value), self.d_v);

        // [batch, h, q_len, k_len]
        let mut scores = q.matmul(k.swap_dims(2, 3)) / (self.d_k as f64).sqrt();

        if let Some(mask) = mask {
            let mask = mask.unsqueeze_dim::<4>(1).expand([batch, h, q_len, k_len]);
            scores = scores.mask_fill(mask, MASK_BIAS);
        }

        let weights = softmax(scores, 3);

        // [batch, h, q_len, d_v] → [batch, q_len, h * d_v]
        let context = weights
            .clone()
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, q_len, h * self.d_v]);

        AttentionOutput {
            context: self.output.forward(context),
            weights,
        }
    }

    /// [batch, len, h * width] → [batch, h, len, width]
    fn split_heads(&self, x: Tensor<B, 3>, width: usize) -> Tensor<B, 4> {
        let [batch, len, _] = x.dims();
        x.reshape([batch, len, self.num_heads, width]).swap_dims(1, 2)
    }
}
