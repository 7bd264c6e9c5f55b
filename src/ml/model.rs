use burn::{
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::ml::{
    decoder::{Decoder, DecoderConfig},
    encoder::{Encoder, EncoderConfig},
    mode::Mode,
};

// Defaults mirror the base model of Vaswani et al. (2017).
// #[derive(Config)] brings Clone + serde, so they are not derived again.
#[derive(Config, Debug)]
pub struct TranslationTransformerConfig {
    pub src_vocab_size: usize,
    pub tgt_vocab_size: usize,
    #[config(default = 512)]
    pub d_model:        usize,
    #[config(default = 8)]
    pub num_heads:      usize,
    #[config(default = 64)]
    pub d_k:            usize,
    #[config(default = 64)]
    pub d_v:            usize,
    #[config(default = 2048)]
    pub d_ff:           usize,
    #[config(default = 6)]
    pub encoder_layers: usize,
    #[config(default = 6)]
    pub decoder_layers: usize,
    #[config(default = 0.1)]
    pub dropout:        f64,
    /// Length of the positional table; no batch may be longer
    #[config(default = 5000)]
    pub max_seq_len:    usize,
    #[config(default = 1)]
    pub pad_id:         u32,
}

impl TranslationTransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TranslationTransformer<B> {
        let encoder = EncoderConfig::new(
            self.src_vocab_size, self.d_model, self.num_heads, self.d_k, self.d_v,
            self.d_ff, self.encoder_layers, self.max_seq_len, self.pad_id,
        )
        .with_dropout(self.dropout)
        .init(device);

        let decoder = DecoderConfig::new(
            self.tgt_vocab_size, self.d_model, self.num_heads, self.d_k, self.d_v,
            self.d_ff, self.decoder_layers, self.max_seq_len, self.pad_id,
        )
        .with_dropout(self.dropout)
        .init(device);

        TranslationTransformer { encoder, decoder, pad_id: self.pad_id }
    }
}

#[derive(Module, Debug)]
pub struct TranslationTransformer<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
    pub pad_id:  u32,
}

/// Result of a teacher-forced pass
pub struct TranslationOutput<B: Backend> {
    /// Mean cross-entropy over non-pad label positions
    pub loss:    Tensor<B, 1>,
    /// [batch, tgt_len - 1, tgt_vocab]
    pub logits:  Tensor<B, 3>,
    /// Labels (target shifted left by one), [batch, tgt_len - 1]
    pub targets: Tensor<B, 2, Int>,
}

impl<B: Backend> TranslationTransformer<B> {
    /// src: [batch, src_len] → [batch, src_len, d_model]
    pub fn encode(&self, src: Tensor<B, 2, Int>, mode: Mode) -> Tensor<B, 3> {
        self.encoder.forward(src, mode)
    }

    /// `src` is only read to mask source padding in cross-attention.
    /// → logits [batch, tgt_len, tgt_vocab]
    pub fn decode(
        &self,
        tgt:     Tensor<B, 2, Int>,
        encoded: Tensor<B, 3>,
        src:     Tensor<B, 2, Int>,
        mode:    Mode,
    ) -> Tensor<B, 3> {
        self.decoder.forward(tgt, encoded, src, mode)
    }

    pub fn forward(&self, src: Tensor<B, 2, Int>, tgt: Tensor<B, 2, Int>, mode: Mode) -> Tensor<B, 3> {
        let encoded = self.encode(src.clone(), mode);
        self.decode(tgt, encoded, src, mode)
    }

    /// Teacher forcing: feed `tgt[:, :-1]`, predict `tgt[:, 1:]`.
    /// Pad labels are ignored by the loss.
    pub fn forward_loss(
        &self,
        src:  Tensor<B, 2, Int>,
        tgt:  Tensor<B, 2, Int>,
        mode: Mode,
    ) -> TranslationOutput<B> {
        let [batch, tgt_len] = tgt.dims();
        let dec_input = tgt.clone().slice([0..batch, 0..tgt_len - 1]);
        let targets   = tgt.slice([0..batch, 1..tgt_len]);

        let logits = self.forward(src, dec_input, mode);
        let [_, steps, vocab] = logits.dims();

        let loss = masked_cross_entropy(
            logits.clone().reshape([batch * steps, vocab]),
            targets.clone().reshape([batch * steps]),
            self.pad_id,
        );

        TranslationOutput { loss, logits, targets }
    }
}

/// Mean negative log-likelihood over the labels that are not `pad_id`.
/// Pad labels are left out of both the sum and the count, so padding a
/// target never changes its loss. All-pad input gives 0.
fn masked_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
    pad_id: u32,
) -> Tensor<B, 1> {
    let [n] = labels.dims();
    let picked = log_softmax(logits, 1)
        .gather(1, labels.clone().reshape([n, 1]))
        .reshape([n]);
    let keep  = labels.not_equal_elem(pad_id as i64).float();
    let count = keep.clone().sum().clamp_min(1.0);
    (picked * keep).sum().neg() / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn random_ids(
        shape:  [usize; 2],
        vocab:  usize,
        device: &<TestBackend as Backend>::Device,
    ) -> Tensor<TestBackend, 2, Int> {
        // ids in 4..vocab so no accidental padding
        Tensor::<TestBackend, 2>::random(shape, Distribution::Uniform(4.0, vocab as f64 - 1.0), device)
            .int()
    }

    #[test]
    fn test_forward_loss_logits_shape() {
        let device = Default::default();
        let model = TranslationTransformerConfig::new(100, 120)
            .with_encoder_layers(1)
            .with_decoder_layers(1)
            .with_max_seq_len(64)
            .init::<TestBackend>(&device);

        let src = random_ids([4, 10], 100, &device);
        let tgt = random_ids([4, 12], 120, &device);
        let out = model.forward_loss(src, tgt, Mode::Eval);

        assert_eq!(out.logits.dims(), [4, 11, 120]);
        assert_eq!(out.targets.dims(), [4, 11]);
        let loss: f32 = out.loss.into_scalar().elem();
        assert!(loss.is_finite());
    }

    #[test]
    fn test_forward_matches_encode_then_decode() {
        let device = Default::default();
        let model = TranslationTransformerConfig::new(16, 18)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16)
            .init::<TestBackend>(&device);

        let src = random_ids([2, 5], 16, &device);
        let tgt = random_ids([2, 4], 18, &device);

        let direct: Vec<f32> = model
            .forward(src.clone(), tgt.clone(), Mode::Eval)
            .into_data().to_vec().unwrap();
        let encoded = model.encode(src.clone(), Mode::Eval);
        let staged: Vec<f32> = model
            .decode(tgt, encoded, src, Mode::Eval)
            .into_data().to_vec().unwrap();

        assert_eq!(direct, staged);
    }

    #[test]
    fn test_trailing_target_pad_leaves_loss_unchanged() {
        let device = Default::default();
        let model = TranslationTransformerConfig::new(16, 18)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16)
            .init::<TestBackend>(&device);

        let ids = |values: &[i32]| {
            Tensor::<TestBackend, 1, Int>::from_ints(values, &device).reshape([1, values.len()])
        };
        let src = ids(&[2, 5, 6, 7, 3]);

        let bare: f32 = model
            .forward_loss(src.clone(), ids(&[2, 9, 10, 11, 3]), Mode::Eval)
            .loss.into_scalar().elem();
        let padded: f32 = model
            .forward_loss(src, ids(&[2, 9, 10, 11, 3, 1, 1, 1]), Mode::Eval)
            .loss.into_scalar().elem();

        assert!((bare - padded).abs() < 1e-5, "{bare} vs {padded}");
    }

    #[test]
    fn test_masked_cross_entropy_matches_hand_value() {
        let device = Default::default();
        // uniform logits over 4 classes: every kept label costs ln 4
        let logits = Tensor::<TestBackend, 2>::zeros([3, 4], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([2, 1, 3], &device);

        let loss: f32 = masked_cross_entropy(logits, labels, 1).into_scalar().elem();
        assert!((loss - 4f32.ln()).abs() < 1e-5);

        let all_pad = Tensor::<TestBackend, 1, Int>::from_ints([1, 1], &device);
        let zero: f32 = masked_cross_entropy(Tensor::zeros([2, 4], &device), all_pad, 1)
            .into_scalar().elem();
        assert_eq!(zero, 0.0);
    }
}
