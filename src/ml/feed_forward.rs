// ============================================================
// Layer 5 — Position-wise Feed-Forward Block
// ============================================================
// Linear(d_model → d_ff) → ReLU → dropout → Linear(d_ff → d_model),
// applied to every position independently.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::mode::Mode;

#[derive(Config, Debug)]
pub struct FeedForwardConfig {
    pub d_model: usize,
    pub d_ff:    usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl FeedForwardConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeedForward<B> {
        FeedForward {
            inner:   LinearConfig::new(self.d_model, self.d_ff).init(device),
            outer:   LinearConfig::new(self.d_ff, self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub inner:   Linear<B>,
    pub outer:   Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let hidden = relu(self.inner.forward(x));
        self.outer.forward(mode.dropout(&self.dropout, hidden))
    }
}
