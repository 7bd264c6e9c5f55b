// ============================================================
// Layer 5 — Execution Mode
// ============================================================
// Burn has no global train()/eval() switch. Every forward method
// that behaves differently while training takes a `Mode`, and
// dropout is the only such behaviour in this model.

use burn::{nn::Dropout, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Dropout active
    Train,
    /// Deterministic forward pass
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }

    /// Apply `dropout` only in training mode.
    pub fn dropout<B: Backend, const D: usize>(
        self,
        dropout: &Dropout,
        x:       Tensor<B, D>,
    ) -> Tensor<B, D> {
        if self.is_train() {
            dropout.forward(x)
        } else {
            x
        }
    }
}
