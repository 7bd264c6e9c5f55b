// ============================================================
// Layer 5 — Sinusoidal Positional Encoding
// ============================================================
// Attention is permutation-invariant, so the position of each
// token is injected by adding a fixed vector to its embedding:
//
//   PE(pos, 2i)   = sin(pos / 10000^(2i / d_model))
//   PE(pos, 2i+1) = cos(pos / 10000^(2i / d_model))
//
// The table is computed once for `max_seq_len` positions and
// stored as a plain tensor (no Param → no gradient, never
// touched by the optimiser). Each batch only uses its first
// `seq_len` rows, since padded length changes batch to batch.
//
// Reference: Vaswani et al. (2017) §3.5

use burn::prelude::*;

/// Value of the encoding table at (`pos`, `dim`).
pub fn sinusoid(pos: usize, dim: usize, d_model: usize) -> f32 {
    let pair_start = (dim - dim % 2) as f64;
    let angle = pos as f64 / 10000f64.powf(pair_start / d_model as f64);
    if dim % 2 == 0 {
        angle.sin() as f32
    } else {
        angle.cos() as f32
    }
}

#[derive(Config, Debug)]
pub struct PositionalEncodingConfig {
    pub d_model:     usize,
    pub max_seq_len: usize,
}

impl PositionalEncodingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEncoding<B> {
        let table: Vec<f32> = (0..self.max_seq_len)
            .flat_map(|pos| (0..self.d_model).map(move |dim| (pos, dim)))
            .map(|(pos, dim)| sinusoid(pos, dim, self.d_model))
            .collect();

        let table = Tensor::<B, 1>::from_floats(table.as_slice(), device)
            .reshape([self.max_seq_len, self.d_model]);

        PositionalEncoding { table, max_seq_len: self.max_seq_len }
    }
}

#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// [max_seq_len, d_model]
    pub table:       Tensor<B, 2>,
    pub max_seq_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    /// x: [batch, seq_len, d_model] → same shape, with positions added.
    ///
    /// # Panics
    /// If `seq_len` exceeds the table length. Callers bound sequence
    /// length at dataset construction.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, d_model] = x.dims();
        assert!(
            seq_len <= self.max_seq_len,
            "sequence length {seq_len} exceeds positional table length {}",
            self.max_seq_len
        );
        let pe = self
            .table
            .clone()
            .slice([0..seq_len, 0..d_model])
            .unsqueeze_dim::<3>(0)
            .expand([batch, seq_len, d_model]);
        x + pe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_sinusoid_matches_formula() {
        let d = 8;
        for pos in [0usize, 1, 7, 29] {
            for i in 0..d / 2 {
                let angle = pos as f64 / 10000f64.powf((2 * i) as f64 / d as f64);
                assert!((sinusoid(pos, 2 * i, d) - angle.sin() as f32).abs() < 1e-6);
                assert!((sinusoid(pos, 2 * i + 1, d) - angle.cos() as f32).abs() < 1e-6);
            }
        }
        // position 0: sin(0) = 0, cos(0) = 1
        assert_eq!(sinusoid(0, 0, d), 0.0);
        assert_eq!(sinusoid(0, 1, d), 1.0);
    }

    #[test]
    fn test_table_is_deterministic() {
        let device = Default::default();
        let cfg = PositionalEncodingConfig::new(16, 12);
        let a: Vec<f32> = cfg.init::<TestBackend>(&device).table.into_data().to_vec().unwrap();
        let b: Vec<f32> = cfg.init::<TestBackend>(&device).table.into_data().to_vec().unwrap();
        assert_eq!(a, b);
        assert_eq!(a[3 * 16 + 5], sinusoid(3, 5, 16));
    }

    #[test]
    fn test_forward_adds_first_rows_only() {
        let device = Default::default();
        let pe = PositionalEncodingConfig::new(4, 10).init::<TestBackend>(&device);
        let x  = Tensor::<TestBackend, 3>::zeros([2, 3, 4], &device);
        let out: Vec<f32> = pe.forward(x).into_data().to_vec().unwrap();

        assert_eq!(out.len(), 2 * 3 * 4);
        // both batch rows see the same encoding
        assert_eq!(out[..12], out[12..]);
        assert!((out[2 * 4 + 1] - sinusoid(2, 1, 4)).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "exceeds positional table length")]
    fn test_forward_rejects_overlong_sequence() {
        let device = Default::default();
        let pe = PositionalEncodingConfig::new(4, 2).init::<TestBackend>(&device);
        pe.forward(Tensor::<TestBackend, 3>::zeros([1, 3, 4], &device));
    }
}
