// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// All masks are Bool tensors of shape [batch, query_len, key_len]
// where `true` means "this key is hidden from this query".
// Attention turns `true` into a large negative bias before the
// softmax, so masked keys end up with ~0 weight.
//
//   padding_mask — hides key positions holding the pad id
//   causal_mask  — hides keys to the right of the query
//   combine      — logical OR of two masks

use burn::prelude::*;

/// Hide every key position of `keys` that equals `pad_id`.
///
/// keys: [batch, key_len] → mask: [batch, query_len, key_len]
pub fn padding_mask<B: Backend>(
    keys:      Tensor<B, 2, Int>,
    pad_id:    u32,
    query_len: usize,
) -> Tensor<B, 3, Bool> {
    let [batch, key_len] = keys.dims();
    keys.equal_elem(pad_id as i64)
        .unsqueeze_dim::<3>(1)
        .expand([batch, query_len, key_len])
}

/// Hide key j from query i whenever j > i.
pub fn causal_mask<B: Backend>(
    batch:  usize,
    len:    usize,
    device: &B::Device,
) -> Tensor<B, 3, Bool> {
    let idx  = Tensor::<B, 1, Int>::arange(0..len as i64, device);
    let rows = idx.clone().reshape([len, 1]).expand([len, len]);
    let cols = idx.reshape([1, len]).expand([len, len]);
    cols.greater(rows)
        .unsqueeze_dim::<3>(0)
        .expand([batch, len, len])
}

pub fn combine<B: Backend>(
    a: Tensor<B, 3, Bool>,
    b: Tensor<B, 3, Bool>,
) -> Tensor<B, 3, Bool> {
    a.bool_or(b)
}
