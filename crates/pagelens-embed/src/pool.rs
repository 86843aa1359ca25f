use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Mean over the unmasked tokens of `hidden` (`[B, T, H]`), then L2-normalize
/// each row. Returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, hidden_dim) = match hidden.dims() {
        &[b, t, h] => (b, t, h),
        dims => bail!("hidden states must be [B, T, H], got {:?}", dims),
    };

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let eps = match hidden.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };

    // A row with no live tokens pools to the zero vector.
    let summed = (hidden * &mask_3d)?.sum(1)?;
    let lengths = (mask.sum_keepdim(1)? + eps)?;
    let mean = summed.broadcast_div(&lengths)?;
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let pooled = mean.broadcast_div(&norm)?;
    if pooled.dims() != [batch, hidden_dim] {
        bail!("pooled shape {:?} != [{}, {}]", pooled.dims(), batch, hidden_dim);
    }
    Ok(pooled)
}
