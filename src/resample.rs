/*!
# Chunked resampling

Spatial resampling of [N, C, *spatial] tensors, processed in contiguous
batch-axis chunks to bound peak memory. Chunks are resampled one after the
other and concatenated back in their original order, so output row `i`
always comes from input row `i`.

Two modes:
- scale factor ([`ChunkedResampler::upsample`]): always chunked.
- target size ([`ChunkedResampler::resize`]): resampled in one pass when the
  chunk count would not split the batch.
 */

use serde::{Deserialize, Serialize};
use tch::Tensor;

use crate::error::{NetError, Result};
use crate::tensor_ext::TensorExt;

/// Interpolation kernel. Neither kind couples batch elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    Nearest,
    /// Bilinear for planar tensors, trilinear for volumetric ones, `align_corners = false`.
    Linear,
}

/// Resamples a tensor chunk by chunk along the batch axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedResampler {
    chunks: i64,
    mode: InterpolationMode,
}

impl ChunkedResampler {
    pub fn new(chunks: i64, mode: InterpolationMode) -> Result<Self> {
        if chunks <= 0 {
            return Err(NetError::ChunkCount(chunks));
        }
        Ok(Self { chunks, mode })
    }

    pub fn nearest(chunks: i64) -> Result<Self> {
        Self::new(chunks, InterpolationMode::Nearest)
    }

    pub fn chunks(&self) -> i64 {
        self.chunks
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /**
    Resample by a per-axis scale factor.

    # Arguments
    - xs: Tensor - [N, C, *spatial] with 2 or 3 spatial axes
    - scale: &[f64] - one factor per spatial axis

    # Returns
    Tensor - [N, C, *floor(spatial * scale)]
     */
    pub fn upsample(&self, xs: &Tensor, scale: &[f64]) -> Result<Tensor> {
        check_rank(xs, scale.len())?;
        let size = xs
            .spatial_size()
            .iter()
            .zip(scale)
            .map(|(&s, &f)| (s as f64 * f).floor() as i64)
            .collect::<Vec<_>>();
        tracing::trace!(chunks = self.chunks, ?scale, mode = ?self.mode, "chunked upsample");
        Ok(self.chunked(xs, |chunk| interpolate(chunk, &size, Some(scale), self.mode)))
    }

    /**
    Resample to an explicit spatial size.

    # Arguments
    - xs: Tensor - [N, C, *spatial] with 2 or 3 spatial axes
    - size: &[i64] - target extent, one entry per spatial axis

    # Returns
    Tensor - [N, C, *size]
     */
    pub fn resize(&self, xs: &Tensor, size: &[i64]) -> Result<Tensor> {
        check_rank(xs, size.len())?;
        if self.chunks >= xs.batch_size() {
            tracing::trace!(?size, mode = ?self.mode, "resize in one pass");
            return Ok(interpolate(xs, size, None, self.mode));
        }
        tracing::trace!(chunks = self.chunks, ?size, mode = ?self.mode, "chunked resize");
        Ok(self.chunked(xs, |chunk| interpolate(chunk, size, None, self.mode)))
    }

    fn chunked<F: Fn(&Tensor) -> Tensor>(&self, xs: &Tensor, f: F) -> Tensor {
        let outputs = xs.chunk(self.chunks, 0).iter().map(f).collect::<Vec<_>>();
        Tensor::cat(&outputs, 0)
    }
}

fn check_rank(xs: &Tensor, actual: usize) -> Result<()> {
    let rank = xs.dim();
    if rank != 4 && rank != 5 {
        // [N, C, *spatial] with 2 or 3 spatial axes
        return Err(NetError::shape(&[-1, -1, -1, -1], &xs.size()));
    }
    let expected = rank - 2;
    if actual != expected {
        return Err(NetError::ResampleRank { expected, actual });
    }
    Ok(())
}

fn interpolate(xs: &Tensor, size: &[i64], scale: Option<&[f64]>, mode: InterpolationMode) -> Tensor {
    let s = |i: usize| scale.map(|scale| scale[i]);
    match (size.len(), mode) {
        (2, InterpolationMode::Nearest) => xs.upsample_nearest2d(size, s(0), s(1)),
        (2, InterpolationMode::Linear) => xs.upsample_bilinear2d(size, false, s(0), s(1)),
        (_, InterpolationMode::Nearest) => xs.upsample_nearest3d(size, s(0), s(1), s(2)),
        (_, InterpolationMode::Linear) => xs.upsample_trilinear3d(size, false, s(0), s(1), s(2)),
    }
}
