/*!
# Shape alignment

Pads tensors so every spatial extent becomes a multiple of a per-axis block
size, and crops network outputs back to the caller's extent.

All padding goes on the low side of each axis (before the data) and is
filled with zeros, so cropping removes the first `pad[i]` elements of axis `i`.
 */

use tch::Tensor;

use crate::error::{NetError, Result};
use crate::layers::SpatialDims;
use crate::tensor_ext::TensorExt;

/**
Minimal padding that makes `size` a multiple of `block`.

# Example
```rust
# use atrous_seg::align::block_padding;
assert_eq!(block_padding(30, 32), 2);
assert_eq!(block_padding(64, 32), 0);
assert_eq!(block_padding(65, 32), 31);
```
 */
pub fn block_padding(size: i64, block: i64) -> i64 {
    block * ((size + block - 1) / block) - size
}

/// Computes [`Alignment`]s for tensors of a fixed spatial rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeAligner {
    dims: SpatialDims,
    minshape: Vec<i64>,
}

impl ShapeAligner {
    /// `minshape` holds one block size per spatial axis, 2 or 3 of them.
    pub fn new(minshape: &[i64]) -> Result<Self> {
        let dims = match minshape.len() {
            2 => SpatialDims::Planar,
            3 => SpatialDims::Volumetric,
            n => {
                return Err(NetError::config(format!(
                    "minshape must have 2 or 3 entries, got {n}"
                )))
            }
        };
        if let Some(block) = minshape.iter().find(|&&b| b <= 0) {
            return Err(NetError::config(format!("block size must be positive, got {block}")));
        }
        Ok(Self {
            dims,
            minshape: minshape.to_vec(),
        })
    }

    /// Same block size on every axis.
    pub fn uniform(dims: SpatialDims, block: i64) -> Result<Self> {
        Self::new(&dims.splat(block))
    }

    pub fn dims(&self) -> SpatialDims {
        self.dims
    }

    pub fn minshape(&self) -> &[i64] {
        &self.minshape
    }

    /// Spatial extent after padding.
    pub fn padded_shape(&self, spatial: &[i64]) -> Vec<i64> {
        spatial
            .iter()
            .zip(&self.minshape)
            .map(|(&size, &block)| size + block_padding(size, block))
            .collect()
    }

    /**
    Compute the padding of a tensor.

    # Arguments
    xs: Tensor - [N, C, *spatial] with as many spatial axes as `minshape` has entries

    # Returns
    Alignment - the per-axis pad amounts, or a shape mismatch error
     */
    pub fn alignment(&self, xs: &Tensor) -> Result<Alignment> {
        xs.check_dims(self.dims)?;
        let pad = xs
            .spatial_size()
            .iter()
            .zip(&self.minshape)
            .map(|(&size, &block)| block_padding(size, block))
            .collect();
        Ok(Alignment { pad })
    }

    /// Pad `xs` and return the alignment needed to undo it.
    pub fn align(&self, xs: &Tensor) -> Result<(Tensor, Alignment)> {
        let alignment = self.alignment(xs)?;
        Ok((alignment.pad(xs), alignment))
    }
}

/// Per-axis front padding of one tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pad: Vec<i64>,
}

impl Alignment {
    pub fn amounts(&self) -> &[i64] {
        &self.pad
    }

    pub fn is_noop(&self) -> bool {
        self.pad.iter().all(|&p| p == 0)
    }

    /// Zero-pad the low side of every spatial axis.
    pub fn pad(&self, xs: &Tensor) -> Tensor {
        if self.is_noop() {
            return xs.shallow_clone();
        }
        // constant_pad_nd lists (low, high) pairs starting from the last axis
        let pads = self
            .pad
            .iter()
            .rev()
            .flat_map(|&p| [p, 0])
            .collect::<Vec<i64>>();
        xs.constant_pad_nd(pads.as_slice())
    }

    /// Remove the padding from the low side of every spatial axis.
    pub fn crop(&self, xs: &Tensor) -> Tensor {
        let size = xs.size();
        self.pad
            .iter()
            .enumerate()
            .fold(xs.shallow_clone(), |acc, (i, &p)| {
                let dim = i + 2;
                acc.narrow(dim as i64, p, size[dim] - p)
            })
    }
}
