/*!
Conversion of network outputs to `ndarray` arrays and `.npy` files.
 */

use std::io::Write;

use ndarray::{ArrayD, IxDyn};
use ndarray_npy::WriteNpyExt;
use tch::{Kind, Tensor};

use crate::error::{NetError, Result};

pub trait NDATensorExt {
    fn to_ndarray(&self) -> Result<ArrayD<f32>>;

    fn from_ndarray(array: &ArrayD<f32>) -> Self;
}

impl NDATensorExt for Tensor {
    fn to_ndarray(&self) -> Result<ArrayD<f32>> {
        let data = Vec::<f32>::from(&self.to_kind(Kind::Float).contiguous());
        to_array(&self.size(), data)
    }

    fn from_ndarray(array: &ArrayD<f32>) -> Self {
        let shape = array.shape().iter().map(|&d| d as i64).collect::<Vec<_>>();
        let data = array.iter().copied().collect::<Vec<f32>>();
        Tensor::of_slice(&data).reshape(shape.as_slice())
    }
}

fn to_array<T>(size: &[i64], data: Vec<T>) -> Result<ArrayD<T>> {
    let shape = size.iter().map(|&d| d as usize).collect::<Vec<_>>();
    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|_| NetError::shape(size, &[]))
}

/**
Per-pixel (or per-voxel) predicted class.

# Arguments
scores: Tensor - class scores [N, K, *spatial]

# Returns
ArrayD<i64> - the index of the highest score [N, *spatial]
 */
pub fn label_map(scores: &Tensor) -> Result<ArrayD<i64>> {
    if scores.dim() < 3 {
        return Err(NetError::shape(&[-1, -1, -1], &scores.size()));
    }
    let labels = scores.argmax(Some(1), false).contiguous();
    to_array(&labels.size(), Vec::<i64>::from(&labels))
}

/// Encode a label map as `.npy` bytes.
pub fn write_label_map<W: Write>(scores: &Tensor, writer: W) -> Result<()> {
    label_map(scores)?.write_npy(writer)?;
    Ok(())
}
