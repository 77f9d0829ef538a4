/*!
Contains diverse extensions to the Tensor struct.
 */

use tch::Tensor;

use crate::error::{NetError, Result};
use crate::layers::SpatialDims;

pub trait TensorExt {
    /// The trailing spatial extents, everything after [N, C].
    fn spatial_size(&self) -> Vec<i64>;
    /// Fail unless the tensor is [N, C, *spatial] with `dims.rank()` spatial axes.
    fn check_dims(&self, dims: SpatialDims) -> Result<()>;
    fn batch_size(&self) -> i64;
    fn channels(&self) -> i64;
}

impl TensorExt for Tensor {
    fn spatial_size(&self) -> Vec<i64> {
        self.size().into_iter().skip(2).collect()
    }

    fn check_dims(&self, dims: SpatialDims) -> Result<()> {
        let size = self.size();
        if size.len() != dims.tensor_rank() {
            let mut expected = size.iter().take(2).copied().collect::<Vec<_>>();
            expected.resize(dims.tensor_rank(), -1);
            return Err(NetError::shape(&expected, &size));
        }
        Ok(())
    }

    fn batch_size(&self) -> i64 {
        self.size().first().copied().unwrap_or(0)
    }

    fn channels(&self) -> i64 {
        self.size().get(1).copied().unwrap_or(0)
    }
}
