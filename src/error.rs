/*!
Error types shared by every network in the crate.

Construction errors are raised once, when a network is assembled. Forward
errors abort the pass they occur in; nothing is retried.
 */

use thiserror::Error;

/// Main error type for network assembly and forward passes.
#[derive(Error, Debug)]
pub enum NetError {
    /// The tensor rank (or padded spatial shape) is not the one the network was built for.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<i64>, actual: Vec<i64> },

    /// Channel widths of a stage plan do not add up.
    #[error("Channel arithmetic error: expected {expected} channels, got {actual}")]
    ChannelArithmetic { expected: i64, actual: i64 },

    /// Non-positive chunk count given to the chunked resampler.
    #[error("Invalid chunk count: {0}")]
    ChunkCount(i64),

    /// Target size or scale factor does not have one entry per spatial axis.
    #[error("Resample rank mismatch: tensor has {expected} spatial axes, got {actual}")]
    ResampleRank { expected: usize, actual: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error raised by libtorch.
    #[error(transparent)]
    Torch(#[from] tch::TchError),

    /// Failure encoding an exported array.
    #[cfg(feature = "ndarray")]
    #[error(transparent)]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, NetError>;

impl NetError {
    /// Create a shape mismatch error from two shapes.
    pub fn shape(expected: &[i64], actual: &[i64]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
