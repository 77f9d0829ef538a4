/*!
# Configuration

Construction-time settings of the networks. Every struct deserializes with
serde, missing fields falling back to the defaults below.
 */

use serde::{Deserialize, Serialize};

use crate::resample::InterpolationMode;

/// How skip outputs are brought back to the padded input resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    pub mode: InterpolationMode,
    /// Chunks used when undoing a stage's downsampling by scale factor.
    pub scale_chunks: i64,
    /// Chunks used when resizing to the padded input size.
    pub resize_chunks: i64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::Nearest,
            scale_chunks: 16,
            resize_chunks: 4,
        }
    }
}

/// Settings of the planar and volumetric segmentation networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub n_channels: i64,
    pub n_filt_init: i64,
    /// Channel width added at every stage after the first.
    pub growth: i64,
    /// Kernel of the plain convolution stages after the stem.
    pub kernel_size: i64,
    pub stem_kernel_size: i64,
    /// Width of the compressed skip outputs.
    pub compress_targ: i64,
    pub num_classes: i64,
    /// Block size per spatial axis. Defaults to (32, 32, 4) or (32, 32).
    pub minshape: Option<Vec<i64>>,
    pub resample: ResampleConfig,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_channels: 3,
            n_filt_init: 16,
            growth: 8,
            kernel_size: 3,
            stem_kernel_size: 5,
            compress_targ: 8,
            num_classes: 10,
            minshape: None,
            resample: ResampleConfig::default(),
        }
    }
}

impl SegmentationConfig {
    pub fn volumetric() -> Self {
        Self::default()
    }

    pub fn planar() -> Self {
        Self {
            growth: 24,
            compress_targ: 32,
            ..Self::default()
        }
    }

    pub fn with_minshape(mut self, minshape: &[i64]) -> Self {
        self.minshape = Some(minshape.to_vec());
        self
    }

    /// Input width of the final 1x1 projection.
    pub fn head_in_channels(&self) -> i64 {
        self.n_channels + self.n_filt_init + (self.n_filt_init + self.growth) + 4 * self.compress_targ
    }
}

/// Nonlinearity applied to the autoencoder reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    #[default]
    Sigmoid,
    Tanh,
    Identity,
}

/// Settings of the convolutional autoencoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoencoderConfig {
    /// Spatial shape of the inputs, before padding. 2 or 3 entries.
    pub input_shape: Vec<i64>,
    pub n_channels: i64,
    pub n_z: i64,
    pub output: OutputActivation,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            input_shape: vec![64, 64],
            n_channels: 3,
            n_z: 20,
            output: OutputActivation::Sigmoid,
        }
    }
}

impl AutoencoderConfig {
    pub fn new(input_shape: &[i64]) -> Self {
        Self {
            input_shape: input_shape.to_vec(),
            ..Self::default()
        }
    }
}
