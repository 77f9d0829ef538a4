/*!
 * # Atrous-seg - Multi-scale segmentation networks on tch
 *
 * Encoder/decoder segmentation networks for planar and volumetric images that
 * fuse multi-scale context through atrous (dilated) convolution pyramids, plus
 * a convolutional autoencoder.
 *
 * ## Features
 * - Inputs of any spatial extent : inputs are zero-padded to a block multiple and the
 *   outputs cropped back, so `forward(x)` has exactly the spatial shape of `x`
 * - Atrous pyramids : parallel dilated convolutions fused by concatenation + compression
 * - Chunked resampling : skip outputs are resampled back to full resolution chunk by chunk
 *   along the batch axis to bound peak memory
 * - Declarative backbones : a network is a list of stage descriptors consumed by one builder
 *
 * ## Conventions
 *
 * ### Shapes
 * - N : The number of samples
 * - C : The number of channels
 * - W, H : The in-plane extents
 * - D : The depth, only for volumetric tensors
 *
 * - [N, C, W, H] : a batch of N planar images
 * - [N, C, W, H, D] : a batch of N volumes, usually much thinner in D than in W and H
 *
 * A network is planar or volumetric for its whole life, see [`layers::SpatialDims`].
 *
 * ```no_run
 * use atrous_seg::{backbone::SegmentationNet, config::SegmentationConfig};
 * use tch::{nn::VarStore, Device, Kind, Tensor};
 *
 * let vs = VarStore::new(Device::Cpu);
 * let net = SegmentationNet::volumetric(&vs.root(), &SegmentationConfig::volumetric()).unwrap();
 * let xs = Tensor::randn(&[2, 3, 30, 30, 3], (Kind::Float, Device::Cpu));
 * let scores = net.forward_t(&xs, false).unwrap();
 * assert_eq!(scores.size(), vec![2, 10, 30, 30, 3]);
 * ```
 */

pub mod align;
pub mod aspp;
pub mod autoencoder;
pub mod backbone;
pub mod config;
pub mod error;
pub mod layers;
#[cfg(feature = "ndarray")]
pub mod ndarray;
pub mod resample;
pub mod tensor_ext;
pub mod tensor_init;
#[cfg(test)]
mod utils;

pub use error::{NetError, Result};
