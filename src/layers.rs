/*!
# Layers

Building blocks shared by the segmentation networks and the autoencoder.
Every layer works for planar ([N, C, W, H]) and volumetric ([N, C, W, H, D])
tensors, the choice being fixed by a [`SpatialDims`] at construction.

Layers that own learned parameters declare what they are through
[`Parameterized`], which is how [`crate::tensor_init`] finds them.
 */

use serde::{Deserialize, Serialize};
use tch::nn::{Init, Module, ModuleT, Path};
use tch::Tensor;

/// Number of trailing spatial axes of a network instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialDims {
    /// [N, C, W, H]
    Planar,
    /// [N, C, W, H, D]
    Volumetric,
}

impl SpatialDims {
    /// Number of spatial axes.
    pub fn rank(self) -> usize {
        match self {
            SpatialDims::Planar => 2,
            SpatialDims::Volumetric => 3,
        }
    }

    /// Rank of a full tensor, batch and channel axes included.
    pub fn tensor_rank(self) -> usize {
        self.rank() + 2
    }

    /// The same value repeated on every spatial axis.
    pub fn splat(self, value: i64) -> Vec<i64> {
        vec![value; self.rank()]
    }
}

/// Max pooling pattern applied between backbone stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Halve every spatial axis.
    Full,
    /// Halve the in-plane axes only. The depth axis of a volumetric tensor is kept.
    InPlane,
}

impl Pool {
    /// Per-axis reduction factor of the pooling.
    pub fn factors(self, dims: SpatialDims) -> Vec<i64> {
        match (self, dims) {
            (Pool::InPlane, SpatialDims::Volumetric) => vec![2, 2, 1],
            _ => dims.splat(2),
        }
    }

    /**
    Apply the pooling to a tensor.

    # Arguments
    - xs: Tensor - [N, C, *spatial]
    - dims: SpatialDims - The dimensionality of `xs`

    # Returns
    Tensor - [N, C, *spatial / factors]
     */
    pub fn apply(self, xs: &Tensor, dims: SpatialDims) -> Tensor {
        let kernel = self.factors(dims);
        let padding = dims.splat(0);
        let dilation = dims.splat(1);
        let (kernel, padding, dilation) = (kernel.as_slice(), padding.as_slice(), dilation.as_slice());
        match dims {
            SpatialDims::Planar => xs.max_pool2d(kernel, kernel, padding, dilation, false),
            SpatialDims::Volumetric => xs.max_pool3d(kernel, kernel, padding, dilation, false),
        }
    }
}

/// Layers that own learned parameters, tagged by what they are.
pub enum LayerMut<'a> {
    Conv(&'a mut Conv),
    Norm(&'a mut Norm),
}

/// Walk every parameterized layer of a module tree.
pub trait Parameterized {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>));
}

/// Configuration of a [`Conv`] layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvConfig {
    pub kernel: Vec<i64>,
    pub stride: Vec<i64>,
    pub padding: Vec<i64>,
    pub dilation: Vec<i64>,
    pub bias: bool,
    pub transposed: bool,
}

impl ConvConfig {
    /// A stride 1, unpadded, undilated convolution without bias.
    pub fn new(dims: SpatialDims, kernel_size: i64) -> Self {
        Self {
            kernel: dims.splat(kernel_size),
            stride: dims.splat(1),
            padding: dims.splat(0),
            dilation: dims.splat(1),
            bias: false,
            transposed: false,
        }
    }

    /// Pad by half the kernel so odd kernels keep the spatial extent.
    pub fn same(dims: SpatialDims, kernel_size: i64) -> Self {
        Self::new(dims, kernel_size).with_padding(dims.splat(kernel_size / 2))
    }

    /// A transposed convolution whose kernel equals its stride.
    pub fn upsampling(dims: SpatialDims, factor: i64) -> Self {
        Self {
            stride: dims.splat(factor),
            transposed: true,
            ..Self::new(dims, factor)
        }
    }

    pub fn with_padding(mut self, padding: Vec<i64>) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_dilation(mut self, dilation: Vec<i64>) -> Self {
        self.dilation = dilation;
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }
}

/// Standard or transposed n-d convolution.
#[derive(Debug)]
pub struct Conv {
    pub weight: Tensor,
    pub bias: Option<Tensor>,
    in_channels: i64,
    out_channels: i64,
    config: ConvConfig,
}

impl Conv {
    pub fn new<'a>(vs: &Path<'a>, in_channels: i64, out_channels: i64, config: ConvConfig) -> Self {
        // torch layout: [out, in, k...] for convolutions, [in, out, k...] when transposed
        let mut shape = if config.transposed {
            vec![in_channels, out_channels]
        } else {
            vec![out_channels, in_channels]
        };
        shape.extend_from_slice(&config.kernel);
        let weight = vs.var("weight", &shape, tch::nn::init::DEFAULT_KAIMING_UNIFORM);
        let bias = config
            .bias
            .then(|| vs.var("bias", &[out_channels], Init::Const(0.0)));
        Self {
            weight,
            bias,
            in_channels,
            out_channels,
            config,
        }
    }

    pub fn in_channels(&self) -> i64 {
        self.in_channels
    }

    pub fn out_channels(&self) -> i64 {
        self.out_channels
    }

    /// Number of output elements one input element contributes to: `out_channels * prod(kernel)`.
    pub fn fan_out(&self) -> i64 {
        self.out_channels * self.config.kernel.iter().product::<i64>()
    }
}

impl Module for Conv {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let output_padding = vec![0; self.config.kernel.len()];
        xs.convolution(
            &self.weight,
            self.bias.as_ref(),
            self.config.stride.as_slice(),
            self.config.padding.as_slice(),
            self.config.dilation.as_slice(),
            self.config.transposed,
            output_padding.as_slice(),
            1,
        )
    }
}

impl Parameterized for Conv {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        f(LayerMut::Conv(self))
    }
}

/// Batch normalization over the channel axis with running statistics.
#[derive(Debug)]
pub struct Norm {
    pub weight: Tensor,
    pub bias: Tensor,
    pub running_mean: Tensor,
    pub running_var: Tensor,
    momentum: f64,
    eps: f64,
}

impl Norm {
    pub fn new<'a>(vs: &Path<'a>, channels: i64) -> Self {
        Self {
            weight: vs.var("weight", &[channels], Init::Const(1.0)),
            bias: vs.var("bias", &[channels], Init::Const(0.0)),
            running_mean: vs.zeros_no_train("running_mean", &[channels]),
            running_var: vs.ones_no_train("running_var", &[channels]),
            momentum: 0.1,
            eps: 1e-5,
        }
    }
}

impl ModuleT for Norm {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        xs.batch_norm(
            Some(&self.weight),
            Some(&self.bias),
            Some(&self.running_mean),
            Some(&self.running_var),
            train,
            self.momentum,
            self.eps,
            false,
        )
    }
}

impl Parameterized for Norm {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        f(LayerMut::Norm(self))
    }
}

/// Convolution, normalization and an optional ReLU.
#[derive(Debug)]
pub struct ConvNormAct {
    pub conv: Conv,
    pub norm: Norm,
    relu: bool,
}

impl ConvNormAct {
    pub fn new<'a>(vs: &Path<'a>, in_channels: i64, out_channels: i64, config: ConvConfig) -> Self {
        Self {
            conv: Conv::new(&(vs / "conv"), in_channels, out_channels, config),
            norm: Norm::new(&(vs / "norm"), out_channels),
            relu: true,
        }
    }

    /// Drop the activation, leaving convolution + normalization.
    pub fn without_relu(mut self) -> Self {
        self.relu = false;
        self
    }

    pub fn out_channels(&self) -> i64 {
        self.conv.out_channels()
    }
}

impl ModuleT for ConvNormAct {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let xs = self.norm.forward_t(&self.conv.forward(xs), train);
        if self.relu {
            xs.relu()
        } else {
            xs
        }
    }
}

impl Parameterized for ConvNormAct {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        self.conv.visit_layers(f);
        self.norm.visit_layers(f);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_pool_factors() {
        assert_eq!(Pool::Full.factors(SpatialDims::Volumetric), vec![2, 2, 2]);
        assert_eq!(Pool::InPlane.factors(SpatialDims::Volumetric), vec![2, 2, 1]);
        assert_eq!(Pool::InPlane.factors(SpatialDims::Planar), vec![2, 2]);
    }

    #[test]
    fn test_in_plane_pool_keeps_depth() {
        let xs = Tensor::randn(&[2, 4, 8, 6, 4], (Kind::Float, Device::Cpu));
        let ys = Pool::InPlane.apply(&xs, SpatialDims::Volumetric);
        assert_eq!(ys.size(), vec![2, 4, 4, 3, 4]);
        let ys = Pool::Full.apply(&xs, SpatialDims::Volumetric);
        assert_eq!(ys.size(), vec![2, 4, 4, 3, 2]);
    }

    #[test]
    fn test_same_conv_keeps_extent() {
        let vs = VarStore::new(Device::Cpu);
        let conv = Conv::new(&vs.root(), 3, 5, ConvConfig::same(SpatialDims::Planar, 5));
        let xs = Tensor::randn(&[1, 3, 9, 7], (Kind::Float, Device::Cpu));
        assert_eq!(conv.forward(&xs).size(), vec![1, 5, 9, 7]);
        assert_eq!(conv.fan_out(), 5 * 25);
        assert!(conv.bias.is_none());
    }

    #[test]
    fn test_transposed_conv_doubles_extent() {
        let vs = VarStore::new(Device::Cpu);
        let conv = Conv::new(&vs.root(), 6, 4, ConvConfig::upsampling(SpatialDims::Volumetric, 2));
        assert_eq!(conv.weight.size(), vec![6, 4, 2, 2, 2]);
        let xs = Tensor::randn(&[2, 6, 3, 3, 2], (Kind::Float, Device::Cpu));
        assert_eq!(conv.forward(&xs).size(), vec![2, 4, 6, 6, 4]);
    }

    #[test]
    fn test_conv_norm_act_is_non_negative() {
        let vs = VarStore::new(Device::Cpu);
        let block = ConvNormAct::new(&vs.root(), 2, 3, ConvConfig::same(SpatialDims::Planar, 3));
        let xs = Tensor::randn(&[2, 2, 8, 8], (Kind::Float, Device::Cpu));
        let ys = block.forward_t(&xs, false);
        assert_eq!(ys.size(), vec![2, 3, 8, 8]);
        assert!(f64::from(ys.min()) >= 0.0);
    }

    #[test]
    fn test_visit_layers_tags() {
        let vs = VarStore::new(Device::Cpu);
        let mut block = ConvNormAct::new(&vs.root(), 2, 3, ConvConfig::new(SpatialDims::Planar, 1));
        let (mut convs, mut norms) = (0, 0);
        block.visit_layers(&mut |layer| match layer {
            LayerMut::Conv(_) => convs += 1,
            LayerMut::Norm(_) => norms += 1,
        });
        assert_eq!((convs, norms), (1, 1));
    }
}
