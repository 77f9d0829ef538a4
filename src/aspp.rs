/*!
# Atrous spatial pyramid

A bank of parallel dilated convolutions plus a 1x1 projection, fused by
channel concatenation and a 1x1 compression back to a fixed width.

## Shapes
- input: [N, C_in, *spatial]
- concatenated branches: [N, (len(schedule) + 1) * C_out, *spatial]
- output: [N, C_out, *spatial]
 */

use serde::{Deserialize, Serialize};
use tch::nn::{ModuleT, Path};
use tch::Tensor;

use crate::error::{NetError, Result};
use crate::layers::{ConvConfig, ConvNormAct, LayerMut, Parameterized, SpatialDims};

/// Ordered per-axis dilation rates, one entry per parallel branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DilationSchedule(Vec<Vec<i64>>);

impl DilationSchedule {
    pub fn new(rates: Vec<Vec<i64>>) -> Self {
        Self(rates)
    }

    /// Isotropic rates, repeated on every spatial axis.
    pub fn uniform(rates: &[i64], dims: SpatialDims) -> Self {
        Self(rates.iter().map(|&r| dims.splat(r)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[i64]> {
        self.0.iter().map(Vec::as_slice)
    }

    /// Fail unless every entry has one positive rate per axis of `dims`.
    pub fn validate(&self, dims: SpatialDims) -> Result<()> {
        for rates in self.iter() {
            if rates.len() != dims.rank() {
                return Err(NetError::config(format!(
                    "dilation {rates:?} does not match {} spatial axes",
                    dims.rank()
                )));
            }
            if rates.iter().any(|&r| r <= 0) {
                return Err(NetError::config(format!("dilation rates must be positive: {rates:?}")));
            }
        }
        Ok(())
    }
}

/// 3x3 dilated convolution, normalization and ReLU. Padding equals the dilation so extents are kept.
#[derive(Debug)]
pub struct DilatedConvBlock {
    inner: ConvNormAct,
}

impl DilatedConvBlock {
    pub fn new<'a>(
        vs: &Path<'a>,
        dims: SpatialDims,
        in_channels: i64,
        out_channels: i64,
        dilation: &[i64],
    ) -> Self {
        let config = ConvConfig::new(dims, 3)
            .with_padding(dilation.to_vec())
            .with_dilation(dilation.to_vec());
        Self {
            inner: ConvNormAct::new(vs, in_channels, out_channels, config),
        }
    }
}

impl ModuleT for DilatedConvBlock {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        self.inner.forward_t(xs, train)
    }
}

impl Parameterized for DilatedConvBlock {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        self.inner.visit_layers(f)
    }
}

/// Atrous spatial pyramid pooling block.
#[derive(Debug)]
pub struct AtrousPyramid {
    projection: ConvNormAct,
    branches: Vec<DilatedConvBlock>,
    compression: ConvNormAct,
}

impl AtrousPyramid {
    pub fn new<'a>(
        vs: &Path<'a>,
        dims: SpatialDims,
        in_channels: i64,
        out_channels: i64,
        schedule: &DilationSchedule,
    ) -> Result<Self> {
        schedule.validate(dims)?;
        // no activation on the projection until after fusion
        let projection =
            ConvNormAct::new(&(vs / "projection"), in_channels, out_channels, ConvConfig::new(dims, 1))
                .without_relu();
        let branches = schedule
            .iter()
            .enumerate()
            .map(|(i, rates)| {
                DilatedConvBlock::new(&vs.sub("branches").sub(i), dims, in_channels, out_channels, rates)
            })
            .collect::<Vec<_>>();
        let fused = (schedule.len() as i64 + 1) * out_channels;
        let compression =
            ConvNormAct::new(&(vs / "compression"), fused, out_channels, ConvConfig::new(dims, 1));
        Ok(Self {
            projection,
            branches,
            compression,
        })
    }

    pub fn out_channels(&self) -> i64 {
        self.compression.out_channels()
    }

    /// All branch outputs concatenated on the channel axis, before compression.
    pub fn concat_branches(&self, xs: &Tensor, train: bool) -> Tensor {
        let mut outputs = Vec::with_capacity(self.branches.len() + 1);
        outputs.push(self.projection.forward_t(xs, train));
        outputs.extend(self.branches.iter().map(|branch| branch.forward_t(xs, train)));
        Tensor::cat(&outputs, 1)
    }
}

impl ModuleT for AtrousPyramid {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        self.compression.forward_t(&self.concat_branches(xs, train), train)
    }
}

impl Parameterized for AtrousPyramid {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        self.projection.visit_layers(f);
        for branch in self.branches.iter_mut() {
            branch.visit_layers(f);
        }
        self.compression.visit_layers(f);
    }
}
