/*!
# Convolutional autoencoder

Pads inputs to a multiple of 32 on every axis, encodes them with six
convolution stages (five 2x poolings), bottlenecks through a linear latent
code and decodes with five transposed-convolution upsampling stages.

## Shapes
- input: [N, C, *shape], `shape` fixed at construction
- reconstruction: [N, C, *shape]
- latent: [N, n_z]
 */

use tch::nn::{self, Module, ModuleT, Path};
use tch::Tensor;

use crate::align::{Alignment, ShapeAligner};
use crate::config::{AutoencoderConfig, OutputActivation};
use crate::error::{NetError, Result};
use crate::layers::{Conv, ConvConfig, ConvNormAct, LayerMut, Parameterized, Pool, SpatialDims};
use crate::tensor_ext::TensorExt;
use crate::tensor_init::init_parameters;

const BLOCK: i64 = 32;
const WIDTHS: [i64; 6] = [16, 32, 48, 64, 80, 96];

impl OutputActivation {
    pub fn apply(self, xs: &Tensor) -> Tensor {
        match self {
            OutputActivation::Sigmoid => xs.sigmoid(),
            OutputActivation::Tanh => xs.tanh(),
            OutputActivation::Identity => xs.shallow_clone(),
        }
    }
}

/// Transposed 2x upsampling followed by 1x1 conv + norm + ReLU.
#[derive(Debug)]
struct UpStage {
    upsample: Conv,
    refine: ConvNormAct,
}

impl ModuleT for UpStage {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        self.refine.forward_t(&self.upsample.forward(xs), train)
    }
}

#[derive(Debug)]
pub struct AutoencoderNet {
    dims: SpatialDims,
    aligner: ShapeAligner,
    n_channels: i64,
    padded_shape: Vec<i64>,
    latent_shape: Vec<i64>,
    encoder: Vec<ConvNormAct>,
    encode: nn::Linear,
    decode: nn::Linear,
    decoder: Vec<UpStage>,
    conv_out: Conv,
    output: OutputActivation,
}

impl AutoencoderNet {
    pub fn new<'a>(vs: &Path<'a>, config: &AutoencoderConfig) -> Result<Self> {
        let aligner = match config.input_shape.len() {
            2 => ShapeAligner::uniform(SpatialDims::Planar, BLOCK)?,
            3 => ShapeAligner::uniform(SpatialDims::Volumetric, BLOCK)?,
            n => {
                return Err(NetError::config(format!(
                    "input shape must have 2 or 3 axes, got {n}"
                )))
            }
        };
        if config.input_shape.iter().any(|&s| s <= 0) {
            return Err(NetError::config(format!("invalid input shape {:?}", config.input_shape)));
        }
        if config.n_z <= 0 || config.n_channels <= 0 {
            return Err(NetError::config("n_z and n_channels must be positive"));
        }
        let dims = aligner.dims();
        let padded_shape = aligner.padded_shape(&config.input_shape);
        let latent_shape = padded_shape.iter().map(|&s| s / BLOCK).collect::<Vec<_>>();

        let encoder = std::iter::once(config.n_channels)
            .chain(WIDTHS)
            .zip(WIDTHS)
            .enumerate()
            .map(|(i, (c_in, c_out))| {
                ConvNormAct::new(&vs.sub("encoder").sub(i), c_in, c_out, ConvConfig::same(dims, 3))
            })
            .collect::<Vec<_>>();

        let bottleneck = WIDTHS[5];
        let flat = bottleneck * latent_shape.iter().product::<i64>();
        let encode = nn::linear(vs / "encode", flat, config.n_z, Default::default());
        let decode = nn::linear(vs / "decode", config.n_z, flat, Default::default());

        let decoder = WIDTHS
            .iter()
            .rev()
            .zip(WIDTHS.iter().rev().skip(1))
            .enumerate()
            .map(|(i, (&c_in, &c_out))| {
                let vs = vs.sub("decoder").sub(i);
                let upsample = ConvConfig::upsampling(dims, 2);
                UpStage {
                    upsample: Conv::new(&(&vs / "upsample"), c_in, c_out, upsample),
                    refine: ConvNormAct::new(&(&vs / "refine"), c_out, c_out, ConvConfig::new(dims, 1)),
                }
            })
            .collect::<Vec<_>>();
        let conv_out = Conv::new(
            &(vs / "conv_out"),
            WIDTHS[0],
            config.n_channels,
            ConvConfig::same(dims, 3).with_bias(true),
        );
        tracing::debug!(?padded_shape, ?latent_shape, n_z = config.n_z, "building autoencoder");

        let mut net = Self {
            dims,
            aligner,
            n_channels: config.n_channels,
            padded_shape,
            latent_shape,
            encoder,
            encode,
            decode,
            decoder,
            conv_out,
            output: config.output,
        };
        init_parameters(&mut net);
        Ok(net)
    }

    pub fn dims(&self) -> SpatialDims {
        self.dims
    }

    /// Spatial shape of the bottleneck feature map.
    pub fn latent_shape(&self) -> &[i64] {
        &self.latent_shape
    }

    /// Encode to the latent code, [N, n_z].
    pub fn encode_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let padded = self.check_and_pad(xs)?.0;
        Ok(self.encode_padded(&padded, train))
    }

    /**
    Reconstruct the input.

    # Arguments
    - xs: Tensor - [N, C, *shape] with the shape given at construction
    - train: bool - use batch statistics in the normalization layers

    # Returns
    (Tensor, Tensor) - the reconstruction [N, C, *shape] and the latent code [N, n_z]
     */
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<(Tensor, Tensor)> {
        let (padded, alignment) = self.check_and_pad(xs)?;
        let latent = self.encode_padded(&padded, train);

        let mut shape = vec![xs.batch_size(), WIDTHS[5]];
        shape.extend_from_slice(&self.latent_shape);
        let mut ys = self.decode.forward(&latent).reshape(shape.as_slice());
        for stage in &self.decoder {
            ys = stage.forward_t(&ys, train);
        }
        let ys = self.output.apply(&self.conv_out.forward(&ys));
        Ok((alignment.crop(&ys), latent))
    }

    fn check_and_pad(&self, xs: &Tensor) -> Result<(Tensor, Alignment)> {
        let (padded, alignment) = self.aligner.align(xs)?;
        // the linear layers are sized for one padded shape
        if padded.spatial_size() != self.padded_shape || xs.channels() != self.n_channels {
            let mut expected = vec![xs.batch_size(), self.n_channels];
            expected.extend_from_slice(&self.padded_shape);
            return Err(NetError::shape(&expected, &padded.size()));
        }
        Ok((padded, alignment))
    }

    fn encode_padded(&self, padded: &Tensor, train: bool) -> Tensor {
        let mut xs = padded.shallow_clone();
        for (i, stage) in self.encoder.iter().enumerate() {
            if i > 0 {
                xs = Pool::Full.apply(&xs, self.dims);
            }
            xs = stage.forward_t(&xs, train);
        }
        self.encode.forward(&xs.flatten(1, -1))
    }
}

impl Parameterized for AutoencoderNet {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        for stage in self.encoder.iter_mut() {
            stage.visit_layers(f);
        }
        for stage in self.decoder.iter_mut() {
            stage.upsample.visit_layers(f);
            stage.refine.visit_layers(f);
        }
        self.conv_out.visit_layers(f);
    }
}
