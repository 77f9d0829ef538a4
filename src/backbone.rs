/*!
# Encoder / decoder segmentation backbone

The network is described by a [`StagePlan`], an ordered list of
[`StageSpec`]s, and assembled by one generic builder. Each stage is either
two convolutions or an [`AtrousPyramid`], may emit a skip output and may
be followed by a pooling.

Forward pass:
1. the input is padded to a multiple of `minshape` on every spatial axis,
2. stages run in order; every skip output is optionally compressed to
   `compress_targ` channels and resampled back to the padded resolution,
   undoing the stage's cumulative downsampling,
3. padded input and skips are concatenated on the channel axis and
   projected to `num_classes` by a 1x1 convolution with bias,
4. the padding is cropped off.

Skips of stages that see the full resolution are forwarded as is.
 */

use serde::{Deserialize, Serialize};
use tch::nn::{Module, ModuleT, Path};
use tch::Tensor;

use crate::align::ShapeAligner;
use crate::aspp::{AtrousPyramid, DilationSchedule};
use crate::config::{ResampleConfig, SegmentationConfig};
use crate::error::{NetError, Result};
use crate::layers::{Conv, ConvConfig, ConvNormAct, LayerMut, Parameterized, Pool, SpatialDims};
use crate::resample::ChunkedResampler;
use crate::tensor_ext::TensorExt;
use crate::tensor_init::init_parameters;

/// Body of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// Two convolution + normalization + ReLU steps with a square kernel.
    Plain { kernel_size: i64 },
    /// An atrous pyramid with one branch per schedule entry.
    Pyramid { schedule: DilationSchedule },
}

/// What a stage sends to the final concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skip {
    None,
    /// The stage output itself.
    Direct,
    /// The stage output compressed to `compress_targ` channels by 1x1 conv + norm + ReLU.
    Compressed,
}

/// Declarative description of one backbone stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub kind: StageKind,
    pub in_channels: i64,
    pub out_channels: i64,
    pub skip: Skip,
    /// Pooling applied after the skip is taken.
    pub pool: Option<Pool>,
}

/// Ordered stage descriptors plus the channel bookkeeping of the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub dims: SpatialDims,
    pub n_channels: i64,
    pub compress_targ: i64,
    pub num_classes: i64,
    /// Declared input width of the final projection.
    pub head_in_channels: i64,
    pub stages: Vec<StageSpec>,
}

impl StagePlan {
    /**
    The volumetric layout: the depth axis is pooled only every other time,
    as inputs are expected to be much thinner in depth than in-plane.

    | stage | body                                   | skip       | pool     |
    |-------|----------------------------------------|------------|----------|
    | 0     | plain, stem kernel                     | direct     | full     |
    | 1     | plain                                  | direct     | in-plane |
    | 2     | plain                                  | compressed |          |
    | 3     | pyramid (3,3,1) (6,6,2) (9,9,3)        | compressed | full     |
    | 4     | pyramid (3,3,1) (6,6,1) (9,9,2)        | compressed | in-plane |
    | 5     | pyramid (2,2,1) (3,3,1) (4,4,2) (5,5,2)| compressed |          |
     */
    pub fn volumetric(config: &SegmentationConfig) -> Self {
        let schedules = [
            vec![vec![3, 3, 1], vec![6, 6, 2], vec![9, 9, 3]],
            vec![vec![3, 3, 1], vec![6, 6, 1], vec![9, 9, 2]],
            vec![vec![2, 2, 1], vec![3, 3, 1], vec![4, 4, 2], vec![5, 5, 2]],
        ]
        .map(DilationSchedule::new);
        let pools = [
            Some(Pool::Full),
            Some(Pool::InPlane),
            None,
            Some(Pool::Full),
            Some(Pool::InPlane),
            None,
        ];
        Self::from_config(SpatialDims::Volumetric, config, schedules, pools)
    }

    /// The planar layout: same stages, every pooling halves both axes.
    pub fn planar(config: &SegmentationConfig) -> Self {
        let dims = SpatialDims::Planar;
        let schedules = [&[3, 6, 9][..], &[3, 6, 9][..], &[2, 3, 4, 5][..]]
            .map(|rates| DilationSchedule::uniform(rates, dims));
        let pools = [
            Some(Pool::Full),
            Some(Pool::Full),
            None,
            Some(Pool::Full),
            Some(Pool::Full),
            None,
        ];
        Self::from_config(dims, config, schedules, pools)
    }

    fn from_config(
        dims: SpatialDims,
        config: &SegmentationConfig,
        schedules: [DilationSchedule; 3],
        pools: [Option<Pool>; 6],
    ) -> Self {
        let mut kinds = vec![
            StageKind::Plain {
                kernel_size: config.stem_kernel_size,
            },
            StageKind::Plain {
                kernel_size: config.kernel_size,
            },
            StageKind::Plain {
                kernel_size: config.kernel_size,
            },
        ];
        kinds.extend(schedules.into_iter().map(|schedule| StageKind::Pyramid { schedule }));
        let skips = [
            Skip::Direct,
            Skip::Direct,
            Skip::Compressed,
            Skip::Compressed,
            Skip::Compressed,
            Skip::Compressed,
        ];

        let mut in_channels = config.n_channels;
        let mut out_channels = config.n_filt_init;
        let mut stages = Vec::with_capacity(kinds.len());
        for ((kind, skip), pool) in kinds.into_iter().zip(skips).zip(pools) {
            stages.push(StageSpec {
                kind,
                in_channels,
                out_channels,
                skip,
                pool,
            });
            in_channels = out_channels;
            out_channels += config.growth;
        }
        Self {
            dims,
            n_channels: config.n_channels,
            compress_targ: config.compress_targ,
            num_classes: config.num_classes,
            head_in_channels: config.head_in_channels(),
            stages,
        }
    }

    /// Channel width actually fed to the head: input channels plus every skip width.
    pub fn skip_channels(&self) -> i64 {
        self.n_channels
            + self
                .stages
                .iter()
                .map(|stage| match stage.skip {
                    Skip::None => 0,
                    Skip::Direct => stage.out_channels,
                    Skip::Compressed => self.compress_targ,
                })
                .sum::<i64>()
    }

    /// Cumulative downsampling in effect at each stage, before its own pooling.
    pub fn skip_scales(&self) -> Vec<Vec<i64>> {
        let mut scale = self.dims.splat(1);
        self.stages
            .iter()
            .map(|stage| {
                let current = scale.clone();
                if let Some(pool) = stage.pool {
                    for (s, f) in scale.iter_mut().zip(pool.factors(self.dims)) {
                        *s *= f;
                    }
                }
                current
            })
            .collect()
    }

    /// Total downsampling applied by the plan, per spatial axis.
    pub fn downsampling(&self) -> Vec<i64> {
        let mut total = self.dims.splat(1);
        for pool in self.stages.iter().filter_map(|stage| stage.pool) {
            for (t, f) in total.iter_mut().zip(pool.factors(self.dims)) {
                *t *= f;
            }
        }
        total
    }

    /// Check the channel arithmetic and kernel sizes of the plan.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(NetError::config("a stage plan needs at least one stage"));
        }
        if self.num_classes <= 0 || self.compress_targ <= 0 || self.n_channels <= 0 {
            return Err(NetError::config("channel counts must be positive"));
        }
        let mut expected = self.n_channels;
        for stage in &self.stages {
            if stage.in_channels != expected {
                return Err(NetError::ChannelArithmetic {
                    expected,
                    actual: stage.in_channels,
                });
            }
            if stage.out_channels <= 0 {
                return Err(NetError::config("stage widths must be positive"));
            }
            match &stage.kind {
                StageKind::Plain { kernel_size } if *kernel_size <= 0 || kernel_size % 2 == 0 => {
                    return Err(NetError::config(format!(
                        "kernel size must be positive and odd, got {kernel_size}"
                    )));
                }
                StageKind::Plain { .. } => {}
                StageKind::Pyramid { schedule } => schedule.validate(self.dims)?,
            }
            expected = stage.out_channels;
        }
        let actual = self.skip_channels();
        if actual != self.head_in_channels {
            return Err(NetError::ChannelArithmetic {
                expected: self.head_in_channels,
                actual,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
enum StageBody {
    Plain(ConvNormAct, ConvNormAct),
    Pyramid(AtrousPyramid),
}

#[derive(Debug)]
struct Stage {
    body: StageBody,
    skip: Skip,
    compression: Option<ConvNormAct>,
    pool: Option<Pool>,
    skip_scale: Vec<i64>,
}

impl Stage {
    fn new<'a>(
        vs: &Path<'a>,
        dims: SpatialDims,
        spec: &StageSpec,
        compress_targ: i64,
        skip_scale: Vec<i64>,
    ) -> Result<Self> {
        let body = match &spec.kind {
            StageKind::Plain { kernel_size } => {
                let config = ConvConfig::same(dims, *kernel_size);
                StageBody::Plain(
                    ConvNormAct::new(&(vs / "first"), spec.in_channels, spec.out_channels, config.clone()),
                    ConvNormAct::new(&(vs / "second"), spec.out_channels, spec.out_channels, config),
                )
            }
            StageKind::Pyramid { schedule } => StageBody::Pyramid(AtrousPyramid::new(
                &(vs / "pyramid"),
                dims,
                spec.in_channels,
                spec.out_channels,
                schedule,
            )?),
        };
        let compression = (spec.skip == Skip::Compressed).then(|| {
            ConvNormAct::new(&(vs / "compression"), spec.out_channels, compress_targ, ConvConfig::new(dims, 1))
        });
        Ok(Self {
            body,
            skip: spec.skip,
            compression,
            pool: spec.pool,
            skip_scale,
        })
    }

    fn skip_output(&self, xs: &Tensor, train: bool) -> Option<Tensor> {
        match (self.skip, &self.compression) {
            (Skip::None, _) => None,
            (_, Some(compression)) => Some(compression.forward_t(xs, train)),
            (_, None) => Some(xs.shallow_clone()),
        }
    }
}

impl ModuleT for Stage {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        match &self.body {
            StageBody::Plain(first, second) => second.forward_t(&first.forward_t(xs, train), train),
            StageBody::Pyramid(pyramid) => pyramid.forward_t(xs, train),
        }
    }
}

impl Parameterized for Stage {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        match &mut self.body {
            StageBody::Plain(first, second) => {
                first.visit_layers(f);
                second.visit_layers(f);
            }
            StageBody::Pyramid(pyramid) => pyramid.visit_layers(f),
        }
        if let Some(compression) = self.compression.as_mut() {
            compression.visit_layers(f);
        }
    }
}

/// Multi-scale segmentation network, planar or volumetric.
#[derive(Debug)]
pub struct SegmentationNet {
    dims: SpatialDims,
    n_channels: i64,
    aligner: ShapeAligner,
    stages: Vec<Stage>,
    head: Conv,
    upsampler: ChunkedResampler,
    resizer: ChunkedResampler,
}

impl SegmentationNet {
    /// Volumetric network, inputs [N, C, W, H, D], default `minshape` (32, 32, 4).
    pub fn volumetric<'a>(vs: &Path<'a>, config: &SegmentationConfig) -> Result<Self> {
        let minshape = config.minshape.clone().unwrap_or_else(|| vec![32, 32, 4]);
        Self::new(vs, &StagePlan::volumetric(config), &minshape, &config.resample)
    }

    /// Planar network, inputs [N, C, W, H], default `minshape` (32, 32).
    pub fn planar<'a>(vs: &Path<'a>, config: &SegmentationConfig) -> Result<Self> {
        let minshape = config.minshape.clone().unwrap_or_else(|| vec![32, 32]);
        Self::new(vs, &StagePlan::planar(config), &minshape, &config.resample)
    }

    /// Assemble a network from an arbitrary plan. The plan is validated before any layer is built.
    pub fn new<'a>(
        vs: &Path<'a>,
        plan: &StagePlan,
        minshape: &[i64],
        resample: &ResampleConfig,
    ) -> Result<Self> {
        plan.validate()?;
        let aligner = ShapeAligner::new(minshape)?;
        if aligner.dims() != plan.dims {
            return Err(NetError::shape(&plan.dims.splat(-1), minshape));
        }
        // every pooled axis must stay at least 2 wide before each pool
        let downsampling = plan.downsampling();
        if minshape.iter().zip(&downsampling).any(|(m, d)| m % d != 0) {
            return Err(NetError::config(format!(
                "minshape {minshape:?} is not a multiple of the plan downsampling {downsampling:?}"
            )));
        }
        let upsampler = ChunkedResampler::new(resample.scale_chunks, resample.mode)?;
        let resizer = ChunkedResampler::new(resample.resize_chunks, resample.mode)?;

        let stages = plan
            .stages
            .iter()
            .zip(plan.skip_scales())
            .enumerate()
            .map(|(i, (spec, skip_scale))| {
                tracing::debug!(
                    stage = i,
                    kind = ?spec.kind,
                    in_channels = spec.in_channels,
                    out_channels = spec.out_channels,
                    skip = ?spec.skip,
                    ?skip_scale,
                    "building stage"
                );
                Stage::new(&vs.sub("stages").sub(i), plan.dims, spec, plan.compress_targ, skip_scale)
            })
            .collect::<Result<Vec<_>>>()?;
        let head = Conv::new(
            &(vs / "head"),
            plan.head_in_channels,
            plan.num_classes,
            ConvConfig::new(plan.dims, 1).with_bias(true),
        );

        let mut net = Self {
            dims: plan.dims,
            n_channels: plan.n_channels,
            aligner,
            stages,
            head,
            upsampler,
            resizer,
        };
        init_parameters(&mut net);
        Ok(net)
    }

    pub fn dims(&self) -> SpatialDims {
        self.dims
    }

    pub fn aligner(&self) -> &ShapeAligner {
        &self.aligner
    }

    /// Width of the concatenation fed to the final projection.
    pub fn head_in_channels(&self) -> i64 {
        self.head.in_channels()
    }

    pub fn num_classes(&self) -> i64 {
        self.head.out_channels()
    }

    /**
    Per-voxel class scores.

    # Arguments
    - xs: Tensor - [N, n_channels, *spatial] of any spatial extent
    - train: bool - use batch statistics in the normalization layers

    # Returns
    Tensor - [N, num_classes, *spatial]
     */
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        self.forward_verbose(xs, train, false)
    }

    /// Same as [`Self::forward_t`], `verbose` logs the intermediate spatial shapes.
    pub fn forward_verbose(&self, xs: &Tensor, train: bool, verbose: bool) -> Result<Tensor> {
        let (padded, alignment) = self.aligner.align(xs)?;
        if xs.channels() != self.n_channels {
            let mut expected = xs.size();
            expected[1] = self.n_channels;
            return Err(NetError::shape(&expected, &xs.size()));
        }
        let target = padded.spatial_size();
        if verbose {
            tracing::debug!(input = ?xs.size(), padded = ?padded.size(), "aligned input");
        }

        let mut skips = vec![padded.shallow_clone()];
        let mut xs = padded;
        for (i, stage) in self.stages.iter().enumerate() {
            xs = stage.forward_t(&xs, train);
            if verbose {
                tracing::debug!(stage = i, shape = ?xs.size(), "stage output");
            }
            if let Some(skip) = stage.skip_output(&xs, train) {
                skips.push(self.restore(&skip, &stage.skip_scale, &target)?);
            }
            if let Some(pool) = stage.pool {
                xs = pool.apply(&xs, self.dims);
            }
        }

        let fused = Tensor::f_cat(&skips, 1)?;
        if verbose {
            tracing::debug!(shape = ?fused.size(), "fused skips");
        }
        Ok(alignment.crop(&self.head.forward(&fused)))
    }

    /// Bring a skip output back to the padded input resolution.
    fn restore(&self, skip: &Tensor, scale: &[i64], target: &[i64]) -> Result<Tensor> {
        let mut skip = skip.shallow_clone();
        if scale.iter().any(|&s| s != 1) {
            let scale = scale.iter().map(|&s| s as f64).collect::<Vec<_>>();
            skip = self.upsampler.upsample(&skip, &scale)?;
        }
        if skip.spatial_size() != target {
            skip = self.resizer.resize(&skip, target)?;
        }
        Ok(skip)
    }
}

impl Parameterized for SegmentationNet {
    fn visit_layers(&mut self, f: &mut dyn FnMut(LayerMut<'_>)) {
        for stage in self.stages.iter_mut() {
            stage.visit_layers(f);
        }
        self.head.visit_layers(f);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    fn small_config() -> SegmentationConfig {
        SegmentationConfig {
            n_filt_init: 4,
            growth: 2,
            compress_targ: 2,
            num_classes: 3,
            ..SegmentationConfig::volumetric()
        }
    }

    #[test]
    fn test_volumetric_skip_scales() {
        let plan = StagePlan::volumetric(&SegmentationConfig::volumetric());
        assert_eq!(
            plan.skip_scales(),
            vec![
                vec![1, 1, 1],
                vec![2, 2, 2],
                vec![4, 4, 2],
                vec![4, 4, 2],
                vec![8, 8, 4],
                vec![16, 16, 4],
            ]
        );
    }

    #[test]
    fn test_planar_skip_scales() {
        let plan = StagePlan::planar(&SegmentationConfig::planar());
        let scales = plan.skip_scales().into_iter().map(|s| s[0]).collect::<Vec<_>>();
        assert_eq!(scales, vec![1, 2, 4, 4, 8, 16]);
    }

    #[test]
    fn test_plan_channel_growth() {
        let config = SegmentationConfig::volumetric();
        let plan = StagePlan::volumetric(&config);
        let widths = plan.stages.iter().map(|s| s.out_channels).collect::<Vec<_>>();
        assert_eq!(widths, vec![16, 24, 32, 40, 48, 56]);
        assert_eq!(plan.skip_channels(), config.head_in_channels());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_channel_arithmetic_fails_fast() {
        let config = small_config();
        let mut plan = StagePlan::volumetric(&config);
        plan.stages[2].skip = Skip::Direct;
        let vs = VarStore::new(Device::Cpu);
        let net = SegmentationNet::new(&vs.root(), &plan, &[32, 32, 4], &config.resample);
        assert!(matches!(net, Err(NetError::ChannelArithmetic { .. })));
        // nothing was built
        assert!(vs.variables().is_empty());
    }

    #[test]
    fn test_broken_stage_chain() {
        let mut plan = StagePlan::planar(&SegmentationConfig::planar());
        plan.stages[3].in_channels += 1;
        assert!(matches!(
            plan.validate(),
            Err(NetError::ChannelArithmetic { expected: 64, actual: 65 })
        ));
    }

    #[test]
    fn test_minshape_must_cover_downsampling() {
        let plan = StagePlan::volumetric(&small_config());
        assert_eq!(plan.downsampling(), vec![16, 16, 4]);
        let vs = VarStore::new(Device::Cpu);
        let config = small_config().with_minshape(&[32, 32, 2]);
        assert!(matches!(
            SegmentationNet::volumetric(&vs.root(), &config),
            Err(NetError::InvalidConfig(_))
        ));
        assert!(vs.variables().is_empty());
        let config = SegmentationConfig::planar().with_minshape(&[8, 8]);
        assert!(matches!(
            SegmentationNet::planar(&vs.root(), &config),
            Err(NetError::InvalidConfig(_))
        ));
        // a wider depth block is fine
        let config = small_config().with_minshape(&[16, 16, 8]);
        assert!(SegmentationNet::volumetric(&vs.root(), &config).is_ok());
    }

    #[test]
    fn test_kernel_size_must_be_odd() {
        for kernel_size in [0, 4, -3] {
            let config = SegmentationConfig {
                kernel_size,
                ..small_config()
            };
            let plan = StagePlan::volumetric(&config);
            assert!(matches!(plan.validate(), Err(NetError::InvalidConfig(_))));
        }
        let config = SegmentationConfig {
            stem_kernel_size: 2,
            ..SegmentationConfig::planar()
        };
        assert!(StagePlan::planar(&config).validate().is_err());
    }

    #[test]
    fn test_init_reaches_every_layer() {
        let vs = VarStore::new(Device::Cpu);
        let mut net = SegmentationNet::volumetric(&vs.root(), &SegmentationConfig::volumetric()).unwrap();
        // 3 plain stages: 2 conv-norm each; 4 compressions; pyramids of 3, 3, 4 branches
        // plus projection and compression each; and the head conv
        let convs = 3 * 2 + 4 + (5 + 5 + 6) + 1;
        assert_eq!(init_parameters(&mut net), (convs, convs - 1));

        let std = f64::from(net.head.weight.std(true));
        let expected = crate::tensor_init::he_std(net.head.fan_out());
        assert!((std - expected).abs() < 0.3 * expected, "{std} vs {expected}");
        let mut norms_ok = true;
        net.visit_layers(&mut |layer| {
            if let LayerMut::Norm(norm) = layer {
                norms_ok &= f64::from(norm.weight.min()) == 1.0 && f64::from(norm.bias.abs().max()) == 0.0;
            }
        });
        assert!(norms_ok);
    }

    #[test]
    fn test_minshape_rank_must_match() {
        let vs = VarStore::new(Device::Cpu);
        let config = small_config().with_minshape(&[32, 32]);
        assert!(SegmentationNet::volumetric(&vs.root(), &config).is_err());
    }

    #[test]
    fn test_forward_small_volume() {
        let vs = VarStore::new(Device::Cpu);
        let net = SegmentationNet::volumetric(&vs.root(), &small_config()).unwrap();
        assert_eq!(net.head_in_channels(), 3 + 4 + 6 + 4 * 2);
        let xs = Tensor::randn(&[2, 3, 20, 17, 5], (Kind::Float, Device::Cpu));
        let ys = net.forward_t(&xs, false).unwrap();
        assert_eq!(ys.size(), vec![2, 3, 20, 17, 5]);
    }

    #[test]
    fn test_forward_rank_mismatch() {
        let vs = VarStore::new(Device::Cpu);
        let net = SegmentationNet::volumetric(&vs.root(), &small_config()).unwrap();
        let xs = Tensor::randn(&[1, 3, 32, 32], (Kind::Float, Device::Cpu));
        assert!(matches!(net.forward_t(&xs, false), Err(NetError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_channel_mismatch() {
        let vs = VarStore::new(Device::Cpu);
        let net = SegmentationNet::volumetric(&vs.root(), &small_config()).unwrap();
        let xs = Tensor::randn(&[1, 4, 8, 8, 4], (Kind::Float, Device::Cpu));
        assert!(matches!(net.forward_t(&xs, false), Err(NetError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forward_train_mode() {
        let vs = VarStore::new(Device::Cpu);
        let config = SegmentationConfig {
            n_filt_init: 4,
            growth: 4,
            compress_targ: 4,
            num_classes: 2,
            ..SegmentationConfig::planar()
        };
        let net = SegmentationNet::planar(&vs.root(), &config).unwrap();
        let xs = Tensor::randn(&[2, 3, 40, 33], (Kind::Float, Device::Cpu));
        let ys = net.forward_t(&xs, true).unwrap();
        assert_eq!(ys.size(), vec![2, 2, 40, 33]);
        assert!(ys.requires_grad());
    }

    #[test]
    fn test_custom_plan_without_pyramids() {
        let dims = SpatialDims::Planar;
        let plan = StagePlan {
            dims,
            n_channels: 1,
            compress_targ: 2,
            num_classes: 2,
            head_in_channels: 1 + 4 + 2,
            stages: vec![
                StageSpec {
                    kind: StageKind::Plain { kernel_size: 3 },
                    in_channels: 1,
                    out_channels: 4,
                    skip: Skip::Direct,
                    pool: Some(Pool::Full),
                },
                StageSpec {
                    kind: StageKind::Plain { kernel_size: 3 },
                    in_channels: 4,
                    out_channels: 6,
                    skip: Skip::Compressed,
                    pool: None,
                },
            ],
        };
        let vs = VarStore::new(Device::Cpu);
        let net = SegmentationNet::new(&vs.root(), &plan, &[2, 2], &ResampleConfig::default()).unwrap();
        let xs = Tensor::randn(&[3, 1, 7, 9], (Kind::Float, Device::Cpu));
        assert_eq!(net.forward_t(&xs, false).unwrap().size(), vec![3, 2, 7, 9]);
    }
}
