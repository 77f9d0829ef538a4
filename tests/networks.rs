use atrous_seg::autoencoder::AutoencoderNet;
use atrous_seg::backbone::SegmentationNet;
use atrous_seg::config::{AutoencoderConfig, SegmentationConfig};
use atrous_seg::NetError;
use tch::{nn::VarStore, Device, Kind, Tensor};

#[test]
fn volumetric_output_matches_input_extent() {
    let vs = VarStore::new(Device::Cpu);
    let config = SegmentationConfig::volumetric().with_minshape(&[32, 32, 4]);
    let net = SegmentationNet::volumetric(&vs.root(), &config).unwrap();
    assert_eq!(net.aligner().padded_shape(&[30, 30, 3]), vec![32, 32, 4]);
    assert_eq!(net.head_in_channels(), config.head_in_channels());

    let xs = Tensor::randn(&[2, 3, 30, 30, 3], (Kind::Float, Device::Cpu));
    let ys = net.forward_t(&xs, false).unwrap();
    assert_eq!(ys.size(), vec![2, config.num_classes, 30, 30, 3]);
}

#[test]
fn planar_output_matches_input_extent() {
    let vs = VarStore::new(Device::Cpu);
    let config = SegmentationConfig {
        num_classes: 5,
        ..SegmentationConfig::planar()
    };
    let net = SegmentationNet::planar(&vs.root(), &config).unwrap();
    assert_eq!(net.aligner().padded_shape(&[65, 33]), vec![96, 64]);

    let xs = Tensor::randn(&[1, 3, 65, 33], (Kind::Float, Device::Cpu));
    let ys = net.forward_t(&xs, false).unwrap();
    assert_eq!(ys.size(), vec![1, 5, 65, 33]);
}

#[test]
fn wrong_channel_count_is_rejected() {
    let vs = VarStore::new(Device::Cpu);
    let net = SegmentationNet::planar(&vs.root(), &SegmentationConfig::planar()).unwrap();
    let xs = Tensor::randn(&[1, 1, 32, 32], (Kind::Float, Device::Cpu));
    assert!(matches!(net.forward_t(&xs, false), Err(NetError::ShapeMismatch { .. })));
}

#[test]
fn verbose_forward_logs_and_matches_forward() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("atrous_seg=debug")
        .with_test_writer()
        .try_init();
    let vs = VarStore::new(Device::Cpu);
    let config = SegmentationConfig {
        n_filt_init: 4,
        growth: 2,
        compress_targ: 2,
        ..SegmentationConfig::volumetric()
    };
    let net = SegmentationNet::volumetric(&vs.root(), &config).unwrap();
    let xs = Tensor::randn(&[1, 3, 17, 9, 5], (Kind::Float, Device::Cpu));
    let quiet = net.forward_t(&xs, false).unwrap();
    let verbose = net.forward_verbose(&xs, false, true).unwrap();
    assert!(quiet.allclose(&verbose, 1e-5, 1e-6, false));
}

#[test]
fn autoencoder_reconstructs_and_encodes() {
    let vs = VarStore::new(Device::Cpu);
    let config = AutoencoderConfig::new(&[64, 64]);
    let net = AutoencoderNet::new(&vs.root(), &config).unwrap();
    let xs = Tensor::rand(&[4, 3, 64, 64], (Kind::Float, Device::Cpu));
    let (recon, latent) = net.forward_t(&xs, false).unwrap();
    assert_eq!(recon.size(), vec![4, 3, 64, 64]);
    assert_eq!(latent.size(), vec![4, config.n_z]);
}
