//! Fixed layer topology of the encoder/decoder pair.
//!
//! The encoder mirrors VGG-19 from `block1_conv1` through `block4_conv1`;
//! wavelet pooling follows `block1_conv2`, `block2_conv2` and
//! `block3_conv4`. The decoder walks the same names in reverse and halves
//! the channel count right before each unpooling. Channel widths are
//! `base, 2·base, 4·base, 8·base` (64/128/256/512 for the VGG backbone).
use crate::nn::Activation;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Backbone layer names in evaluation order.
pub const ENCODER_LAYERS: [&str; 9] = [
    "block1_conv1",
    "block1_conv2",
    "block2_conv1",
    "block2_conv2",
    "block3_conv1",
    "block3_conv2",
    "block3_conv3",
    "block3_conv4",
    "block4_conv1",
];

/// Decoder layer names in evaluation order.
pub const DECODER_LAYERS: [&str; 9] = [
    "block4_conv1_decode",
    "block3_conv4_decode",
    "block3_conv3_decode",
    "block3_conv2_decode",
    "block3_conv1_decode",
    "block2_conv2_decode",
    "block2_conv1_decode",
    "block1_conv2_decode",
    "output",
];

/// Suffix distinguishing the copied backbone layers inside a checkpoint.
pub const ENCODE_SUFFIX: &str = "_encode";

/// Channel width of the backbone (VGG-19 uses 64).
pub const VGG_BASE_CHANNELS: usize = 64;

/// One of the three wavelet pooling boundaries, shallow to deep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolLevel {
    First,
    Second,
    Third,
}

impl PoolLevel {
    pub const ALL: [PoolLevel; 3] = [PoolLevel::First, PoolLevel::Second, PoolLevel::Third];

    pub fn index(self) -> usize {
        match self {
            PoolLevel::First => 0,
            PoolLevel::Second => 1,
            PoolLevel::Third => 2,
        }
    }

    /// Encoder layers evaluated before pooling at this boundary.
    pub(crate) fn encoder_pre_pool(self) -> Range<usize> {
        match self {
            PoolLevel::First => 1..2,
            PoolLevel::Second => 3..4,
            PoolLevel::Third => 5..8,
        }
    }

    /// Encoder layers evaluated on the pooled LL band.
    pub(crate) fn encoder_post_pool(self) -> Range<usize> {
        match self {
            PoolLevel::First => 2..3,
            PoolLevel::Second => 4..5,
            PoolLevel::Third => 8..9,
        }
    }

    /// Decoder layer that halves channels before unpooling at this boundary.
    pub(crate) fn decoder_expand(self) -> Range<usize> {
        match self {
            PoolLevel::Third => 0..1,
            PoolLevel::Second => 4..5,
            PoolLevel::First => 6..7,
        }
    }

    /// Decoder layers evaluated right after unpooling at this boundary.
    pub(crate) fn decoder_refine(self) -> Range<usize> {
        match self {
            PoolLevel::Third => 1..4,
            PoolLevel::Second => 5..6,
            PoolLevel::First => 7..8,
        }
    }
}

/// Shape of a single convolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSpec {
    pub name: &'static str,
    pub in_channels: usize,
    pub out_channels: usize,
    pub activation: Activation,
}

/// Width configuration of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    /// Channels of the first pyramid level; deeper levels double it.
    pub base_channels: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            base_channels: VGG_BASE_CHANNELS,
        }
    }
}

impl Topology {
    pub fn new(base_channels: usize) -> Self {
        Self {
            base_channels: base_channels.max(1),
        }
    }

    /// Channel count of pyramid level `level` (0-based, 0..4).
    pub fn level_channels(&self, level: usize) -> usize {
        self.base_channels << level
    }

    pub fn encoder_layers(&self) -> Vec<LayerSpec> {
        let c = |l| self.level_channels(l);
        let widths = [
            (3, c(0)),
            (c(0), c(0)),
            (c(0), c(1)),
            (c(1), c(1)),
            (c(1), c(2)),
            (c(2), c(2)),
            (c(2), c(2)),
            (c(2), c(2)),
            (c(2), c(3)),
        ];
        ENCODER_LAYERS
            .iter()
            .zip(widths)
            .map(|(&name, (in_channels, out_channels))| LayerSpec {
                name,
                in_channels,
                out_channels,
                activation: Activation::Relu,
            })
            .collect()
    }

    pub fn decoder_layers(&self) -> Vec<LayerSpec> {
        let c = |l| self.level_channels(l);
        let widths = [
            (c(3), c(2)),
            (c(2), c(2)),
            (c(2), c(2)),
            (c(2), c(2)),
            (c(2), c(1)),
            (c(1), c(1)),
            (c(1), c(0)),
            (c(0), c(0)),
            (c(0), 3),
        ];
        DECODER_LAYERS
            .iter()
            .zip(widths)
            .map(|(&name, (in_channels, out_channels))| LayerSpec {
                name,
                in_channels,
                out_channels,
                activation: if name == "output" {
                    Activation::Linear
                } else {
                    Activation::Relu
                },
            })
            .collect()
    }
}
