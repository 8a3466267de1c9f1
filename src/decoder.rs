//! Trainable decoder mirroring the encoder.
//!
//! Stages, deep to shallow, for each pooling boundary:
//! - `expand(level)`: the convolution halving the channel count so the
//!   stream matches the stored detail bands;
//! - `merge(level)`: Haar unpooling with the stored detail, followed by the
//!   refinement convolutions at the restored resolution.
//!
//! `project` is the final linear convolution to three channels. Its output is
//! unbounded; clipping belongs to the orchestrator.
use crate::encoder::{check_layers, run_layers, Encoded};
use crate::error::Result;
use crate::image::FeatureMap;
use crate::nn::Conv2d;
use crate::topology::{PoolLevel, Topology};
use crate::wavelet::{haar_unpool, DetailBands};
use rand::SeedableRng;
use rand_pcg::Pcg32;

#[derive(Clone, Debug)]
pub struct Decoder {
    topology: Topology,
    layers: Vec<Conv2d>,
}

impl Decoder {
    /// Validate and adopt layers read from a checkpoint.
    pub fn from_layers(topology: Topology, layers: Vec<Conv2d>) -> Result<Self> {
        check_layers(&topology.decoder_layers(), &layers)?;
        Ok(Self { topology, layers })
    }

    /// Untrained decoder with Glorot-uniform kernels and zero bias.
    pub fn seeded(topology: Topology, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layers = topology
            .decoder_layers()
            .into_iter()
            .map(|spec| {
                Conv2d::seeded(
                    spec.name,
                    spec.in_channels,
                    spec.out_channels,
                    spec.activation,
                    &mut rng,
                )
            })
            .collect();
        Self { topology, layers }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn layers(&self) -> &[Conv2d] {
        &self.layers
    }

    /// Mutable weights, reserved for the training routine.
    pub fn layers_mut(&mut self) -> &mut [Conv2d] {
        &mut self.layers
    }

    pub fn expand(&self, level: PoolLevel, x: FeatureMap) -> Result<FeatureMap> {
        run_layers(&self.layers[level.decoder_expand()], x)
    }

    pub fn merge(&self, level: PoolLevel, x: &FeatureMap, skip: &DetailBands) -> Result<FeatureMap> {
        let up = haar_unpool(x, skip)?;
        run_layers(&self.layers[level.decoder_refine()], up)
    }

    pub fn project(&self, x: FeatureMap) -> Result<FeatureMap> {
        let last = self.layers.len() - 1;
        run_layers(&self.layers[last..], x)
    }

    /// Plain reconstruction of an encoder pass, without any transform.
    pub fn decode(&self, encoded: &Encoded) -> Result<FeatureMap> {
        let mut x = encoded.bottleneck.clone();
        for level in PoolLevel::ALL.into_iter().rev() {
            x = self.expand(level, x)?;
            x = self.merge(level, &x, &encoded.skips[level.index()])?;
        }
        self.project(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{BackboneWeights, Encoder};
    use crate::image::FeatureView;
    use std::sync::Arc;

    #[test]
    fn decode_restores_input_resolution() {
        let topo = Topology::new(2);
        let encoder = Encoder::new(Arc::new(BackboneWeights::seeded(topo, 5)));
        let decoder = Decoder::seeded(topo, 6);
        let img = FeatureMap::filled(8, 16, &[50.0, 60.0, 70.0]);
        let out = decoder.decode(&encoder.encode(&img).unwrap()).unwrap();
        assert_eq!(out.shape(), (8, 16, 3));
    }

    #[test]
    fn seeded_decoder_is_reproducible() {
        let topo = Topology::new(1);
        assert_eq!(
            Decoder::seeded(topo, 9).layers(),
            Decoder::seeded(topo, 9).layers()
        );
        assert_ne!(
            Decoder::seeded(topo, 9).layers(),
            Decoder::seeded(topo, 10).layers()
        );
    }
}
