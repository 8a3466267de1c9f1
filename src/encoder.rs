//! Frozen feature extractor copied from the pretrained backbone.
//!
//! [`BackboneWeights`] is the immutable weight group: it exposes no mutable
//! access, and [`Encoder`] shares it behind an `Arc` so several engines (or
//! threads) can read it concurrently. The encoder is split into the stages
//! consumed by the transfer orchestrator:
//!
//! - `stem`: `block1_conv1`.
//! - `descend(level)`: the convolutions leading into a pooling boundary,
//!   Haar pooling, then the convolution that widens the pooled LL band.
//!
//! `style_features` evaluates the same weights the way the backbone itself
//! does (2×2 max pooling between blocks) and returns the `blockN_conv1`
//! activations used by the Gram style loss.
use crate::error::{Result, TransferError};
use crate::image::FeatureMap;
use crate::nn::{max_pool_2x2, Conv2d};
use crate::topology::{LayerSpec, PoolLevel, Topology, ENCODER_LAYERS};
use crate::wavelet::{haar_pool, DetailBands};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// Raw `[ky][kx][in][out]` kernel plus bias as delivered by a backbone source.
#[derive(Clone, Debug, Default)]
pub struct BackboneLayer {
    pub kernel_hwio: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Immutable convolution weights for the nine encoder layers.
#[derive(Debug)]
pub struct BackboneWeights {
    topology: Topology,
    layers: Vec<Conv2d>,
}

impl BackboneWeights {
    /// Validate and adopt already-built layers (checkpoint path).
    pub fn from_layers(topology: Topology, layers: Vec<Conv2d>) -> Result<Self> {
        check_layers(&topology.encoder_layers(), &layers)?;
        Ok(Self { topology, layers })
    }

    /// Copy the encoder layers out of a named backbone (e.g. VGG-19).
    ///
    /// Layers are looked up by their backbone names; anything beyond
    /// `block4_conv1` is ignored.
    pub fn copy_from_backbone(
        topology: Topology,
        backbone: &HashMap<String, BackboneLayer>,
    ) -> Result<Self> {
        let layers = topology
            .encoder_layers()
            .into_iter()
            .map(|spec| {
                let src = backbone.get(spec.name).ok_or_else(|| {
                    TransferError::weight_layout(format!("backbone has no layer {}", spec.name))
                })?;
                Conv2d::from_hwio(
                    spec.name,
                    spec.in_channels,
                    spec.out_channels,
                    spec.activation,
                    &src.kernel_hwio,
                    src.bias.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { topology, layers })
    }

    /// Deterministic random weights, for running without a backbone.
    pub fn seeded(topology: Topology, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layers = topology
            .encoder_layers()
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

    pub fn layer(&self, name: &str) -> Option<&Conv2d> {
        self.layers.iter().find(|l| l.name() == name)
    }
}

pub(crate) fn check_layers(specs: &[LayerSpec], layers: &[Conv2d]) -> Result<()> {
    if specs.len() != layers.len() {
        return Err(TransferError::weight_layout(format!(
            "expected {} layers, got {}",
            specs.len(),
            layers.len()
        )));
    }
    for (spec, layer) in specs.iter().zip(layers) {
        if layer.name() != spec.name
            || layer.in_channels() != spec.in_channels
            || layer.out_channels() != spec.out_channels
            || layer.activation() != spec.activation
        {
            return Err(TransferError::weight_layout(format!(
                "layer {} ({}→{}) does not match {} ({}→{})",
                layer.name(),
                layer.in_channels(),
                layer.out_channels(),
                spec.name,
                spec.in_channels,
                spec.out_channels
            )));
        }
    }
    Ok(())
}

pub(crate) fn run_layers(layers: &[Conv2d], mut x: FeatureMap) -> Result<FeatureMap> {
    for layer in layers {
        x = layer.forward(&x)?;
    }
    Ok(x)
}

/// Output of a full encoder pass without any transform.
#[derive(Clone, Debug)]
pub struct Encoded {
    pub bottleneck: FeatureMap,
    /// Detail bands indexed by [`PoolLevel::index`].
    pub skips: [DetailBands; 3],
}

/// Stage functions over shared, frozen backbone weights.
#[derive(Clone, Debug)]
pub struct Encoder {
    weights: Arc<BackboneWeights>,
}

impl Encoder {
    pub fn new(weights: Arc<BackboneWeights>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &Arc<BackboneWeights> {
        &self.weights
    }

    pub fn topology(&self) -> Topology {
        self.weights.topology
    }

    fn run(&self, range: Range<usize>, x: FeatureMap) -> Result<FeatureMap> {
        run_layers(&self.weights.layers[range], x)
    }

    /// `block1_conv1` on an RGB image.
    pub fn stem(&self, image: &FeatureMap) -> Result<FeatureMap> {
        self.run(0..1, image.clone())
    }

    /// Convolutions into `level`, Haar pooling, and the widening convolution
    /// on the LL band. Returns the widened map and the captured detail.
    pub fn descend(&self, level: PoolLevel, x: FeatureMap) -> Result<(FeatureMap, DetailBands)> {
        let pre = self.run(level.encoder_pre_pool(), x)?;
        let (ll, skip) = haar_pool(&pre)?;
        let post = self.run(level.encoder_post_pool(), ll)?;
        Ok((post, skip))
    }

    /// Full pass: stem and the three pooling boundaries.
    pub fn encode(&self, image: &FeatureMap) -> Result<Encoded> {
        let x = self.stem(image)?;
        let (x, s0) = self.descend(PoolLevel::First, x)?;
        let (x, s1) = self.descend(PoolLevel::Second, x)?;
        let (x, s2) = self.descend(PoolLevel::Third, x)?;
        Ok(Encoded {
            bottleneck: x,
            skips: [s0, s1, s2],
        })
    }

    /// Backbone activations `block1_conv1 … block4_conv1`, with max pooling
    /// between blocks as in the original classifier.
    pub fn style_features(&self, image: &FeatureMap) -> Result<Vec<FeatureMap>> {
        let layers = &self.weights.layers;
        let mut outputs = Vec::with_capacity(4);
        let mut x = image.clone();
        for (i, layer) in layers.iter().enumerate() {
            let name = ENCODER_LAYERS[i];
            if name.ends_with("_conv1") && i > 0 {
                x = max_pool_2x2(&x);
            }
            x = layer.forward(&x)?;
            if name.ends_with("_conv1") {
                outputs.push(x.clone());
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::FeatureView;

    fn tiny() -> Encoder {
        Encoder::new(Arc::new(BackboneWeights::seeded(Topology::new(2), 11)))
    }

    #[test]
    fn encode_produces_pyramid_shapes() {
        let img = FeatureMap::filled(16, 8, &[10.0, 120.0, 240.0]);
        let enc = tiny().encode(&img).unwrap();
        assert_eq!(enc.bottleneck.shape(), (2, 1, 16));
        assert_eq!(enc.skips[0].lh.shape(), (8, 4, 2));
        assert_eq!(enc.skips[1].original_size, (8, 4));
        assert_eq!(enc.skips[2].hh.shape(), (2, 1, 8));
    }

    #[test]
    fn style_features_cover_four_blocks() {
        let img = FeatureMap::filled(8, 8, &[1.0, 2.0, 3.0]);
        let feats = tiny().style_features(&img).unwrap();
        let shapes: Vec<_> = feats.iter().map(|f| f.shape()).collect();
        assert_eq!(shapes, vec![(8, 8, 2), (4, 4, 4), (2, 2, 8), (1, 1, 16)]);
    }

    #[test]
    fn backbone_copy_requires_every_layer() {
        let topo = Topology::new(1);
        let mut backbone = HashMap::new();
        for spec in topo.encoder_layers().into_iter().take(8) {
            backbone.insert(
                spec.name.to_string(),
                BackboneLayer {
                    kernel_hwio: vec![0.1; 9 * spec.in_channels * spec.out_channels],
                    bias: vec![0.0; spec.out_channels],
                },
            );
        }
        let err = BackboneWeights::copy_from_backbone(topo, &backbone).unwrap_err();
        assert!(err.to_string().contains("block4_conv1"), "{err}");
    }

    #[test]
    fn from_layers_rejects_wrong_widths() {
        let other = BackboneWeights::seeded(Topology::new(2), 1);
        let layers = other.layers().to_vec();
        assert!(BackboneWeights::from_layers(Topology::new(4), layers).is_err());
    }
}
