//! Training objectives for the decoder.
//!
//! The decoder is trained to reconstruct its input; the Gram term compares
//! backbone activations of the generated image with those of the target so
//! texture statistics survive the round trip. Gradient-based optimisation
//! lives outside this crate; these functions only evaluate the objective.
use crate::encoder::Encoder;
use crate::error::{Result, TransferError};
use crate::image::{FeatureMap, FeatureView};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// `F Fᵀ / (H·W)` where `F` is the `C × HW` matrix of the map.
pub fn gram_matrix(map: &FeatureMap) -> DMatrix<f32> {
    let f = DMatrix::from_column_slice(map.c, map.pixel_count(), &map.data);
    let n = map.pixel_count().max(1) as f32;
    (&f * f.transpose()) / n
}

/// Mean over `block1_conv1 … block4_conv1` of the mean squared difference
/// between the Gram matrices of `target` and `generated`.
pub fn gram_loss(encoder: &Encoder, target: &FeatureMap, generated: &FeatureMap) -> Result<f32> {
    ensure_same_shape("gram_loss", target, generated)?;
    let target_feats = encoder.style_features(target)?;
    let generated_feats = encoder.style_features(generated)?;
    let layers = target_feats.len().max(1) as f32;
    let total: f32 = target_feats
        .iter()
        .zip(&generated_feats)
        .map(|(t, g)| {
            let diff = gram_matrix(t) - gram_matrix(g);
            diff.map(|v| v * v).mean()
        })
        .sum();
    Ok(total / layers)
}

/// Pixel-wise mean squared error.
pub fn reconstruction_loss(target: &FeatureMap, generated: &FeatureMap) -> Result<f32> {
    ensure_same_shape("reconstruction_loss", target, generated)?;
    let n = target.data.len().max(1) as f64;
    let sum: f64 = target
        .data
        .iter()
        .zip(&generated.data)
        .map(|(&a, &b)| {
            let d = (a - b) as f64;
            d * d
        })
        .sum();
    Ok((sum / n) as f32)
}

fn ensure_same_shape(stage: &str, a: &FeatureMap, b: &FeatureMap) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(TransferError::ShapeMismatch {
            stage: stage.to_string(),
            content: a.shape(),
            style: b.shape(),
        });
    }
    Ok(())
}

/// Weighting of the training objective.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingLoss {
    pub gram_loss_weight: f32,
}

impl Default for TrainingLoss {
    fn default() -> Self {
        Self {
            gram_loss_weight: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LossBreakdown {
    pub reconstruction: f32,
    pub gram: f32,
    pub total: f32,
}

impl TrainingLoss {
    pub fn evaluate(
        &self,
        encoder: &Encoder,
        target: &FeatureMap,
        generated: &FeatureMap,
    ) -> Result<LossBreakdown> {
        let reconstruction = reconstruction_loss(target, generated)?;
        let gram = gram_loss(encoder, target, generated)?;
        Ok(LossBreakdown {
            reconstruction,
            gram,
            total: reconstruction + self.gram_loss_weight * gram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BackboneWeights;
    use crate::topology::Topology;
    use std::sync::Arc;

    fn encoder() -> Encoder {
        Encoder::new(Arc::new(BackboneWeights::seeded(Topology::new(2), 3)))
    }

    fn gradient(h: usize, w: usize) -> FeatureMap {
        let mut map = FeatureMap::new(h, w, 3);
        for y in 0..h {
            for x in 0..w {
                map.set(y, x, 0, (x * 16) as f32);
                map.set(y, x, 1, (y * 16) as f32);
                map.set(y, x, 2, 100.0);
            }
        }
        map
    }

    #[test]
    fn gram_of_constant_map() {
        let map = FeatureMap::filled(2, 2, &[1.0, 2.0]);
        let g = gram_matrix(&map);
        assert_eq!(g.shape(), (2, 2));
        assert!((g[(0, 0)] - 1.0).abs() < 1e-6);
        assert!((g[(0, 1)] - 2.0).abs() < 1e-6);
        assert!((g[(1, 1)] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn identical_images_have_zero_loss() {
        let img = gradient(8, 8);
        let enc = encoder();
        assert_eq!(gram_loss(&enc, &img, &img).unwrap(), 0.0);
        let parts = TrainingLoss::default().evaluate(&enc, &img, &img).unwrap();
        assert_eq!(parts.total, 0.0);
    }

    #[test]
    fn different_images_have_positive_loss() {
        let enc = encoder();
        let a = gradient(8, 8);
        let b = FeatureMap::filled(8, 8, &[200.0, 10.0, 40.0]);
        assert!(gram_loss(&enc, &a, &b).unwrap() > 0.0);
        let weighted = TrainingLoss {
            gram_loss_weight: 0.0,
        }
        .evaluate(&enc, &a, &b)
        .unwrap();
        assert_eq!(weighted.total, weighted.reconstruction);
    }

    #[test]
    fn reconstruction_loss_rejects_shape_mismatch() {
        let a = FeatureMap::new(8, 8, 3);
        let b = FeatureMap::new(8, 4, 3);
        assert!(reconstruction_loss(&a, &b).is_err());
        let c = FeatureMap::filled(8, 8, &[2.0, 2.0, 2.0]);
        assert!((reconstruction_loss(&a, &c).unwrap() - 4.0).abs() < 1e-6);
    }
}
