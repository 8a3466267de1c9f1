use crate::image::{FeatureMap, FeatureView};
use serde::{Deserialize, Serialize};

/// Shape and first/second moments of one feature map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStats {
    pub stage: String,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub mean: f32,
    pub std: f32,
}

impl FeatureStats {
    pub fn from_map(stage: impl Into<String>, map: &FeatureMap) -> Self {
        let (sum, sum_sq) = map.rows().fold((0.0f64, 0.0f64), |acc, row| {
            row.iter()
                .fold(acc, |(s, sq), &v| (s + v as f64, sq + (v as f64) * (v as f64)))
        });
        let n = map.data.len().max(1) as f64;
        let mean = sum / n;
        let var = (sum_sq / n - mean * mean).max(0.0);
        Self {
            stage: stage.into(),
            height: map.h,
            width: map.w,
            channels: map.c,
            mean: mean as f32,
            std: var.sqrt() as f32,
        }
    }
}
