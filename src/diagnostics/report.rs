use super::features::FeatureStats;
use super::timing::TimingBreakdown;
use crate::wct::RankInfo;
use serde::Serialize;

/// Input shape and blend factor of the call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub alpha: f32,
    pub skip_alpha: f32,
}

/// One whitening and coloring invocation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WctCall {
    pub stage: String,
    #[serde(flatten)]
    pub rank: RankInfo,
}

/// End-to-end trace of a transfer call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub features: Vec<FeatureStats>,
    pub wct_calls: Vec<WctCall>,
}

impl TransferReport {
    pub(crate) fn new(input: InputDescriptor) -> Self {
        Self {
            input,
            timings: TimingBreakdown::default(),
            features: Vec::new(),
            wct_calls: Vec::new(),
        }
    }

    /// Calls whose covariance lost rank because of the eigenvalue floor.
    pub fn truncated_calls(&self) -> impl Iterator<Item = &WctCall> {
        self.wct_calls.iter().filter(|c| {
            c.rank.content_rank < c.rank.channels || c.rank.style_rank < c.rank.channels
        })
    }
}
