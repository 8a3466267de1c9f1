//! Parameters of a transfer call.
//!
//! Defaults reproduce full-strength photorealistic transfer on inputs in the
//! `[0, 255]` range. Every field deserializes from the demo config with
//! missing keys falling back to these defaults.
use crate::wct::WctOptions;
use serde::{Deserialize, Serialize};

/// Valid output range; the decoder's linear projection is clipped into it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub min: f32,
    pub max: f32,
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 255.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferParams {
    /// Blend factor of the main feature stream, in `[0, 1]`.
    pub alpha: f32,
    /// Blend factor of the detail skip bands; `None` uses `alpha`.
    pub skip_alpha: Option<f32>,
    pub wct: WctOptions,
    pub clip: ClipRange,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            skip_alpha: None,
            wct: WctOptions::default(),
            clip: ClipRange::default(),
        }
    }
}

impl TransferParams {
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_skip_alpha(mut self, skip_alpha: Option<f32>) -> Self {
        self.skip_alpha = skip_alpha;
        self
    }

    pub fn with_wct(mut self, wct: WctOptions) -> Self {
        self.wct = wct;
        self
    }

    /// Skip-band blend factor for a call made with `alpha`.
    pub(crate) fn resolve_skip_alpha(&self, alpha: f32) -> f32 {
        self.skip_alpha.unwrap_or(alpha)
    }
}
