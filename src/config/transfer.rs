use crate::checkpoint::DEFAULT_CHECKPOINT;
use crate::error::{Result, TransferError};
use crate::image::{ChannelOrder, Preprocess};
use crate::topology::Topology;
use crate::transfer::TransferParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TransferToolConfig {
    pub content: PathBuf,
    pub style: PathBuf,
    #[serde(default)]
    pub preprocess: Preprocess,
    #[serde(default)]
    pub channel_order: ChannelOrder,
    #[serde(default)]
    pub params: TransferParams,
    /// Checkpoint path or `"pretrained"`; omitted means the default path.
    #[serde(default)]
    pub checkpoint: Option<String>,
    #[serde(default)]
    pub topology: Topology,
    /// Seed of the fallback weights used when no checkpoint loads.
    #[serde(default)]
    pub seed: u64,
    /// Directory searched for `pretrained.bin`.
    #[serde(default)]
    pub weight_cache: Option<PathBuf>,
    pub output: TransferOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct TransferOutputConfig {
    pub image: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

impl TransferToolConfig {
    /// Weight argument handed to `StyleTransfer::load_weights`.
    pub fn weight_name(&self) -> &str {
        self.checkpoint.as_deref().unwrap_or(DEFAULT_CHECKPOINT)
    }
}

pub fn load_config(path: &Path) -> Result<TransferToolConfig> {
    let data = fs::read_to_string(path).map_err(|e| {
        TransferError::config(format!("failed to read config {}: {e}", path.display()))
    })?;
    let config: TransferToolConfig = serde_json::from_str(&data).map_err(|e| {
        TransferError::config(format!("failed to parse config {}: {e}", path.display()))
    })?;
    let alphas = std::iter::once(config.params.alpha).chain(config.params.skip_alpha);
    for alpha in alphas {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(TransferError::InvalidAlpha(alpha));
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{"content": "c.png", "style": "s.png", "output": {"image": "out.png"}}"#,
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.preprocess.width, 512);
        assert_eq!(cfg.channel_order, ChannelOrder::Bgr);
        assert_eq!(cfg.params, TransferParams::default());
        assert_eq!(cfg.topology, Topology::default());
        assert_eq!(cfg.weight_name(), DEFAULT_CHECKPOINT);
        assert!(cfg.output.report_json.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{
                "content": "c.png",
                "style": "s.png",
                "channel_order": "rgb",
                "params": {"alpha": 0.5, "skip_alpha": 0.2, "wct": {"eigen_floor": 0.001}},
                "checkpoint": "pretrained",
                "topology": {"base_channels": 8},
                "output": {"image": "out.png", "report_json": "report.json"}
            }"#,
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.channel_order, ChannelOrder::Rgb);
        assert_eq!(cfg.params.alpha, 0.5);
        assert_eq!(cfg.params.skip_alpha, Some(0.2));
        assert_eq!(cfg.params.wct.eigen_floor, 0.001);
        assert_eq!(cfg.weight_name(), "pretrained");
        assert_eq!(cfg.topology.base_channels, 8);
    }

    #[test]
    fn out_of_range_alpha_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        for params in [r#"{"alpha": 1.5}"#, r#"{"alpha": 0.5, "skip_alpha": -0.1}"#] {
            let path = dir.path().join("cfg.json");
            fs::write(
                &path,
                format!(
                    r#"{{"content": "c.png", "style": "s.png", "params": {params}, "output": {{"image": "o.png"}}}}"#
                ),
            )
            .unwrap();
            assert!(
                matches!(load_config(&path), Err(TransferError::InvalidAlpha(_))),
                "{params}"
            );
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config(Path::new("/nonexistent/cfg.json")).unwrap_err();
        assert!(matches!(err, TransferError::Config(_)));
    }
}
