use super::covariance::{ChannelStats, CovarianceEigen};
use super::options::WctOptions;
use crate::error::{Result, TransferError};
use crate::image::{FeatureMap, FeatureView};
use serde::Serialize;

/// Retained covariance rank of one WCT call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    pub channels: usize,
    pub content_rank: usize,
    pub style_rank: usize,
}

/// Whiten `content` and recolour it with the statistics of `style`.
///
/// The two maps must share a channel count; their spatial sizes may differ.
/// `alpha = 0` returns `content` unchanged, `alpha = 1` the full transform.
pub fn whiten_and_color(
    content: &FeatureMap,
    style: &FeatureMap,
    alpha: f32,
    options: &WctOptions,
) -> Result<FeatureMap> {
    whiten_and_color_traced(content, style, alpha, options).map(|(out, _)| out)
}

/// Same as [`whiten_and_color`], also reporting the retained ranks.
pub fn whiten_and_color_traced(
    content: &FeatureMap,
    style: &FeatureMap,
    alpha: f32,
    options: &WctOptions,
) -> Result<(FeatureMap, RankInfo)> {
    if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
        return Err(TransferError::InvalidAlpha(alpha));
    }
    if content.c != style.c {
        return Err(TransferError::ChannelMismatch {
            stage: "wct".to_string(),
            expected: content.c,
            actual: style.c,
        });
    }
    let mut info = RankInfo {
        channels: content.c,
        ..Default::default()
    };
    if alpha == 0.0 || content.pixel_count() == 0 || style.pixel_count() == 0 {
        return Ok((content.clone(), info));
    }

    let content_stats = ChannelStats::from_map(content);
    let style_stats = ChannelStats::from_map(style);
    let content_eig = CovarianceEigen::decompose(content_stats.covariance(), options);
    let style_eig = CovarianceEigen::decompose(style_stats.covariance(), options);
    info.content_rank = content_eig.rank();
    info.style_rank = style_eig.rank();
    if info.content_rank < info.channels || info.style_rank < info.channels {
        log::debug!(
            "wct: truncated covariance rank (content {}/{}, style {}/{})",
            info.content_rank,
            info.channels,
            info.style_rank,
            info.channels
        );
    }

    let transform = (style_eig.coloring() * content_eig.whitening()).map(|v| v as f32);
    let mut colored = transform * &content_stats.centered;
    for mut col in colored.column_iter_mut() {
        col += &style_stats.mean;
    }

    let beta = 1.0 - alpha;
    let mut out = content.clone();
    for (dst, &t) in out.data.iter_mut().zip(colored.as_slice()) {
        *dst = alpha * t + beta * *dst;
    }
    Ok((out, info))
}
