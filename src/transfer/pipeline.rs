//! The [`StyleTransfer`] engine: weights plus the staged transfer sequence.
//!
//! Typical usage:
//! ```no_run
//! use wct_transfer::{FeatureMap, StyleTransfer, Topology, TransferParams};
//!
//! # fn example(content: FeatureMap, style: FeatureMap) -> wct_transfer::Result<()> {
//! let mut engine = StyleTransfer::untrained(Topology::default(), 0, TransferParams::default());
//! engine.load_weights("pretrained");
//! let output = engine.transfer(&content, &style, 1.0)?;
//! assert_eq!(output.c, 3);
//! # Ok(())
//! # }
//! ```
use super::params::TransferParams;
use crate::checkpoint::{Checkpoint, WeightSource, DEFAULT_CHECKPOINT, PRETRAINED};
use crate::decoder::Decoder;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{FeatureStats, InputDescriptor, TransferReport, WctCall};
use crate::encoder::{BackboneWeights, Encoder};
use crate::error::{Result, TransferError};
use crate::image::{FeatureMap, FeatureView};
use crate::topology::{PoolLevel, Topology};
use crate::wavelet::DetailBands;
use crate::wct::whiten_and_color_traced;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Photorealistic style transfer engine.
///
/// Construct once and share: `transfer` takes `&self`, holds no interior
/// mutability and can run concurrently from several threads. Replacing or
/// training weights requires `&mut self`.
pub struct StyleTransfer {
    encoder: Encoder,
    decoder: Decoder,
    params: TransferParams,
    checkpoint_path: PathBuf,
    weight_source: Option<Arc<dyn WeightSource>>,
}

/// Content and style streams threaded through the stages side by side.
struct Streams {
    content: FeatureMap,
    style: FeatureMap,
}

impl StyleTransfer {
    /// Assemble an engine from a frozen backbone and a decoder.
    pub fn new(
        backbone: Arc<BackboneWeights>,
        decoder: Decoder,
        params: TransferParams,
    ) -> Result<Self> {
        if backbone.topology() != decoder.topology() {
            return Err(TransferError::weight_layout(format!(
                "encoder topology {:?} differs from decoder topology {:?}",
                backbone.topology(),
                decoder.topology()
            )));
        }
        Ok(Self {
            encoder: Encoder::new(backbone),
            decoder,
            params,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT),
            weight_source: None,
        })
    }

    /// Engine with seeded random weights for both halves.
    pub fn untrained(topology: Topology, seed: u64, params: TransferParams) -> Self {
        Self {
            encoder: Encoder::new(Arc::new(BackboneWeights::seeded(topology, seed))),
            decoder: Decoder::seeded(topology, seed.wrapping_add(1)),
            params,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT),
            weight_source: None,
        }
    }

    /// Default path used by `load_weights("")` and `save_weights(None)`.
    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    /// Collaborator resolving [`PRETRAINED`] to a local file.
    pub fn with_weight_source(mut self, source: Arc<dyn WeightSource>) -> Self {
        self.weight_source = Some(source);
        self
    }

    pub fn params(&self) -> &TransferParams {
        &self.params
    }

    pub fn set_params(&mut self, params: TransferParams) {
        self.params = params;
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Exclusive access to the trainable half.
    pub fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    pub fn topology(&self) -> Topology {
        self.encoder.topology()
    }

    /// Transfer the style of `style` onto `content` with blend factor `alpha`.
    ///
    /// Both inputs must be 3-channel maps of identical size with height and
    /// width divisible by 8. The result has the same size, three channels and
    /// values inside the configured clip range.
    pub fn transfer(&self, content: &FeatureMap, style: &FeatureMap, alpha: f32) -> Result<FeatureMap> {
        self.transfer_with_report(content, style, alpha)
            .map(|(out, _)| out)
    }

    /// Run the transfer and capture timings and per-stage statistics.
    pub fn transfer_with_report(
        &self,
        content: &FeatureMap,
        style: &FeatureMap,
        alpha: f32,
    ) -> Result<(FeatureMap, TransferReport)> {
        let total_start = Instant::now();
        check_inputs(content, style)?;
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(TransferError::InvalidAlpha(alpha));
        }
        let skip_alpha = self.params.resolve_skip_alpha(alpha);
        let mut report = TransferReport::new(InputDescriptor {
            width: content.w,
            height: content.h,
            alpha,
            skip_alpha,
        });
        let mut run = Run {
            engine: self,
            alpha,
            skip_alpha,
            report: &mut report,
        };

        // ===== Encode ===== //
        let mut streams = run.stage("encode/stem", |e| {
            Ok(Streams {
                content: e.encoder.stem(content)?,
                style: e.encoder.stem(style)?,
            })
        })?;
        run.wct("encode/stem", &mut streams)?;

        let mut content_skips: Vec<DetailBands> = Vec::with_capacity(3);
        let mut style_skips: Vec<DetailBands> = Vec::with_capacity(3);
        for level in PoolLevel::ALL {
            let label = format!("encode/pool{}", level.index() + 1);
            let Streams { content: c, style: s } = streams;
            let ((c, mut c_skip), (s, s_skip)) = run.stage(&label, |e| {
                Ok((e.encoder.descend(level, c)?, e.encoder.descend(level, s)?))
            })?;
            run.wct_bands(&label, &mut c_skip, &s_skip)?;
            streams = Streams { content: c, style: s };
            run.wct(&label, &mut streams)?;
            content_skips.push(c_skip);
            style_skips.push(s_skip);
        }

        // ===== Decode ===== //
        for level in PoolLevel::ALL.into_iter().rev() {
            let idx = level.index();
            let expand_label = format!("decode/expand{}", idx + 1);
            let Streams { content: c, style: s } = streams;
            streams = run.stage(&expand_label, |e| {
                Ok(Streams {
                    content: e.decoder.expand(level, c)?,
                    style: e.decoder.expand(level, s)?,
                })
            })?;
            if level == PoolLevel::Third {
                run.wct(&expand_label, &mut streams)?;
            }

            let merge_label = format!("decode/merge{}", idx + 1);
            let Streams { content: c, style: s } = streams;
            streams = run.stage(&merge_label, |e| {
                Ok(Streams {
                    content: e.decoder.merge(level, &c, &content_skips[idx])?,
                    style: e.decoder.merge(level, &s, &style_skips[idx])?,
                })
            })?;
            run.wct(&merge_label, &mut streams)?;
        }

        let content_out = streams.content;
        let mut output = run.stage("decode/project", |e| e.decoder.project(content_out))?;
        let clip = self.params.clip;
        output.clamp_in_place(clip.min, clip.max);

        report.timings.total_ms = elapsed_ms(total_start);
        debug!(
            "StyleTransfer::transfer {}x{} alpha={alpha:.3} wct_calls={} total_ms={:.2}",
            output.w,
            output.h,
            report.wct_calls.len(),
            report.timings.total_ms
        );
        Ok((output, report))
    }

    /// Encoder followed by decoder with no transform: the forward pass the
    /// training routine optimises. Output is not clipped.
    pub fn reconstruct(&self, image: &FeatureMap) -> Result<FeatureMap> {
        let encoded = self.encoder.encode(image)?;
        self.decoder.decode(&encoded)
    }

    /// Load weights, logging and keeping the current weights on failure.
    ///
    /// `weight` is a checkpoint path, [`PRETRAINED`] (resolved through the
    /// configured [`WeightSource`]) or empty for the default checkpoint path.
    /// Returns whether new weights were installed.
    pub fn load_weights(&mut self, weight: &str) -> bool {
        match self.try_load_weights(weight) {
            Ok(path) => {
                debug!("loaded weights from {}", path.display());
                true
            }
            Err(err) => {
                warn!("could not load weights '{weight}': {err}; keeping current weights");
                false
            }
        }
    }

    /// Strict variant of [`load_weights`](Self::load_weights).
    pub fn try_load_weights(&mut self, weight: &str) -> Result<PathBuf> {
        let path = self.resolve_weight_path(weight)?;
        let (backbone, decoder) = Checkpoint::read(&path)?.into_weights()?;
        self.encoder = Encoder::new(Arc::new(backbone));
        self.decoder = decoder;
        Ok(path)
    }

    fn resolve_weight_path(&self, weight: &str) -> Result<PathBuf> {
        if weight == PRETRAINED {
            let source = self.weight_source.as_ref().ok_or_else(|| {
                TransferError::checkpoint("no weight source configured for pretrained weights")
            })?;
            return source.resolve(PRETRAINED);
        }
        if weight.is_empty() {
            return Ok(self.checkpoint_path.clone());
        }
        Ok(PathBuf::from(weight))
    }

    /// Save all weights, logging instead of failing. Returns success.
    pub fn save_weights(&self, path: Option<&Path>) -> bool {
        let path = path.unwrap_or(&self.checkpoint_path);
        match self.try_save_weights(path) {
            Ok(()) => true,
            Err(err) => {
                warn!("save weights to {} failed: {err}", path.display());
                false
            }
        }
    }

    pub fn try_save_weights(&self, path: &Path) -> Result<()> {
        Checkpoint::capture(self.encoder.weights(), &self.decoder).write(path)
    }
}

/// Per-call state: blend factors and the report being filled.
struct Run<'a> {
    engine: &'a StyleTransfer,
    alpha: f32,
    skip_alpha: f32,
    report: &'a mut TransferReport,
}

impl Run<'_> {
    fn stage<T>(&mut self, label: &str, f: impl FnOnce(&StyleTransfer) -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let out = f(self.engine)?;
        self.report.timings.push(label, elapsed_ms(start));
        Ok(out)
    }

    fn transform(
        &mut self,
        label: String,
        content: &FeatureMap,
        style: &FeatureMap,
        alpha: f32,
    ) -> Result<FeatureMap> {
        ensure_same_shape(&label, content, style)?;
        let start = Instant::now();
        let (out, rank) =
            whiten_and_color_traced(content, style, alpha, &self.engine.params.wct)?;
        self.report.timings.push(format!("{label}/wct"), elapsed_ms(start));
        self.report.features.push(FeatureStats::from_map(&label, &out));
        self.report.wct_calls.push(WctCall { stage: label, rank });
        Ok(out)
    }

    /// Transform the content stream in place with the style stream.
    fn wct(&mut self, label: &str, streams: &mut Streams) -> Result<()> {
        let alpha = self.alpha;
        streams.content = self.transform(label.to_string(), &streams.content, &streams.style, alpha)?;
        Ok(())
    }

    /// Transform each content detail band with the matching style band.
    fn wct_bands(&mut self, label: &str, content: &mut DetailBands, style: &DetailBands) -> Result<()> {
        let alpha = self.skip_alpha;
        let names = ["lh", "hl", "hh"];
        for ((band, style_band), name) in content.bands_mut().into_iter().zip(style.bands()).zip(names) {
            *band = self.transform(format!("{label}/{name}"), band, style_band, alpha)?;
        }
        Ok(())
    }
}

fn check_inputs(content: &FeatureMap, style: &FeatureMap) -> Result<()> {
    for map in [content, style] {
        if map.c != 3 {
            return Err(TransferError::ChannelMismatch {
                stage: "input".to_string(),
                expected: 3,
                actual: map.c,
            });
        }
        if map.h % 8 != 0 || map.w % 8 != 0 || map.pixel_count() == 0 {
            return Err(TransferError::OddDimensions {
                height: map.h,
                width: map.w,
            });
        }
    }
    ensure_same_shape("input", content, style)
}

fn ensure_same_shape(stage: &str, content: &FeatureMap, style: &FeatureMap) -> Result<()> {
    if content.shape() != style.shape() {
        return Err(TransferError::ShapeMismatch {
            stage: stage.to_string(),
            content: content.shape(),
            style: style.shape(),
        });
    }
    Ok(())
}
