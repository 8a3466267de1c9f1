//! Input preparation for the transfer engine.
//!
//! The engine expects content and style tensors of identical size whose
//! height and width survive three 2× wavelet poolings. These helpers resize
//! to a target width (aspect preserved), crop to a multiple of the pooling
//! stride and pick the channel order handed to the backbone.
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Deserialize;

/// Channel order of the float tensor fed to the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    /// Caffe-style backbones were trained on BGR input.
    #[default]
    Bgr,
}

impl ChannelOrder {
    /// Reorder an RGB triple into this order (the swap is its own inverse).
    #[inline]
    pub fn arrange<T: Copy>(self, px: [T; 3]) -> [T; 3] {
        match self {
            ChannelOrder::Rgb => px,
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
        }
    }
}

/// Preprocessing knobs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Preprocess {
    /// Target width in pixels; height follows the aspect ratio.
    pub width: u32,
    /// Both dimensions are cropped down to a multiple of this value.
    pub multiple_of: u32,
}

impl Default for Preprocess {
    fn default() -> Self {
        Self {
            width: 512,
            multiple_of: 8,
        }
    }
}

impl Preprocess {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    /// Resize then crop so the result is a valid engine input.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let resized = resize_to_width(img, self.width);
        crop_to_multiple(&resized, self.multiple_of)
    }

    /// Prepare a style image so it matches the content image size exactly.
    pub fn apply_matching(&self, img: &RgbImage, target: &RgbImage) -> RgbImage {
        if img.dimensions() == target.dimensions() {
            return img.clone();
        }
        imageops::resize(img, target.width(), target.height(), FilterType::Triangle)
    }
}

/// Scale to `width` preserving the aspect ratio.
pub fn resize_to_width(img: &RgbImage, width: u32) -> RgbImage {
    if width == 0 || img.width() == width {
        return img.clone();
    }
    let ratio = width as f64 / img.width().max(1) as f64;
    let height = ((img.height() as f64 * ratio) as u32).max(1);
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Crop the bottom/right border so both dimensions are multiples of `m`.
pub fn crop_to_multiple(img: &RgbImage, m: u32) -> RgbImage {
    if m <= 1 {
        return img.clone();
    }
    let w = (img.width() / m).max(1) * m;
    let h = (img.height() / m).max(1) * m;
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    imageops::crop_imm(img, 0, 0, w.min(img.width()), h.min(img.height())).to_image()
}
