//! I/O helpers for RGB images and JSON.
//!
//! - `load_rgb_image`: read a PNG/JPEG into an 8-bit RGB buffer.
//! - `rgb_to_feature_map` / `feature_map_to_rgb`: convert between 8-bit RGB
//!   and the `[0, 255]` float tensor consumed by the engine.
//! - `save_rgb_image`: write a 3-channel map to disk, clamping to `[0, 255]`.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::preprocess::ChannelOrder;
use super::FeatureMap;
use crate::error::{Result, TransferError};
use image::{Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)?.into_rgb8();
    log::debug!(
        "loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Convert an 8-bit RGB buffer to a float map in `[0, 255]`.
pub fn rgb_to_feature_map(img: &RgbImage, order: ChannelOrder) -> FeatureMap {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut out = FeatureMap::new(h, w, 3);
    for (x, y, px) in img.enumerate_pixels() {
        let [r, g, b] = order.arrange(px.0);
        let i = out.idx(y as usize, x as usize, 0);
        out.data[i] = r as f32;
        out.data[i + 1] = g as f32;
        out.data[i + 2] = b as f32;
    }
    out
}

/// Convert a 3-channel float map back to 8-bit RGB, rounding and clamping.
pub fn feature_map_to_rgb(map: &FeatureMap, order: ChannelOrder) -> Result<RgbImage> {
    if map.c != 3 {
        return Err(TransferError::ChannelMismatch {
            stage: "feature_map_to_rgb".to_string(),
            expected: 3,
            actual: map.c,
        });
    }
    let mut out = RgbImage::new(map.w as u32, map.h as u32);
    for y in 0..map.h {
        for x in 0..map.w {
            let px = map.pixel(y, x);
            let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
            let stored = order.arrange([q(px[0]), q(px[1]), q(px[2])]);
            out.put_pixel(x as u32, y as u32, Rgb(stored));
        }
    }
    Ok(out)
}

/// Save a 3-channel float map to an image file, clamping values in [0, 255].
pub fn save_rgb_image(map: &FeatureMap, order: ChannelOrder, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    feature_map_to_rgb(map, order)?.save(path)?;
    Ok(())
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        TransferError::config(format!("failed to serialize JSON for {}: {e}", path.display()))
    })?;
    fs::write(path, json)?;
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_round_trip_restores_pixels() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(1, 0, Rgb([200, 100, 0]));
        let map = rgb_to_feature_map(&img, ChannelOrder::Bgr);
        assert_eq!(map.pixel(0, 0), &[30.0, 20.0, 10.0]);
        let back = feature_map_to_rgb(&map, ChannelOrder::Bgr).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn out_of_range_values_are_clamped_on_export() {
        let map = FeatureMap::filled(1, 1, &[-5.0, 300.0, 127.6]);
        let img = feature_map_to_rgb(&map, ChannelOrder::Rgb).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 128]);
    }
}
