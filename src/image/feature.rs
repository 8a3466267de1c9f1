//! Owned `(height, width, channels)` f32 tensor in row-major, channel-last
//! layout. The batch dimension is implicit and always one.
//!
//! Used for RGB images (`channels == 3`, values nominally in `[0, 255]`) and
//! for every intermediate feature map of the encoder/decoder pyramid.
use super::traits::FeatureView;
use crate::error::{Result, TransferError};

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMap {
    /// Height in pixels
    pub h: usize,
    /// Width in pixels
    pub w: usize,
    /// Channels per pixel
    pub c: usize,
    /// Backing storage, `data[(y * w + x) * c + ch]`
    pub data: Vec<f32>,
}

impl FeatureMap {
    /// Construct a zero-initialized map of size `h × w × c`.
    pub fn new(h: usize, w: usize, c: usize) -> Self {
        Self {
            h,
            w,
            c,
            data: vec![0.0; h * w * c],
        }
    }

    /// Construct a map where every pixel equals `value` (length `c`).
    pub fn filled(h: usize, w: usize, value: &[f32]) -> Self {
        let c = value.len();
        let mut data = Vec::with_capacity(h * w * c);
        for _ in 0..h * w {
            data.extend_from_slice(value);
        }
        Self { h, w, c, data }
    }

    /// Wrap an existing buffer, validating its length.
    pub fn from_vec(h: usize, w: usize, c: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != h * w * c {
            return Err(TransferError::weight_layout(format!(
                "buffer of {} values cannot hold a {h}x{w}x{c} map",
                data.len()
            )));
        }
        Ok(Self { h, w, c, data })
    }

    #[inline]
    /// Convert (y, x, ch) to a linear index into `data`.
    pub fn idx(&self, y: usize, x: usize, ch: usize) -> usize {
        (y * self.w + x) * self.c + ch
    }
    #[inline]
    pub fn get(&self, y: usize, x: usize, ch: usize) -> f32 {
        self.data[self.idx(y, x, ch)]
    }
    #[inline]
    pub fn set(&mut self, y: usize, x: usize, ch: usize, v: f32) {
        let i = self.idx(y, x, ch);
        self.data[i] = v;
    }

    /// All channels of a single pixel.
    #[inline]
    pub fn pixel(&self, y: usize, x: usize) -> &[f32] {
        let start = (y * self.w + x) * self.c;
        &self.data[start..start + self.c]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let len = self.w * self.c;
        &mut self.data[y * len..(y + 1) * len]
    }

    /// True when both maps have identical height and width.
    pub fn same_spatial(&self, other: &FeatureMap) -> bool {
        self.h == other.h && self.w == other.w
    }

    /// Clamp every value into `[lo, hi]` in place.
    pub fn clamp_in_place(&mut self, lo: f32, hi: f32) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }

    /// Per-channel arithmetic mean over all pixels.
    pub fn channel_means(&self) -> Vec<f32> {
        let mut acc = vec![0.0f64; self.c];
        for px in self.data.chunks_exact(self.c.max(1)) {
            for (a, &v) in acc.iter_mut().zip(px) {
                *a += v as f64;
            }
        }
        let n = self.pixel_count().max(1) as f64;
        acc.into_iter().map(|a| (a / n) as f32).collect()
    }

    /// Largest absolute element-wise difference to `other` (same shape).
    pub fn max_abs_diff(&self, other: &FeatureMap) -> f32 {
        debug_assert_eq!(self.shape(), other.shape());
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl FeatureView for FeatureMap {
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn channels(&self) -> usize {
        self.c
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let len = self.w * self.c;
        &self.data[y * len..(y + 1) * len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_channel_last() {
        let mut m = FeatureMap::new(2, 3, 4);
        m.set(1, 2, 3, 7.0);
        assert_eq!(m.data[m.data.len() - 1], 7.0);
        assert_eq!(m.pixel(1, 2), &[0.0, 0.0, 0.0, 7.0]);
        assert_eq!(m.rows().count(), 2);
        assert_eq!(m.row(1).len(), 12);
    }

    #[test]
    fn filled_map_has_constant_channel_means() {
        let m = FeatureMap::filled(4, 5, &[10.0, 20.0, 30.0]);
        assert_eq!(m.shape(), (4, 5, 3));
        assert_eq!(m.channel_means(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(FeatureMap::from_vec(2, 2, 3, vec![0.0; 11]).is_err());
        assert!(FeatureMap::from_vec(2, 2, 3, vec![0.0; 12]).is_ok());
    }
}
