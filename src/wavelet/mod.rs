//! Haar wavelet pooling and unpooling.
//!
//! Pooling splits a map with even height/width into a half-resolution
//! low-frequency band (LL) that continues down the encoder and three detail
//! bands (LH, HL, HH) kept as skips. Unpooling sums the transposed filter
//! responses of all four bands, which is the exact inverse of pooling for
//! unmodified bands. When the decoder has replaced LL, the stored detail is
//! merged back in and restores the high frequencies lost at the bottleneck.
//!
//! Complexity: O(H·W·C) per call; no parameters, deterministic.

pub mod filters;

use crate::error::{Result, TransferError};
use crate::image::{FeatureMap, FeatureView};
use filters::{Band, Kernel2};

pub use filters::{HAAR_HIGH, HAAR_LOW};

/// Detail bands captured at one pooling boundary plus the pre-pooling size.
#[derive(Clone, Debug)]
pub struct DetailBands {
    pub lh: FeatureMap,
    pub hl: FeatureMap,
    pub hh: FeatureMap,
    /// `(height, width)` of the map fed into pooling; the unpooling target.
    pub original_size: (usize, usize),
}

impl DetailBands {
    pub fn bands(&self) -> [&FeatureMap; 3] {
        [&self.lh, &self.hl, &self.hh]
    }

    pub fn bands_mut(&mut self) -> [&mut FeatureMap; 3] {
        [&mut self.lh, &mut self.hl, &mut self.hh]
    }
}

/// Apply one 2×2 stride-2 kernel per channel.
fn analyse(src: &FeatureMap, kernel: &Kernel2) -> FeatureMap {
    let (h, w, c) = (src.h / 2, src.w / 2, src.c);
    let mut out = FeatureMap::new(h, w, c);
    for y in 0..h {
        let top = src.row(2 * y);
        let bottom = src.row(2 * y + 1);
        let dst = out.row_mut(y);
        for x in 0..w {
            let l = 2 * x * c;
            let r = l + c;
            for ch in 0..c {
                dst[x * c + ch] = kernel[0][0] * top[l + ch]
                    + kernel[0][1] * top[r + ch]
                    + kernel[1][0] * bottom[l + ch]
                    + kernel[1][1] * bottom[r + ch];
            }
        }
    }
    out
}

/// Scatter-add the transposed kernel response of `band` into `dst`.
fn synthesise_into(band: &FeatureMap, kernel: &Kernel2, dst: &mut FeatureMap) {
    let c = band.c;
    for y in 0..band.h {
        let src = band.row(y);
        for i in 0..2 {
            let out_row = dst.row_mut(2 * y + i);
            for x in 0..band.w {
                for j in 0..2 {
                    let k = kernel[i][j];
                    let base = (2 * x + j) * c;
                    for ch in 0..c {
                        out_row[base + ch] += k * src[x * c + ch];
                    }
                }
            }
        }
    }
}

/// Split `x` into the pooled LL band and the retained detail bands.
pub fn haar_pool(x: &FeatureMap) -> Result<(FeatureMap, DetailBands)> {
    if x.h % 2 != 0 || x.w % 2 != 0 {
        return Err(TransferError::OddDimensions {
            height: x.h,
            width: x.w,
        });
    }
    let ll = analyse(x, &Band::LowLow.kernel());
    let bands = DetailBands {
        lh: analyse(x, &Band::LowHigh.kernel()),
        hl: analyse(x, &Band::HighLow.kernel()),
        hh: analyse(x, &Band::HighHigh.kernel()),
        original_size: (x.h, x.w),
    };
    Ok((ll, bands))
}

/// Merge a (possibly processed) LL band with stored detail at 2× resolution.
pub fn haar_unpool(ll: &FeatureMap, skip: &DetailBands) -> Result<FeatureMap> {
    for (band, name) in skip.bands().into_iter().zip(["lh", "hl", "hh"]) {
        if !ll.same_spatial(band) {
            return Err(TransferError::ShapeMismatch {
                stage: format!("unpool/{name}"),
                content: ll.shape(),
                style: band.shape(),
            });
        }
        if ll.c != band.c {
            return Err(TransferError::ChannelMismatch {
                stage: format!("unpool/{name}"),
                expected: band.c,
                actual: ll.c,
            });
        }
    }
    let (oh, ow) = skip.original_size;
    if oh != 2 * ll.h || ow != 2 * ll.w {
        return Err(TransferError::ShapeMismatch {
            stage: "unpool/original".to_string(),
            content: (2 * ll.h, 2 * ll.w, ll.c),
            style: (oh, ow, ll.c),
        });
    }

    let mut out = FeatureMap::new(oh, ow, ll.c);
    synthesise_into(ll, &Band::LowLow.kernel(), &mut out);
    synthesise_into(&skip.lh, &Band::LowHigh.kernel(), &mut out);
    synthesise_into(&skip.hl, &Band::HighLow.kernel(), &mut out);
    synthesise_into(&skip.hh, &Band::HighHigh.kernel(), &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests;
