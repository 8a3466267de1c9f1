//! Orthonormal Haar filter bank used by wavelet pooling.
//!
//! Each of the four 2×2 kernels is the outer product of a vertical and a
//! horizontal 2-tap filter. The kernels form an orthonormal basis of the
//! 2×2 block, so the transposed bank reconstructs the block exactly.
use std::f32::consts::FRAC_1_SQRT_2;

/// Low-pass taps `[1, 1] / √2`.
pub const HAAR_LOW: [f32; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];
/// High-pass taps `[-1, 1] / √2`.
pub const HAAR_HIGH: [f32; 2] = [-FRAC_1_SQRT_2, FRAC_1_SQRT_2];

pub type Kernel2 = [[f32; 2]; 2];

/// Sub-band selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// Low vertical, low horizontal: the pooled continuation.
    LowLow,
    /// Low vertical, high horizontal.
    LowHigh,
    /// High vertical, low horizontal.
    HighLow,
    /// High in both directions (diagonal detail).
    HighHigh,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::LowLow, Band::LowHigh, Band::HighLow, Band::HighHigh];

    pub fn name(self) -> &'static str {
        match self {
            Band::LowLow => "ll",
            Band::LowHigh => "lh",
            Band::HighLow => "hl",
            Band::HighHigh => "hh",
        }
    }

    /// `kernel[i][j]` weights input sample `(2y + i, 2x + j)`.
    pub fn kernel(self) -> Kernel2 {
        let (v, h) = match self {
            Band::LowLow => (HAAR_LOW, HAAR_LOW),
            Band::LowHigh => (HAAR_LOW, HAAR_HIGH),
            Band::HighLow => (HAAR_HIGH, HAAR_LOW),
            Band::HighHigh => (HAAR_HIGH, HAAR_HIGH),
        };
        [[v[0] * h[0], v[0] * h[1]], [v[1] * h[0], v[1] * h[1]]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernels_are_orthonormal() {
        for a in Band::ALL {
            for b in Band::ALL {
                let (ka, kb) = (a.kernel(), b.kernel());
                let dot: f32 = (0..2)
                    .flat_map(|i| (0..2).map(move |j| (i, j)))
                    .map(|(i, j)| ka[i][j] * kb[i][j])
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-6, "{a:?}·{b:?} = {dot}");
            }
        }
    }
}
