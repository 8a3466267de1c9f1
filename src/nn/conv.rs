//! 3×3 convolution with zero "same" padding over channel-last maps.
//!
//! Kernel layout is `[out][ky][kx][in]` so that the weights of one output
//! channel are contiguous and line up with a gathered input patch. Rows of
//! the output are computed in parallel with rayon; each row is independent
//! and the result is deterministic.
use super::init::glorot_uniform;
use crate::error::{Result, TransferError};
use crate::image::{FeatureMap, FeatureView};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const KERNEL_SIZE: usize = 3;
const TAPS: usize = KERNEL_SIZE * KERNEL_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    /// Identity; used by the final RGB projection.
    Linear,
}

impl Activation {
    #[inline]
    fn apply(self, v: f32) -> f32 {
        match self {
            Activation::Relu => v.max(0.0),
            Activation::Linear => v,
        }
    }
}

/// Named 3×3 convolution layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Conv2d {
    name: String,
    in_channels: usize,
    out_channels: usize,
    activation: Activation,
    kernel: Vec<f32>,
    bias: Vec<f32>,
}

impl Conv2d {
    /// Build a layer from raw `[out][ky][kx][in]` weights.
    pub fn from_parts(
        name: impl Into<String>,
        in_channels: usize,
        out_channels: usize,
        activation: Activation,
        kernel: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self> {
        let name = name.into();
        let expected = out_channels * TAPS * in_channels;
        if kernel.len() != expected || bias.len() != out_channels {
            return Err(TransferError::weight_layout(format!(
                "{name}: kernel has {} values (expected {expected}), bias has {} (expected {out_channels})",
                kernel.len(),
                bias.len()
            )));
        }
        Ok(Self {
            name,
            in_channels,
            out_channels,
            activation,
            kernel,
            bias,
        })
    }

    /// Build a layer from `[ky][kx][in][out]` weights, the layout used by
    /// Keras/TensorFlow backbones.
    pub fn from_hwio(
        name: impl Into<String>,
        in_channels: usize,
        out_channels: usize,
        activation: Activation,
        hwio: &[f32],
        bias: Vec<f32>,
    ) -> Result<Self> {
        let expected = TAPS * in_channels * out_channels;
        if hwio.len() != expected {
            return Err(TransferError::weight_layout(format!(
                "hwio kernel has {} values, expected {expected}",
                hwio.len()
            )));
        }
        let mut kernel = vec![0.0; expected];
        for tap in 0..TAPS {
            for i in 0..in_channels {
                for o in 0..out_channels {
                    kernel[(o * TAPS + tap) * in_channels + i] =
                        hwio[(tap * in_channels + i) * out_channels + o];
                }
            }
        }
        Self::from_parts(name, in_channels, out_channels, activation, kernel, bias)
    }

    /// Glorot-uniform kernel, zero bias.
    pub fn seeded<R: Rng>(
        name: impl Into<String>,
        in_channels: usize,
        out_channels: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let kernel = glorot_uniform(
            rng,
            TAPS * in_channels,
            TAPS * out_channels,
            out_channels * TAPS * in_channels,
        );
        Self {
            name: name.into(),
            in_channels,
            out_channels,
            activation,
            kernel,
            bias: vec![0.0; out_channels],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }
    pub fn activation(&self) -> Activation {
        self.activation
    }
    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }
    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    /// Mutable access for the training routine.
    pub fn params_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.kernel, &mut self.bias)
    }

    /// Same-padded convolution followed by the layer activation.
    pub fn forward(&self, x: &FeatureMap) -> Result<FeatureMap> {
        if x.c != self.in_channels {
            return Err(TransferError::ChannelMismatch {
                stage: self.name.clone(),
                expected: self.in_channels,
                actual: x.c,
            });
        }
        let (h, w, cin, cout) = (x.h, x.w, self.in_channels, self.out_channels);
        let mut out = FeatureMap::new(h, w, cout);
        let row_len = w * cout;
        if row_len == 0 || h == 0 {
            return Ok(out);
        }
        let patch_len = TAPS * cin;

        out.data
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, dst)| {
                let mut patch = vec![0.0f32; patch_len];
                for px in 0..w {
                    gather_patch(x, y, px, &mut patch);
                    for o in 0..cout {
                        let weights = &self.kernel[o * patch_len..(o + 1) * patch_len];
                        let acc: f32 = weights.iter().zip(&patch).map(|(k, v)| k * v).sum();
                        dst[px * cout + o] = self.activation.apply(acc + self.bias[o]);
                    }
                }
            });
        Ok(out)
    }
}

/// Copy the 3×3 neighbourhood around (y, x) into `patch`, zero outside.
fn gather_patch(x: &FeatureMap, y: usize, px: usize, patch: &mut [f32]) {
    let c = x.c;
    for ky in 0..KERNEL_SIZE {
        let sy = y as isize + ky as isize - 1;
        for kx in 0..KERNEL_SIZE {
            let sx = px as isize + kx as isize - 1;
            let dst = &mut patch[(ky * KERNEL_SIZE + kx) * c..(ky * KERNEL_SIZE + kx + 1) * c];
            if sy < 0 || sx < 0 || sy as usize >= x.h || sx as usize >= x.w {
                dst.fill(0.0);
            } else {
                dst.copy_from_slice(x.pixel(sy as usize, sx as usize));
            }
        }
    }
}

/// 2×2 stride-2 max pooling; a trailing odd row/column is dropped.
pub fn max_pool_2x2(x: &FeatureMap) -> FeatureMap {
    let (h, w, c) = (x.h / 2, x.w / 2, x.c);
    let mut out = FeatureMap::new(h, w, c);
    for y in 0..h {
        let top = x.row(2 * y);
        let bottom = x.row(2 * y + 1);
        let dst = out.row_mut(y);
        for px in 0..w {
            let (l, r) = (2 * px * c, (2 * px + 1) * c);
            for ch in 0..c {
                dst[px * c + ch] = top[l + ch]
                    .max(top[r + ch])
                    .max(bottom[l + ch])
                    .max(bottom[r + ch]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn centre_identity(channels: usize) -> Conv2d {
        let mut kernel = vec![0.0; channels * TAPS * channels];
        for o in 0..channels {
            kernel[(o * TAPS + 4) * channels + o] = 1.0;
        }
        Conv2d::from_parts("id", channels, channels, Activation::Linear, kernel, vec![0.0; channels])
            .unwrap()
    }

    #[test]
    fn centre_tap_identity_preserves_input() {
        let mut x = FeatureMap::new(3, 4, 2);
        for (i, v) in x.data.iter_mut().enumerate() {
            *v = i as f32 - 7.0;
        }
        let y = centre_identity(2).forward(&x).unwrap();
        assert_eq!(y, x);
    }

    #[test]
    fn box_filter_uses_zero_padding() {
        let conv = Conv2d::from_parts("box", 1, 1, Activation::Linear, vec![1.0; 9], vec![0.5])
            .unwrap();
        let x = FeatureMap::filled(3, 3, &[1.0]);
        let y = conv.forward(&x).unwrap();
        assert_eq!(y.get(1, 1, 0), 9.5);
        assert_eq!(y.get(0, 0, 0), 4.5);
        assert_eq!(y.get(0, 1, 0), 6.5);
    }

    #[test]
    fn relu_clamps_negative_responses() {
        let conv =
            Conv2d::from_parts("neg", 1, 1, Activation::Relu, vec![-1.0; 9], vec![0.0]).unwrap();
        let y = conv.forward(&FeatureMap::filled(2, 2, &[1.0])).unwrap();
        assert!(y.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn hwio_import_matches_native_layout() {
        let mut rng = Pcg32::seed_from_u64(3);
        let native = Conv2d::seeded("a", 2, 3, Activation::Linear, &mut rng);
        let mut hwio = vec![0.0; native.kernel().len()];
        for o in 0..3 {
            for tap in 0..TAPS {
                for i in 0..2 {
                    hwio[(tap * 2 + i) * 3 + o] = native.kernel()[(o * TAPS + tap) * 2 + i];
                }
            }
        }
        let imported =
            Conv2d::from_hwio("a", 2, 3, Activation::Linear, &hwio, vec![0.0; 3]).unwrap();
        assert_eq!(imported, native);
    }

    #[test]
    fn channel_mismatch_is_reported() {
        let conv = centre_identity(2);
        assert!(conv.forward(&FeatureMap::new(2, 2, 3)).is_err());
    }

    #[test]
    fn max_pool_picks_block_maximum() {
        let mut x = FeatureMap::new(2, 4, 1);
        x.data.copy_from_slice(&[1.0, 5.0, -1.0, -2.0, 3.0, 2.0, -3.0, -0.5]);
        let y = max_pool_2x2(&x);
        assert_eq!(y.data, vec![5.0, -0.5]);
    }
}
