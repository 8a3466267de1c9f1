//! Minimal convolution primitives for the fixed VGG-style topology.
//!
//! Only what the encoder/decoder need: 3×3 stride-1 "same" convolutions with
//! an optional ReLU, 2×2 max pooling for the style-loss features and seeded
//! Glorot initialisation.

pub mod conv;
pub mod init;

pub use conv::{max_pool_2x2, Activation, Conv2d, KERNEL_SIZE};
