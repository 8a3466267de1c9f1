#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod checkpoint;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod loss;
pub mod transfer;

// Building blocks – public for tooling and training code, but considered
// internals whose signatures may still move.
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod nn;
pub mod topology;
pub mod wavelet;
pub mod wct;

// --- High-level re-exports -------------------------------------------------

// Main entry point and its parameters.
pub use crate::transfer::{ClipRange, StyleTransfer, TransferParams};
pub use crate::error::{Result, TransferError};

// Tensor type and network layout.
pub use crate::image::FeatureMap;
pub use crate::topology::Topology;

// Weight groups and persistence.
pub use crate::checkpoint::{CacheDirSource, Checkpoint, WeightSource};
pub use crate::decoder::Decoder;
pub use crate::encoder::{BackboneWeights, Encoder};

// Diagnostics returned by `transfer_with_report`.
pub use crate::diagnostics::TransferReport;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use wct_transfer::prelude::*;
///
/// # fn main() -> wct_transfer::Result<()> {
/// let content = FeatureMap::filled(64, 64, &[120.0, 80.0, 40.0]);
/// let style = FeatureMap::filled(64, 64, &[30.0, 60.0, 200.0]);
///
/// let mut engine = StyleTransfer::untrained(Topology::default(), 0, TransferParams::default());
/// engine.load_weights("checkpoints/wct2.bin");
///
/// let out = engine.transfer(&content, &style, 0.8)?;
/// println!("{}x{}x{}", out.h, out.w, out.c);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::FeatureMap;
    pub use crate::{StyleTransfer, Topology, TransferParams};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage primitives in orchestrator order.
    pub use crate::decoder::Decoder;
    pub use crate::encoder::{Encoded, Encoder};
    pub use crate::topology::PoolLevel;
    pub use crate::wavelet::{haar_pool, haar_unpool, DetailBands};
    pub use crate::wct::{whiten_and_color, whiten_and_color_traced, RankInfo, WctOptions};

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        FeatureStats, InputDescriptor, StageTiming, TimingBreakdown, TransferReport, WctCall,
    };
}
