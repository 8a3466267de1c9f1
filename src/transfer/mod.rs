//! Staged transfer orchestrator.
//!
//! Overview
//! - Content and style run through the same encoder stages side by side;
//!   every stage output is available for both paths.
//! - After `block1_conv1` and after every pooling boundary the content
//!   stream is whitened and recoloured with the style stream. The three
//!   detail bands captured at each boundary are transformed the same way.
//! - The decoder walks back up: halve channels, unpool with the transformed
//!   detail, refine, transform. The style path is decoded alongside so that
//!   every decoder-side WCT call has matching statistics.
//! - The linear RGB projection is clipped to the configured range.
//!
//! Stage order (17 WCT calls in total):
//!
//! ```text
//! stem → WCT
//! pool1 → WCT(lh, hl, hh) → WCT
//! pool2 → WCT(lh, hl, hh) → WCT
//! pool3 → WCT(lh, hl, hh) → WCT            (bottleneck)
//! expand3 → WCT → merge3 → WCT
//! expand2 → merge2 → WCT
//! expand1 → merge1 → WCT
//! project → clip
//! ```

mod params;
mod pipeline;

pub use params::{ClipRange, TransferParams};
pub use pipeline::StyleTransfer;
