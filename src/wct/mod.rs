//! Whitening and coloring transform (WCT).
//!
//! Aligns the channel statistics of a content feature map with those of a
//! style feature map:
//!
//! 1. flatten each map to `C × N` (one column per pixel) and centre it;
//! 2. eigen-decompose the content covariance and whiten: `Ec Dc^-½ Ecᵀ`;
//! 3. eigen-decompose the style covariance and colour: `Es Ds^½ Esᵀ`, then
//!    add the style mean;
//! 4. blend `α·transformed + (1 − α)·content`.
//!
//! Eigenvalues at or below [`WctOptions::eigen_floor`] are dropped before the
//! inverse square root, so singular covariances (flat images, dead channels,
//! fewer pixels than channels) degrade to a lower-rank transform instead of
//! blowing up. This can reduce fidelity on near-degenerate inputs; the
//! retained rank is reported in [`RankInfo`].

mod covariance;
mod options;
mod transform;

pub use covariance::{ChannelStats, CovarianceEigen};
pub use options::WctOptions;
pub use transform::{whiten_and_color, whiten_and_color_traced, RankInfo};
