//! Diagnostics captured while running a transfer.
//!
//! [`TransferReport`] is returned by
//! [`StyleTransfer::transfer_with_report`](crate::StyleTransfer::transfer_with_report):
//! per-stage wall time, summary statistics of every content-path feature map
//! the orchestrator produced and the covariance rank retained by each WCT
//! call. All types serialize to camelCase JSON for the demo tooling.

pub mod features;
pub mod report;
pub mod timing;

pub use features::FeatureStats;
pub use report::{InputDescriptor, TransferReport, WctCall};
pub use timing::{StageTiming, TimingBreakdown};
