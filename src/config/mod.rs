//! JSON configuration of the command-line tools.
pub mod transfer;

pub use transfer::{load_config, TransferOutputConfig, TransferToolConfig};
