//! Error taxonomy shared by the transfer engine, the checkpoint layer and the
//! demo tooling.

/// Convenience result type used across the crate.
pub type Result<T> = std::result::Result<T, TransferError>;

/// Top-level error type returned by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    /// Content and style maps disagree in spatial size at a WCT call site.
    #[error("shape mismatch at {stage}: content {content:?} vs style {style:?} (h, w, c)")]
    ShapeMismatch {
        stage: String,
        content: (usize, usize, usize),
        style: (usize, usize, usize),
    },

    /// Two maps that must share a channel count do not.
    #[error("channel mismatch at {stage}: expected {expected}, got {actual}")]
    ChannelMismatch {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// Wavelet pooling requires even spatial dimensions.
    #[error("wavelet pooling needs even dimensions, got {height}x{width}")]
    OddDimensions { height: usize, width: usize },

    /// Blend factor outside `[0, 1]` or not finite.
    #[error("alpha must lie in [0, 1], got {0}")]
    InvalidAlpha(f32),

    /// Weight tensors whose shapes do not match the expected topology.
    #[error("weight layout error: {0}")]
    WeightLayout(String),

    /// Failures while encoding or decoding a checkpoint.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl TransferError {
    /// Build a [`TransferError::WeightLayout`] value.
    pub fn weight_layout(msg: impl Into<String>) -> Self {
        Self::WeightLayout(msg.into())
    }

    /// Build a [`TransferError::Checkpoint`] value.
    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::Checkpoint(msg.into())
    }

    /// Build a [`TransferError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
