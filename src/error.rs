//! Error types for the frame driver and its host.

/// Errors produced by the frame driver, its strategies, and the window host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// Bad bounds, non-positive intervals etc. Raised at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A per-frame strategy failed. The rest of that frame's strategies are skipped.
    #[error("Strategy `{strategy}` failed: {reason}")]
    StrategyFailure { strategy: String, reason: String },
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Window error: {0}")]
    Window(String),
}

impl FrameError {
    /// A shorthand for strategies reporting a failure from inside `on_frame`.
    pub fn strategy(strategy: &str, reason: impl Into<String>) -> Self {
        Self::StrategyFailure {
            strategy: strategy.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
