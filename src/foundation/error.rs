/// Convenience result type used across Tenebra.
pub type TenebraResult<T> = Result<T, TenebraError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only `Validation`, `Serde` and `Other` normally escape to callers. `Capability` and `Synthesis`
/// are produced by backends and absorbed by the schedulers, which degrade instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum TenebraError {
    /// Invalid user-provided or sequence data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A host capability (audio graph, speech synthesis) is not available.
    #[error("capability unavailable: {0}")]
    Capability(String),

    /// A single audio node or utterance failed to synthesize.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Playback lifecycle was driven in an order that cannot be honored.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TenebraError {
    /// Build a [`TenebraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TenebraError::Capability`] value.
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Build a [`TenebraError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`TenebraError::Lifecycle`] value.
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }

    /// Build a [`TenebraError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for errors a scheduler should degrade on rather than propagate.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::Capability(_) | Self::Synthesis(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
