//! Error types shared by every digest crate.

/// Errors raised while fetching, building or delivering a digest.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("config error: {0}")]
    Config(String),

    #[error("tracker error: {0}")]
    Tracker(String),

    #[error("notify error: {0}")]
    Notify(String),

    #[error("schedule error: {0}")]
    Schedule(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
