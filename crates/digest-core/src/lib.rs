//! # Digest Core
//!
//! Shared building blocks for the daily digest workspace:
//! tracker wire types, the configuration tree, the error enum,
//! and the collaborator traits the pipeline is written against.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DigestConfig;
pub use error::{DigestError, Result};
pub use traits::{Notifier, TrackerSource};
