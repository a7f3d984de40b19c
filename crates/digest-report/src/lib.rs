//! # Digest Report
//!
//! Turns one day of tracker activity into a chat-ready digest.
//!
//! ```text
//! activity (newest first) ──reverse──► StoryGrouper ◄── snapshot + stories
//!                                          │
//!                                          ▼
//!                                  classify() per story
//!                                          │
//!                                          ▼
//!                             render_daily() → "Mon Oct 19:\n\n..."
//! ```

pub mod classify;
pub mod format;
pub mod grouper;
pub mod pipeline;

pub use classify::{Category, ClassifyOptions, classify};
pub use format::render_daily;
pub use grouper::{StoryAggregate, StoryGrouper};
pub use pipeline::DailyReport;
