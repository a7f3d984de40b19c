//! # Digest Channels
//! Chat channels the digest can be delivered to.

pub mod slack;

pub use slack::SlackNotifier;
