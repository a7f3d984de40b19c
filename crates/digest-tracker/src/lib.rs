//! # Digest Tracker
//! Read-only client for the project tracker's activity, snapshot and story endpoints.

pub mod client;

pub use client::PivotalClient;
