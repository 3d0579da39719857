//! yt-comments library
//!
//! Continuation-driven comment download from YouTube watch pages,
//! without the official Data API.

pub mod core;
pub mod error;
pub mod types;
pub mod utils;
