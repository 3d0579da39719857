//! Core modules: HTTP client, page bootstrap, pagination, normalization

pub mod bootstrap;
pub mod client;
pub mod downloader;
pub mod normalize;
