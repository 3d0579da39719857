//! Utility modules: JSON tree search, relative-time parsing

pub mod search;
pub mod time;
