//! CLI command handlers

pub mod ask;
pub mod config;
pub mod search;
pub mod summarize;
