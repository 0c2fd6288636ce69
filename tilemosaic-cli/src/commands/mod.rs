//! CLI command implementations.

pub mod build;
pub mod cache;
pub mod common;
pub mod config;
pub mod tile;
pub mod zoom;
