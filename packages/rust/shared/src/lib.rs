//! Shared error model and configuration for doctools.
//!
//! This crate is the foundation depended on by all other doctools crates.
//! It provides:
//! - [`DocToolsError`] — the unified error type
//! - Configuration ([`AppConfig`], [`IndexConfig`], [`HtmlConfig`], [`AntispamConfig`])

pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AntispamConfig, AppConfig, HtmlConfig, IndexConfig, config_dir, config_file_path,
    init_config, init_config_at, load_config, load_config_from,
};
pub use error::{DocToolsError, Result};
