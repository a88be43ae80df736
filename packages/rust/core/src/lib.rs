//! Documentation tooling built on the doctools Markdown tree.
//!
//! - [`index`] — index page generation from heading annotations
//! - [`antispam`] — heuristic checks for new issues and pull requests
//! - [`fileops`] — portable file copy and directory creation

pub mod antispam;
pub mod fileops;
pub mod index;

pub use index::IndexBuilder;
