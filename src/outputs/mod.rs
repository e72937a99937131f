//! Output generation for the extracted posts.
//!
//! # Submodules
//!
//! - [`json`]: Writes the posts to a JSON file (`results.json` by default)

pub mod json;
