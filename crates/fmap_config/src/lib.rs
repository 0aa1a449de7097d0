//! Parsing and validation of `fmap.toml` mapping project files.
//!
//! A project file describes the logical design (components, groups,
//! connections), the physical platform (FPGAs, clusters, links, required
//! components), and the weights used by the placement heuristic.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
