//! Scanner configuration: which rules run, with which options and filters.
//!
//! ## Layers
//! - `types`: configuration file structures
//! - `loading`: file parsing and conversion into [`Check`](crate::check::Check)s
//! - `error`: [`ConfigError`]

mod error;
mod loading;
mod types;

pub use error::ConfigError;
pub use loading::{LoadedConfig, load_config};
pub use types::{CheckConfig, Configuration, FilterConfig};
