pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};

pub use crate::adapters::pdf::PdfCardRenderer;
pub use crate::core::{engine::CompEngine, pipeline::CompPipeline};
pub use crate::utils::error::{CompError, Result};
