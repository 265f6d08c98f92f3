pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, validate_positive_number};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_GROUP_SIZE: usize = 2;
pub const DEFAULT_ROUND: u32 = 1;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "comp-cards")]
#[command(about = "Assign competitors to event groups and print scorecards and namecards")]
pub struct CliConfig {
    #[arg(long, short, help = "Competitor CSV with Name and Events columns")]
    pub input: Option<String>,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = "2")]
    pub group_size: usize,

    #[arg(long, default_value = "1", help = "Round number printed on scorecards")]
    pub round: u32,

    #[arg(long, help = "File copied into every run folder (e.g. results.xls)")]
    pub results_template: Option<String>,

    #[arg(long, help = "Also bundle the run folder into a zip archive")]
    pub archive: bool,

    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_file(&self) -> &str {
        self.input.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn group_size(&self) -> usize {
        self.group_size
    }

    fn round(&self) -> u32 {
        self.round
    }

    fn results_template(&self) -> Option<&str> {
        self.results_template.as_deref()
    }

    fn archive(&self) -> bool {
        self.archive
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_run_config(self)
    }
}

/// 所有設定來源共用的檢查，在任何分組之前執行
pub fn validate_run_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_path("input", config.input_file())?;
    validate_file_extension("input", config.input_file(), &["csv"])?;
    validate_path("output_path", config.output_path())?;
    validate_positive_number("group_size", config.group_size(), 1)?;
    validate_positive_number("round", config.round() as usize, 1)?;

    if let Some(template) = config.results_template() {
        validate_path("results_template", template)?;
    }

    config.scorecard_grid().validate_fits_page("layout.scorecard")?;
    config.namecard_grid().validate_fits_page("layout.namecard")?;
    Ok(())
}
