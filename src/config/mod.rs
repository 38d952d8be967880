pub mod toml_config;

use clap::Parser;

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "single-table-etl")]
#[command(about = "Migrates legacy DynamoDB tables into the single-table layout")]
pub struct CliArgs {
    /// Name of the migration job to run (must exist in the config file)
    #[arg(long)]
    pub job_name: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Scan and transform only, skip the final write
    #[arg(long)]
    pub dry_run: bool,
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("job_name", &self.job_name)?;
        validation::validate_path("config", &self.config)?;
        Ok(())
    }
}
