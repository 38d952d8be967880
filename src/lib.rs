pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::dynamodb::{build_client, DynamoDbTableSink, DynamoDbTableSource};
pub use crate::config::{toml_config::MigrationConfig, CliArgs};
pub use crate::core::{etl::EtlEngine, pipeline::MigrationPipeline, remap::KeyRemap};
pub use crate::utils::error::{EtlError, Result};
