pub mod etl;
pub mod pipeline;
pub mod remap;

pub use crate::domain::model::{MigrationReport, Record, TransformResult};
pub use crate::domain::ports::{Pipeline, TableSink, TableSource};
pub use crate::utils::error::Result;
