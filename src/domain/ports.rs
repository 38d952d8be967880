use crate::domain::model::{Record, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read side of a migration: one full scan of the source table.
pub trait TableSource: Send + Sync {
    fn scan_records(&self) -> impl std::future::Future<Output = Result<Vec<Record>>> + Send;
}

/// Write side of a migration. Returns the number of records written.
pub trait TableSink: Send + Sync {
    fn write_records(
        &self,
        records: Vec<Record>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn job_name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<usize>;
}
