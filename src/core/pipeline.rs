use crate::core::{Pipeline, Record, TableSink, TableSource, TransformResult};
use crate::core::remap::KeyRemap;
use crate::domain::schema::RecordSchema;
use crate::utils::error::Result;

/// One table-to-table migration: scan the legacy table, derive the
/// single-table keys, write into the destination table.
pub struct MigrationPipeline<S: TableSource, K: TableSink> {
    name: String,
    remap: KeyRemap,
    source: S,
    sink: K,
}

impl<S: TableSource, K: TableSink> MigrationPipeline<S, K> {
    pub fn new(name: impl Into<String>, remap: KeyRemap, source: S, sink: K) -> Self {
        Self {
            name: name.into(),
            remap,
            source,
            sink,
        }
    }
}

#[async_trait::async_trait]
impl<S: TableSource, K: TableSink> Pipeline for MigrationPipeline<S, K> {
    fn job_name(&self) -> &str {
        &self.name
    }

    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Scanning source table for job '{}'", self.name);
        let records = self.source.scan_records().await?;

        if records.is_empty() {
            tracing::warn!("⚠️ Source table returned no records, nothing to migrate");
        }

        tracing::info!("📋 Source schema:\n{}", RecordSchema::infer(&records));
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let mut mapped = Vec::with_capacity(data.len());

        // 先衍生新鍵，舊欄位仍在，供 mapped schema 診斷
        for mut record in data {
            self.remap.derive_keys(&mut record)?;
            mapped.push(record);
        }

        let mapped_schema = RecordSchema::infer(&mapped);
        tracing::info!("📋 Mapped schema:\n{}", mapped_schema);

        // 再移除舊鍵欄位
        for record in &mut mapped {
            for field in self.remap.dropped_fields() {
                record.remove(field);
            }
        }

        let output_schema = RecordSchema::infer(&mapped);
        tracing::info!("📋 Output schema:\n{}", output_schema);

        if let Some(first) = mapped.first() {
            tracing::debug!(
                "First output record: {}",
                serde_json::to_string_pretty(first)?
            );
        }

        Ok(TransformResult {
            records: mapped,
            mapped_schema,
            output_schema,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<usize> {
        tracing::debug!(
            "Writing {} records for job '{}'",
            result.records.len(),
            self.name
        );
        let written = self.sink.write_records(result.records).await?;
        Ok(written)
    }
}
