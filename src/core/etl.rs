use std::time::Instant;

use chrono::Utc;

use crate::core::Pipeline;
use crate::domain::model::MigrationReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
    dry_run: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one migration end to end. There is no checkpointing: any
    /// error aborts the whole job before a single record is written.
    pub async fn run(&self) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let job_name = self.pipeline.job_name().to_string();

        tracing::info!("🚀 Starting migration job '{}'", job_name);

        // Extract
        tracing::info!("📥 Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        let records_read = raw_data.len();
        tracing::info!("📥 Extracted {} records", records_read);
        self.monitor.log_phase("Extract");

        // Transform
        tracing::info!("🔁 Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!("🔁 Transformed {} records", transformed.records.len());
        self.monitor.log_phase("Transform");

        // Load
        let records_written = if self.dry_run {
            tracing::info!(
                "⏭️ Dry-run: skipping write of {} records",
                transformed.records.len()
            );
            tracing::info!(
                "📋 Records would be written with this schema:\n{}",
                transformed.output_schema
            );
            0
        } else {
            tracing::info!("📤 Loading data...");
            let written = self.pipeline.load(transformed).await?;
            tracing::info!("📤 Wrote {} records", written);
            written
        };
        self.monitor.log_phase("Load");
        self.monitor.log_summary();

        let report = MigrationReport {
            job_name,
            records_read,
            records_written,
            dry_run: self.dry_run,
            started_at,
            duration: timer.elapsed(),
        };
        tracing::info!(
            "✅ Migration job '{}' committed: {} read, {} written in {:?}",
            report.job_name,
            report.records_read,
            report.records_written,
            report.duration
        );
        Ok(report)
    }
}
