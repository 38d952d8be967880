use clap::Parser;
use single_table_etl::config::toml_config::{JobConfig, MigrationConfig};
use single_table_etl::utils::{logger, validation::Validate};
use single_table_etl::{
    build_client, CliArgs, DynamoDbTableSink, DynamoDbTableSource, EtlEngine, MigrationPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting single-table migration tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 驗證命令列參數
    if let Err(e) = args.validate() {
        tracing::error!("❌ Argument validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 載入 TOML 配置
    let config = match MigrationConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 選擇遷移任務
    let job = match config.job(&args.job_name) {
        Ok(job) => job.clone(),
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let source_table = match config.physical_table(&job.source.catalog_table) {
        Ok(table) => table.to_string(),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 顯示任務摘要
    display_job_summary(&config, &job, &args);

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - records will not be written");
    }

    // 建立 DynamoDB 客戶端與來源/寫入端
    let client = build_client(
        config.region().map(str::to_string),
        config.endpoint_url().map(str::to_string),
    )
    .await;

    let source = DynamoDbTableSource::new(client.clone(), source_table)
        .with_page_size(job.source.scan_page_size);

    // dry-run 不讀取寫入容量，也不會寫入
    let throughput_write_percent = if args.dry_run {
        None
    } else {
        job.load.throughput_write_percent
    };
    let sink =
        match DynamoDbTableSink::connect(client, &job.load.table_name, throughput_write_percent)
            .await
        {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!("❌ Failed to connect to destination table: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        };

    let pipeline = MigrationPipeline::new(job.name.clone(), job.remap, source, sink);

    // 建立 ETL 引擎並運行
    let engine =
        EtlEngine::new_with_monitoring(pipeline, monitor_enabled).with_dry_run(args.dry_run);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Migration completed successfully!");
            println!("✅ Migration job '{}' completed successfully!", report.job_name);
            if report.dry_run {
                println!(
                    "🔍 Dry run: {} records scanned, none written",
                    report.records_read
                );
            } else {
                println!(
                    "📤 {} records written to '{}' ({} read) in {:?}",
                    report.records_written, job.load.table_name, report.records_read, report.duration
                );
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                single_table_etl::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                single_table_etl::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                single_table_etl::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                single_table_etl::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_job_summary(config: &MigrationConfig, job: &JobConfig, args: &CliArgs) {
    println!("📋 Migration Summary:");
    println!(
        "  Migration: {} v{}",
        config.migration.name, config.migration.version
    );
    println!("  Database: {}", config.database());
    println!("  Job: {}", job.name);
    if let Some(description) = &job.description {
        println!("  Description: {}", description);
    }
    println!("  Key mapping: {}", job.remap);
    println!(
        "  Source: {} ({})",
        job.source.catalog_table,
        config
            .physical_table(&job.source.catalog_table)
            .unwrap_or("?")
    );
    println!("  Destination: {}", job.load.table_name);
    if let Some(percent) = job.load.throughput_write_percent {
        println!(
            "  Write throughput: {:.0}% of provisioned capacity",
            percent * 100.0
        );
    }
    if let Some(page_size) = job.source.scan_page_size {
        println!("  Scan page size: {}", page_size);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
