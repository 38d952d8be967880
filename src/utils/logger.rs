use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI 日誌：RUST_LOG 優先，否則依 --verbose 決定預設等級
pub fn init_cli_logger(verbose: bool) {
    let default_directives = if verbose {
        "single_table_etl=debug,info"
    } else {
        "single_table_etl=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}
