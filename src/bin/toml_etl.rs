use anyhow::Context;
use clap::Parser;
use sales_etl::adapters::csv_io::read_dataset;
use sales_etl::core::aggregate::select_metrics;
use sales_etl::core::ConfigProvider;
use sales_etl::utils::error::ErrorSeverity;
use sales_etl::utils::{logger, validation::Validate};
use sales_etl::{EtlEngine, LocalStorage, SalesPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Run a sales cleaning job described by a TOML file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "sales-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Load the input and show what would be computed without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based sales ETL");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(level) = config.log_level() {
        tracing::debug!("Job requests log level '{}' (set RUST_LOG to apply it)", level);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        return perform_dry_run(&config).await;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = SalesPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    if !config.job.description.is_empty() {
        println!("  Description: {}", config.job.description);
    }
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if let Some(archive) = config.archive_name() {
        println!("  Compression: {} (ZIP)", archive);
    }
    if let Some(limit) = config.preview_limit() {
        println!("  Preview rows: {}", limit);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(config.input_path())
        .await
        .with_context(|| format!("reading input file {}", config.input_path()))?;
    let dataset = read_dataset(&bytes).context("decoding input CSV")?;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📥 Input:");
    println!("  Rows: {}", dataset.len());
    println!("  Columns: {}", dataset.columns().join(", "));

    let cleaning = config.params().cleaning_config();
    let aggregation = config.params().aggregation_config();

    println!();
    println!("🧹 Cleaning:");
    println!("  Normalize column names: {}", cleaning.normalize_columns);
    println!("  Blank cells as missing: {}", cleaning.treat_blank_as_na);
    println!("  Drop duplicates: {}", cleaning.drop_duplicates);
    println!("  Fill missing: {:?}", cleaning.fill_missing);
    println!("  Outliers: {:?}", cleaning.outlier_strategy);

    println!();
    println!("📊 Aggregation:");
    println!(
        "  Amount column: {}",
        aggregation.amount_column.as_deref().unwrap_or("(none)")
    );
    if let Some(group_by) = &aggregation.group_by {
        println!("  Group by: {}", group_by.join(", "));
    }
    if let Some(granularity) = aggregation.date_granularity {
        println!(
            "  Resample '{}' by {}",
            aggregation.date_column.as_deref().unwrap_or("(none)"),
            granularity.code()
        );
    }
    let metrics: Vec<&str> = select_metrics(aggregation.metrics.as_deref())
        .iter()
        .map(|m| m.as_str())
        .collect();
    println!("  Metrics: {}", metrics.join(", "));

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
