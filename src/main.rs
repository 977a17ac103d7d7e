use clap::Parser;
use richart_etl::utils::error::ErrorSeverity;
use richart_etl::utils::{logger, validation::Validate};
use richart_etl::{
    CliConfig, Credentials, EtlEngine, EtlError, LocalStorage, MerchantClient, RichartPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting richart-etl");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), EtlError> {
    let config = cli.load_integration_config()?;
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated");

    let storage = LocalStorage::new(cli.data_dir.clone());
    let api = MerchantClient::new(&config.api)?;
    let pipeline = RichartPipeline::new(storage, config, api);

    if cli.dry_run {
        let engine = EtlEngine::new_with_monitoring(pipeline, cli.monitor);
        let transformed = engine.dry_run().await?;

        println!("🔍 Dry run: {} merged records", transformed.merged_count);
        for batch in &transformed.batches {
            println!(
                "  - {}: {} records, {} would be uploaded",
                batch.label,
                batch.partition_size,
                batch.records.len()
            );
        }
        return Ok(());
    }

    let credentials = Credentials::from_env_file(&cli.env_file)?;
    let pipeline = pipeline.with_credentials(credentials);

    let engine = EtlEngine::new_with_monitoring(pipeline, cli.monitor);
    let report = engine.run().await?;

    println!("✅ ETL process completed successfully!");
    println!(
        "📦 {} of {} products uploaded to merchant {}",
        report.succeeded, report.attempted, report.merchant_id
    );
    if !report.failures.is_empty() {
        println!("⚠️ {} uploads were rejected:", report.failures.len());
        for failure in &report.failures {
            println!(
                "  #{} SKU {} -> HTTP {}: {}",
                failure.error_id, failure.payload.sku, failure.status, failure.response
            );
        }
    }

    Ok(())
}
