pub mod cli;
pub mod credentials;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use toml_config::IntegrationConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "richart-etl")]
#[command(about = "Clean Richart's CSV exports and push the top-priced products to the merchant API")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// KEY=value file with CLIENT_ID, CLIENT_SECRET and GRANT_TYPE
    #[arg(long, default_value = "local.env")]
    pub env_file: String,

    /// Directory the CSV files and outputs are resolved against
    #[arg(long, default_value = ".")]
    pub data_dir: String,

    /// Price/stock CSV (overrides source.prices_file)
    #[arg(long)]
    pub prices: Option<String>,

    /// Product catalog CSV (overrides source.products_file)
    #[arg(long)]
    pub products: Option<String>,

    /// Merchant to activate and upload to (overrides merchant.name)
    #[arg(long)]
    pub merchant: Option<String>,

    /// Merchant API base URL (overrides api.base_url)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Where to write the JSON upload report (overrides load.report_file)
    #[arg(long)]
    pub report: Option<String>,

    /// Clean, merge and select without calling the API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_integration_config(&self) -> crate::utils::error::Result<IntegrationConfig> {
        let mut config = match &self.config {
            Some(path) => IntegrationConfig::from_file(path)?,
            None => IntegrationConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut IntegrationConfig) {
        if let Some(prices) = &self.prices {
            config.source.prices_file = prices.clone();
        }
        if let Some(products) = &self.products {
            config.source.products_file = products.clone();
        }
        if let Some(merchant) = &self.merchant {
            config.merchant.name = merchant.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(report) = &self.report {
            config.load.report_file = Some(report.clone());
        }
    }
}
