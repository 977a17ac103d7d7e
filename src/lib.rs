pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{credentials::Credentials, toml_config::IntegrationConfig};
pub use crate::core::{api_client::MerchantClient, etl::EtlEngine, RichartPipeline};
pub use utils::error::{EtlError, Result};
