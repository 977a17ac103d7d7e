use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub api: ApiConfig,
    pub merchant: MerchantConfig,
    pub source: SourceConfig,
    pub selection: SelectionConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_header: String,
    pub token_settle_ms: u64,
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token_header: "token".to_string(),
            token_settle_ms: 1000,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantConfig {
    /// Name used to look the merchant up.
    pub name: String,
    /// Name written back when the merchant is activated.
    pub display_name: String,
    pub can_be_deleted: bool,
    pub can_be_updated: bool,
    pub delete_store: Option<String>,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            name: "Richard's".to_string(),
            display_name: "Richards".to_string(),
            can_be_deleted: true,
            can_be_updated: true,
            delete_store: Some("Beauty".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub prices_file: String,
    pub products_file: String,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            prices_file: "PRICES-STOCK.csv".to_string(),
            products_file: "PRODUCTS.csv".to_string(),
            delimiter: '|',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub branches: Vec<String>,
    pub partition_branch: String,
    pub top_n: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            branches: vec!["MM".to_string(), "RHSM".to_string()],
            partition_branch: "MM".to_string(),
            top_n: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub report_file: Option<String>,
    pub snapshot_file: Option<String>,
}

impl IntegrationConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown names are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Store removed after activation; an empty name in the TOML disables the step.
    pub fn store_to_delete(&self) -> Option<&str> {
        self.merchant
            .delete_store
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        let c = self.source.delimiter;
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(EtlError::InvalidConfigValueError {
                field: "source.delimiter".to_string(),
                value: c.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            })
        }
    }
}

impl Validate for IntegrationConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_non_empty_string("api.token_header", &self.api.token_header)?;
        if let Some(timeout) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", timeout as usize, 1)?;
        }

        validate_non_empty_string("merchant.name", &self.merchant.name)?;
        validate_non_empty_string("merchant.display_name", &self.merchant.display_name)?;

        validate_path("source.prices_file", &self.source.prices_file)?;
        validate_path("source.products_file", &self.source.products_file)?;
        validate_file_extension("source.prices_file", &self.source.prices_file, &["csv", "txt"])?;
        validate_file_extension("source.products_file", &self.source.products_file, &["csv", "txt"])?;
        self.delimiter_byte()?;

        if self.selection.branches.is_empty() {
            return Err(EtlError::InvalidConfigValueError {
                field: "selection.branches".to_string(),
                value: "[]".to_string(),
                reason: "At least one branch must be allowed".to_string(),
            });
        }
        if !self.selection.branches.contains(&self.selection.partition_branch) {
            return Err(EtlError::InvalidConfigValueError {
                field: "selection.partition_branch".to_string(),
                value: self.selection.partition_branch.clone(),
                reason: format!(
                    "Must be one of the allowed branches: {}",
                    self.selection.branches.join(", ")
                ),
            });
        }
        validate_positive_number("selection.top_n", self.selection.top_n, 1)?;

        if let Some(report) = &self.load.report_file {
            validate_path("load.report_file", report)?;
        }
        if let Some(snapshot) = &self.load.snapshot_file {
            validate_path("load.snapshot_file", snapshot)?;
        }

        Ok(())
    }
}
