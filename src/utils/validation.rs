use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Base URL of the merchant API; only plain `http`/`https` endpoints are accepted.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    let invalid = |reason: String| EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    if url_str.trim().is_empty() {
        return Err(invalid("the merchant API base URL is required".to_string()));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(format!("not an absolute URL ({}); expected e.g. http://localhost:5000", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "the merchant API is reached over http or https, not {}",
            url.scheme()
        )));
    }
    if url.query().is_some() {
        return Err(invalid(
            "endpoints are appended to the base URL, so it cannot carry a query string".to_string(),
        ));
    }
    Ok(())
}

/// A file under the data directory (input export, report or snapshot).
pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    let reason = if path.trim().is_empty() {
        "a file name is required; remove the key to use the default"
    } else if path.contains('\0') {
        "file names cannot contain NUL bytes"
    } else {
        return Ok(());
    };

    Err(EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: path.to_string(),
        reason: reason.to_string(),
    })
}

/// Lower bound for counts such as `selection.top_n` or `api.timeout_seconds`.
pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value >= min_value {
        return Ok(());
    }
    Err(EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("{} must be {} or more", field_name, min_value),
    })
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.base_url", "https://example.com").is_ok());
        assert!(validate_url("api.base_url", "http://localhost:5000").is_ok());
        assert!(validate_url("api.base_url", "").is_err());
        assert!(validate_url("api.base_url", "invalid-url").is_err());
        assert!(validate_url("api.base_url", "ftp://example.com").is_err());
        assert!(validate_url("api.base_url", "http://localhost:5000/?v=1").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("load.report_file", "out/upload-report.json").is_ok());
        assert!(validate_path("load.report_file", "  ").is_err());

        let err = validate_path("source.prices_file", "bad\0.csv").unwrap_err();
        assert!(err.to_string().contains("source.prices_file"));
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("selection.top_n", 100, 1).is_ok());
        let err = validate_positive_number("selection.top_n", 0, 1).unwrap_err();
        assert!(err.to_string().contains("selection.top_n must be 1 or more"));
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("source.prices_file", "PRICES-STOCK.csv", &["csv", "txt"]).is_ok());
        assert!(validate_file_extension("source.prices_file", "PRICES-STOCK.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("source.prices_file", "prices.xlsx", &["csv"]).is_err());
        assert!(validate_file_extension("source.prices_file", "prices", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("merchant.name", "Richard's").is_ok());
        assert!(validate_non_empty_string("merchant.name", "   ").is_err());
    }
}
