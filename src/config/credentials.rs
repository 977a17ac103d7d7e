use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// OAuth client-credentials read from a `KEY=value` file such as `local.env`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        grant_type: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: grant_type.into(),
        }
    }

    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read credentials file {}: {}", path.display(), e),
        })?;
        Self::from_content(&content)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_content(&content)
    }

    /// Parses dotenv syntax. Unquoted values must come out exactly as written:
    /// a value that `$VAR` expansion or escapes would alter is rejected, and
    /// has to be wrapped in single quotes to be taken literally.
    fn from_content(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let mut next_line = 0usize;
        let mut vars = HashMap::new();

        for pair in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) = pair.map_err(|e| EtlError::ConfigError {
                message: format!(
                    "malformed credentials line: {} (quote values containing quotes or '$')",
                    e
                ),
            })?;

            if let Some((index, raw)) = find_assignment(&lines, next_line, &key) {
                next_line = index + 1;
                if !is_quoted(raw) && raw != value {
                    return Err(EtlError::ConfigError {
                        message: format!(
                            "{} is altered by variable expansion; wrap it in single quotes to keep it literal",
                            key
                        ),
                    });
                }
            }
            vars.insert(key, value);
        }

        let mut take = |key: &str| {
            vars.remove(key)
                .ok_or_else(|| EtlError::MissingConfigError {
                    field: key.to_string(),
                })
        };

        let credentials = Self {
            client_id: take("CLIENT_ID")?,
            client_secret: take("CLIENT_SECRET")?,
            grant_type: take("GRANT_TYPE")?,
        };
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Raw, unparsed value of the first `KEY=` line at or after `from`.
fn find_assignment<'a>(lines: &[&'a str], from: usize, key: &str) -> Option<(usize, &'a str)> {
    lines.iter().enumerate().skip(from).find_map(|(index, line)| {
        let line = line.trim_start();
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (name, raw) = line.split_once('=')?;
        if name.trim() != key {
            return None;
        }
        let raw = match raw.find(" #") {
            Some(comment) => &raw[..comment],
            None => raw,
        };
        Some((index, raw.trim()))
    })
}

fn is_quoted(raw: &str) -> bool {
    raw.starts_with('\'') || raw.starts_with('"')
}

impl Validate for Credentials {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("CLIENT_ID", &self.client_id)?;
        validate_non_empty_string("CLIENT_SECRET", &self.client_secret)?;
        validate_non_empty_string("GRANT_TYPE", &self.grant_type)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("grant_type", &self.grant_type)
            .finish()
    }
}
