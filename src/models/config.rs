//! Application configuration structures.
//!
//! Settings come from an optional TOML file plus CLI overrides; every field
//! has a default so a config file only needs the values it changes. The
//! endpoint section has no usable default and is enforced by [`Config::validate`].

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// SOMS endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Pipeline pacing and limits
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Input file handling
    #[serde(default)]
    pub input: InputConfig,

    /// Output file locations
    #[serde(default)]
    pub output: OutputConfig,

    /// What to extract from each response
    #[serde(default)]
    pub extract: ExtractMode,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values before any request is made.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.base_url.trim().is_empty() {
            return Err(AppError::validation(
                "endpoint.base_url is required (--base-url)",
            ));
        }
        if let Err(e) = Url::parse(&self.endpoint.base_url) {
            return Err(AppError::validation(format!(
                "endpoint.base_url '{}' is not a valid URL: {e}",
                self.endpoint.base_url
            )));
        }
        if self.endpoint.id_usuario.trim().is_empty() {
            return Err(AppError::validation(
                "endpoint.id_usuario is required (--id-usuario)",
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.input.phone_column.trim().is_empty() {
            return Err(AppError::validation("input.phone_column is empty"));
        }
        Ok(())
    }
}

/// SOMS endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the lookup endpoint (QA or PROD)
    #[serde(default)]
    pub base_url: String,

    /// `idUsuario` query parameter sent with every request
    #[serde(default)]
    pub id_usuario: String,
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Verify TLS certificates (off by default; the QA endpoint presents
    /// a self-signed certificate)
    #[serde(default)]
    pub verify_tls: bool,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            verify_tls: false,
            user_agent: defaults::user_agent(),
        }
    }
}

/// Pipeline pacing and limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Delay between requests in seconds
    #[serde(default = "defaults::sleep")]
    pub sleep_secs: u64,

    /// Process at most this many entries; 0 means all
    #[serde(default)]
    pub max_entries: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sleep_secs: defaults::sleep(),
            max_entries: 0,
        }
    }
}

/// Input file handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Column holding the phone value when the input is tabular
    #[serde(default = "defaults::phone_column")]
    pub phone_column: String,

    /// Force the input kind instead of inferring it from the extension
    #[serde(default)]
    pub kind: Option<InputKind>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            phone_column: defaults::phone_column(),
            kind: None,
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Results CSV path
    #[serde(default = "defaults::results_path")]
    pub results_path: PathBuf,

    /// Request audit log CSV path
    #[serde(default = "defaults::log_path")]
    pub log_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: defaults::results_path(),
            log_path: defaults::log_path(),
        }
    }
}

/// What to extract from each SOMS response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Customer ids only
    #[default]
    #[value(name = "id_cliente")]
    IdCliente,

    /// Composed full names only
    Nombre,

    /// Both ids and names
    Ambos,
}

impl ExtractMode {
    /// Whether customer ids are extracted in this mode.
    pub fn wants_ids(&self) -> bool {
        matches!(self, Self::IdCliente | Self::Ambos)
    }

    /// Whether full names are extracted in this mode.
    pub fn wants_names(&self) -> bool {
        matches!(self, Self::Nombre | Self::Ambos)
    }

    /// Column set of the results file for this mode.
    pub fn result_columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["telefono_entrada", "telefono_11", "lada", "telefono_8"];
        if self.wants_ids() {
            columns.push("id_cliente");
        }
        if self.wants_names() {
            columns.push("nombre_completo");
        }
        columns
    }
}

/// Input file kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// One phone-like string per line
    Txt,

    /// Header row plus records; a configured column supplies the phone
    Csv,
}

mod defaults {
    use std::path::PathBuf;

    pub fn timeout() -> u64 {
        30
    }
    pub fn sleep() -> u64 {
        20
    }
    pub fn user_agent() -> String {
        "soms-lookup/0.1".into()
    }
    pub fn phone_column() -> String {
        "valor_medio_contacto".into()
    }
    pub fn results_path() -> PathBuf {
        PathBuf::from("output.csv")
    }
    pub fn log_path() -> PathBuf {
        PathBuf::from("log_requests.csv")
    }
}
