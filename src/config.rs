//! Pipeline configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables (a `.env` file in the working directory is loaded
//! into the environment first), then CLI flags applied by the commands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shop_data_gen::{Scale, Volumes};
use std::fs;
use std::path::{Path, PathBuf};

/// Default DuckDB warehouse file
pub const DEFAULT_WAREHOUSE_PATH: &str = "olap.duckdb";

/// Default directory for CSV reports
pub const DEFAULT_REPORT_DIR: &str = "reports";

/// Default rows buffered per INSERT batch
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Default generator seed
pub const DEFAULT_SEED: u64 = 42;

/// Which database holds the normalized source tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    #[default]
    Postgres,
    DuckDb,
}

impl std::str::FromStr for SourceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(SourceBackend::Postgres),
            "duckdb" | "duck" => Ok(SourceBackend::DuckDb),
            _ => Err(format!(
                "Unknown source backend: {}. Valid options: postgres, duckdb",
                s
            )),
        }
    }
}

impl std::fmt::Display for SourceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceBackend::Postgres => write!(f, "postgres"),
            SourceBackend::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Source database connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub backend: SourceBackend,
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub port: u16,
    /// Database file when `backend` is duckdb
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: SourceBackend::Postgres,
            host: "localhost".to_string(),
            database: "ecommerce_source".to_string(),
            user: "postgres".to_string(),
            password: None,
            port: 5432,
            path: PathBuf::from("source.duckdb"),
        }
    }
}

impl SourceConfig {
    /// Human-readable target, never including the password
    pub fn describe(&self) -> String {
        match self.backend {
            SourceBackend::Postgres => format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
            SourceBackend::DuckDb => format!("duckdb:{}", self.path.display()),
        }
    }
}

/// Synthetic data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub batch_size: usize,
    /// Preset volumes; explicit per-table counts below take precedence
    pub scale: Option<String>,
    pub users: Option<usize>,
    pub products: Option<usize>,
    pub orders: Option<usize>,
    pub order_items: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            batch_size: DEFAULT_BATCH_SIZE,
            scale: None,
            users: None,
            products: None,
            orders: None,
            order_items: None,
        }
    }
}

impl GeneratorConfig {
    /// Resolve the row counts to generate per table
    pub fn volumes(&self) -> Result<Volumes> {
        let base = match &self.scale {
            Some(s) => s
                .parse::<Scale>()
                .map_err(|e| anyhow::anyhow!(e))?
                .volumes(),
            None => Volumes::default(),
        };
        Ok(Volumes {
            users: self.users.unwrap_or(base.users),
            products: self.products.unwrap_or(base.products),
            orders: self.orders.unwrap_or(base.orders),
            order_items: self.order_items.unwrap_or(base.order_items),
        })
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub warehouse: PathBuf,
    pub reports: PathBuf,
    pub generator: GeneratorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            warehouse: PathBuf::from(DEFAULT_WAREHOUSE_PATH),
            reports: PathBuf::from(DEFAULT_REPORT_DIR),
            generator: GeneratorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml_ng::from_str(yaml)?;
        Ok(config)
    }

    /// Resolve the configuration for a run: defaults, optional file, `.env`, environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        // A missing .env file is the normal case outside local development.
        let _ = dotenvy::dotenv();

        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values found through `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("DB_BACKEND") {
            self.source.backend = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        }
        if let Some(v) = non_empty("DB_HOST") {
            self.source.host = v;
        }
        if let Some(v) = non_empty("DB_NAME") {
            self.source.database = v;
        }
        if let Some(v) = non_empty("DB_USER") {
            self.source.user = v;
        }
        if let Some(v) = lookup("DB_PASS") {
            self.source.password = Some(v);
        }
        if let Some(v) = non_empty("DB_PORT") {
            self.source.port = v
                .parse()
                .with_context(|| format!("DB_PORT must be a port number, got '{}'", v))?;
        }
        if let Some(v) = non_empty("DB_PATH") {
            self.source.path = PathBuf::from(v);
        }
        if let Some(v) = non_empty("WAREHOUSE_PATH") {
            self.warehouse = PathBuf::from(v);
        }
        if let Some(v) = non_empty("REPORT_DIR") {
            self.reports = PathBuf::from(v);
        }
        Ok(())
    }
}
