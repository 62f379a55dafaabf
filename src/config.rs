use anyhow::Result;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::models::{VendorConfig, VendorCredentials, VendorType};
use crate::sync::DEFAULT_BATCH_SIZE;

/// Main configuration structure for sungrid
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SungridConfig {
    /// Sync engine tuning
    pub sync: SyncConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Database settings (optional)
    pub database: Option<DatabaseConfig>,
    /// Configured vendor integrations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vendors: Vec<VendorEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Rows per batch upsert
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
    /// Enable vendor API metrics collection
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

/// One vendor integration as written in sungrid.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorEntry {
    /// Stable identifier; plants are keyed against it across sync runs
    pub id: Uuid,
    pub name: String,
    pub vendor_type: VendorType,
    /// Owning organization; sync refuses to run while unset
    pub org_id: Option<Uuid>,
    pub api_base: String,
    pub app_id: String,
    /// Can be left empty and provided via SUNGRID_VENDOR_APP_SECRET
    #[serde(default)]
    pub app_secret: String,
}

impl VendorEntry {
    pub fn to_vendor_config(&self) -> VendorConfig {
        VendorConfig {
            id: self.id,
            org_id: self.org_id,
            vendor_type: self.vendor_type,
            name: self.name.clone(),
            credentials: VendorCredentials {
                api_base: self.api_base.clone(),
                app_id: self.app_id.clone(),
                app_secret: self.app_secret.clone(),
            },
        }
    }
}

impl Default for SungridConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig {
                batch_size: DEFAULT_BATCH_SIZE,
            },
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
                metrics_enabled: true,
            },
            database: Some(DatabaseConfig {
                url: ".sungrid/sungrid.db".to_string(),
                max_connections: 10,
                auto_migrate: true,
            }),
            vendors: Vec::new(),
        }
    }
}

impl SungridConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (sungrid.toml, .sungrid-rc)
    /// 3. Environment variables (prefixed with SUNGRID_)
    pub fn load() -> Result<Self> {
        // Start from default values so partial config files work
        let mut builder = Config::builder().add_source(Config::try_from(&SungridConfig::default())?);

        if Path::new("sungrid.toml").exists() {
            builder = builder.add_source(File::with_name("sungrid"));
        }

        if Path::new(".sungrid-rc").exists() {
            builder = builder.add_source(File::with_name(".sungrid-rc"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SUNGRID")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut sungrid_config: SungridConfig = config.try_deserialize()?;

        // App secrets usually live in the environment, not the config file
        if let Ok(secret) = std::env::var("SUNGRID_VENDOR_APP_SECRET") {
            for vendor in &mut sungrid_config.vendors {
                if vendor.app_secret.is_empty() {
                    vendor.app_secret = secret.clone();
                }
            }
        }

        Ok(sungrid_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn vendor_by_name(&self, name: &str) -> Option<&VendorEntry> {
        self.vendors.iter().find(|vendor| vendor.name == name)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<SungridConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = SungridConfig::load_env_file();
        SungridConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static SungridConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
