use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api::ApiConfig,
    cache::{CacheConfig, SectorsConfig},
    database::DatabaseConfig,
    observability::ObservabilityConfig,
};

/// 默认配置文件搜索路径
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config/orgair.toml", "orgair.toml"];

/// 部署环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Staging,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Staging => "staging",
            AppEnvironment::Production => "production",
        }
    }
}

/// Application identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: String,
    pub environment: AppEnvironment,
    pub debug: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "PE Org-AI-R Platform".to_string(),
            version: "4.0.0".to_string(),
            environment: AppEnvironment::Development,
            debug: false,
        }
    }
}

impl AppSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("应用名称不能为空"));
        }

        if self.environment == AppEnvironment::Production && self.debug {
            return Err(anyhow::anyhow!("生产环境必须关闭debug模式"));
        }

        Ok(())
    }
}

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub sectors: SectorsConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (`ORGAIR__DATABASE__MAX_CONNECTIONS=20`)
    /// 4. `DATABASE_URL`, the conventional connection string variable
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder().add_source(
            ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?,
        );

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("ORGAIR")
                .separator("__")
                .try_parsing(true),
        );

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        builder = builder
            .set_override_option("database.url", database_url)
            .context("设置DATABASE_URL失败")?;

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.app.validate().context("应用配置验证失败")?;
        self.database.validate().context("数据库配置验证失败")?;
        self.api.validate().context("API配置验证失败")?;
        self.cache.validate().context("缓存配置验证失败")?;
        self.sectors.validate().context("行业配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}
