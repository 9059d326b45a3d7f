use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_SECTOR_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Read-through cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for `sector:<id>` and `sectors:all` entries (default: 1 hour)
    pub sector_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sector_ttl_seconds: 3600,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sector_ttl_seconds == 0 || self.sector_ttl_seconds > MAX_SECTOR_TTL_SECONDS {
            return Err(anyhow::anyhow!(
                "行业配置缓存TTL必须在1到{}秒之间，当前为 {}",
                MAX_SECTOR_TTL_SECONDS,
                self.sector_ttl_seconds
            ));
        }
        Ok(())
    }

    pub fn sector_ttl(&self) -> Duration {
        Duration::from_secs(self.sector_ttl_seconds)
    }
}

/// Which records in the store belong to this deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorsConfig {
    pub platform: String,
}

impl Default for SectorsConfig {
    fn default() -> Self {
        Self {
            platform: "pe_org_air".to_string(),
        }
    }
}

impl SectorsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.platform.trim().is_empty() {
            return Err(anyhow::anyhow!("平台范围不能为空"));
        }
        Ok(())
    }
}
