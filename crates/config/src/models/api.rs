use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
    /// Versioned route prefix, e.g. `/api/v1`
    pub prefix: String,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            prefix: "/api/v1".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("API绑定地址不能为空"));
        }

        if !self.bind_address.contains(':') {
            return Err(anyhow::anyhow!(
                "API绑定地址格式无效，应为 host:port: {}",
                self.bind_address
            ));
        }

        if !self.prefix.starts_with('/') || self.prefix.ends_with('/') {
            return Err(anyhow::anyhow!(
                "API前缀必须以'/'开头且不能以'/'结尾: {}",
                self.prefix
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        Ok(())
    }
}
