use serde::{Deserialize, Serialize};

/// Database configuration
///
/// `url` is optional: without it the service still starts, and every store
/// access reports the store as unavailable instead of failing the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        }
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.url {
            let supported = url.starts_with("postgresql://")
                || url.starts_with("postgres://")
                || url.starts_with("sqlite:");
            if !supported {
                return Err(anyhow::anyhow!(
                    "数据库URL必须是PostgreSQL或SQLite格式: {}",
                    redact(url)
                ));
            }
        }

        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(anyhow::anyhow!("最大连接数必须在1到100之间"));
        }

        if self.min_connections > self.max_connections {
            return Err(anyhow::anyhow!("最小连接数不能大于最大连接数"));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("连接超时时间必须大于0"));
        }

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

/// Strip credentials before a URL reaches an error message or a log line.
pub fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
