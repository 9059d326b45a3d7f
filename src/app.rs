use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use orgair_api::{create_app, handlers::sectors::SectorView, AppState};
use orgair_application::{SectorConfigAssembler, SectorConfigService};
use orgair_config::AppConfig;
use orgair_domain::StoreAccessPort;
use orgair_infrastructure::{DatabasePool, SqlxStore, TtlCache, UnconfiguredStore};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

/// 批量校验结果
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub valid: Vec<SectorView>,
    pub missing: Vec<String>,
    pub invalid: Vec<InvalidSector>,
}

#[derive(Debug, Serialize)]
pub struct InvalidSector {
    pub sector_id: String,
    pub error: String,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    service: Arc<SectorConfigService>,
    pool: Option<DatabasePool>,
    metrics_handle: Option<PrometheusHandle>,
}

impl Application {
    /// 创建应用实例：指标记录器、存储、缓存和配置服务
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!(
            name = %config.app.name,
            version = %config.app.version,
            environment = config.app.environment.as_str(),
            "初始化应用程序"
        );

        // 记录器必须在服务创建之前安装
        let metrics_handle = if config.observability.metrics_enabled {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("安装Prometheus指标记录器失败")?;
            Some(handle)
        } else {
            None
        };

        let (store, pool) = create_store(&config).await?;
        let assembler = SectorConfigAssembler::new(store, config.sectors.platform.clone());
        let service = Arc::new(SectorConfigService::new(
            assembler,
            Arc::new(TtlCache::new()),
            config.cache.sector_ttl(),
        ));

        Ok(Self {
            config,
            service,
            pool,
            metrics_handle,
        })
    }

    /// 使用现成的服务组装应用，不安装全局记录器
    pub fn with_service(config: AppConfig, service: Arc<SectorConfigService>) -> Self {
        Self {
            config,
            service,
            pool: None,
            metrics_handle: None,
        }
    }

    /// 通过缓存服务加载并校验单个行业
    pub async fn validate_sector(&self, sector_id: &str) -> Result<SectorView> {
        let contract = self
            .service
            .get(sector_id)
            .await
            .with_context(|| format!("行业配置 {sector_id} 校验失败"))?
            .ok_or_else(|| anyhow::anyhow!("行业配置不存在或存储不可用: {sector_id}"))?;

        Ok(SectorView::from(&contract))
    }

    /// 逐个校验所有启用的行业
    pub async fn validate_all(&self) -> Result<ValidationReport> {
        let sector_ids = self
            .service
            .sector_ids()
            .await
            .context("查询启用的行业列表失败")?;

        let mut report = ValidationReport::default();
        for sector_id in sector_ids {
            match self.service.get(&sector_id).await {
                Ok(Some(contract)) => report.valid.push(SectorView::from(&contract)),
                Ok(None) => report.missing.push(sector_id),
                Err(e) => report.invalid.push(InvalidSector {
                    sector_id,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            "行业配置校验完成: 通过 {} 个，缺失 {} 个，违约 {} 个",
            report.valid.len(),
            report.missing.len(),
            report.invalid.len()
        );

        Ok(report)
    }

    /// 运行HTTP服务，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if !self.config.api.enabled {
            warn!("API服务被禁用，等待关闭信号");
            let _ = shutdown_rx.recv().await;
            return Ok(());
        }

        let mut state = AppState::new(Arc::clone(&self.service), self.config.app.clone());
        if let Some(handle) = &self.metrics_handle {
            state = state.with_metrics(handle.clone());
        }
        let app = create_app(state, &self.config.api, &self.config.observability);

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }

    /// 释放数据库连接
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

async fn create_store(config: &AppConfig) -> Result<(Arc<dyn StoreAccessPort>, Option<DatabasePool>)> {
    if !config.database.is_configured() {
        warn!("未配置DATABASE_URL，所有行业配置查询将返回空结果");
        let store: Arc<dyn StoreAccessPort> = Arc::new(UnconfiguredStore);
        return Ok((store, None));
    }

    let pool = DatabasePool::connect_lazy(&config.database).context("创建数据库连接池失败")?;

    // 启动时存储不可达不阻止服务启动
    if let Err(e) = pool.health_check().await {
        error!(error = %e, "数据库健康检查失败，存储恢复前行业配置查询将返回空结果");
    } else {
        info!("数据库健康检查通过: {:?}", pool.database_type());
    }

    let store: Arc<dyn StoreAccessPort> = Arc::new(SqlxStore::new(pool.clone()));
    Ok((store, Some(pool)))
}
