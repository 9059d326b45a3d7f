use orgair_domain::{ContractValidator, SectorConfig, SectorConfigContract};
use orgair_errors::OrgAirResult;
use orgair_infrastructure::{
    sector_cache_key, CacheMetrics, CacheStats, CacheStore, ALL_SECTORS_KEY, SECTORS_PREFIX,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::assembler::SectorConfigAssembler;

/// 同一个键的在途加载状态
#[derive(Debug, Default)]
struct InflightLoad {
    /// 领头调用方已确认该行业不存在或存储不可用
    absent: bool,
}

struct InflightEntry {
    slot: Arc<tokio::sync::Mutex<InflightLoad>>,
    holders: usize,
}

type InflightMap = Mutex<HashMap<String, InflightEntry>>;

/// 在途条目的持有凭证
///
/// drop 时释放，调用方的 future 被取消也会执行。
struct InflightGuard<'a> {
    inflight: &'a InflightMap,
    key: String,
    slot: Arc<tokio::sync::Mutex<InflightLoad>>,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = inflight.get_mut(&self.key) {
            entry.holders = entry.holders.saturating_sub(1);
            if entry.holders == 0 {
                inflight.remove(&self.key);
            }
        }
    }
}

/// 行业配置缓存服务
///
/// 读穿透流程：查缓存 → 组装 → 校验 → 写缓存。只有通过合约校验的实体才会
/// 被缓存，缓存命中时也会重新校验。同一个键的并发未命中只会触发一次加载。
pub struct SectorConfigService {
    assembler: SectorConfigAssembler,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    metrics: CacheMetrics,
    inflight: InflightMap,
}

impl SectorConfigService {
    pub fn new(assembler: SectorConfigAssembler, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            assembler,
            cache,
            ttl,
            metrics: CacheMetrics::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 当前启用的行业 id，直接查询存储，不经过缓存
    pub async fn sector_ids(&self) -> OrgAirResult<Vec<String>> {
        self.assembler.active_sector_ids().await
    }

    /// 获取单个行业的合约
    ///
    /// 行业不存在或存储不可用时返回 `Ok(None)`；数据违约时返回合约错误。
    pub async fn get(&self, sector_id: &str) -> OrgAirResult<Option<SectorConfigContract>> {
        let cache_key = sector_cache_key(sector_id);

        if let Some(cached) = self.cache.get(&cache_key) {
            if let Some(contract) = self.decode_cached(&cache_key, sector_id, &cached)? {
                return Ok(Some(contract));
            }
        }

        let inflight = self.join_inflight(&cache_key);
        let mut state = inflight.slot.lock().await;

        // 等待期间可能已有其他调用方完成加载，复查不计入统计
        if let Some(cached) = self.cache.peek(&cache_key) {
            if let Some(contract) = self.decode_cached(&cache_key, sector_id, &cached)? {
                return Ok(Some(contract));
            }
        }
        if state.absent {
            debug!(sector_id, cache_key, "sector_config_absent_shared");
            return Ok(None);
        }

        self.metrics.record_miss();
        let result = self.load(&cache_key, sector_id).await;
        if matches!(result, Ok(None)) {
            state.absent = true;
        }

        result
    }

    /// 获取所有启用行业的合约，违约的行业会被跳过
    pub async fn get_all(&self) -> OrgAirResult<Vec<SectorConfigContract>> {
        if let Some(contracts) = self
            .cache
            .get(ALL_SECTORS_KEY)
            .and_then(|cached| self.decode_cached_all(&cached))
        {
            return Ok(contracts);
        }

        let inflight = self.join_inflight(ALL_SECTORS_KEY);
        let _state = inflight.slot.lock().await;

        if let Some(contracts) = self
            .cache
            .peek(ALL_SECTORS_KEY)
            .and_then(|cached| self.decode_cached_all(&cached))
        {
            return Ok(contracts);
        }

        self.metrics.record_miss();
        self.load_all().await
    }

    /// 使缓存失效
    ///
    /// 指定行业时删除该行业的条目；批量列表条目总是被删除。返回删除的条目数。
    pub fn invalidate(&self, sector_id: Option<&str>) -> usize {
        let mut removed = 0;
        if let Some(sector_id) = sector_id {
            if self.cache.delete(&sector_cache_key(sector_id)) {
                removed += 1;
            }
        }
        removed += self.cache.invalidate_prefix(SECTORS_PREFIX);

        self.metrics.record_invalidation();
        info!(sector_id, removed, "sector_cache_invalidated");

        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn decode_cached(
        &self,
        cache_key: &str,
        sector_id: &str,
        cached: &str,
    ) -> OrgAirResult<Option<SectorConfigContract>> {
        let entity = match SectorConfig::from_cache_value(cached) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(sector_id, cache_key, error = %e, "缓存条目无法解析，重新加载");
                self.cache.delete(cache_key);
                return Ok(None);
            }
        };

        match ContractValidator::validate_entity(&entity) {
            Ok(contract) => {
                self.metrics.record_hit();
                debug!(sector_id, cache_key, "sector_cache_hit");
                Ok(Some(contract))
            }
            Err(failure) => {
                self.cache.delete(cache_key);
                self.metrics.record_contract_violation();
                error!(
                    sector_id,
                    cache_key,
                    violations = %failure,
                    "sector_config_contract_invalid"
                );
                Err(failure.into_error(sector_id))
            }
        }
    }

    async fn load(
        &self,
        cache_key: &str,
        sector_id: &str,
    ) -> OrgAirResult<Option<SectorConfigContract>> {
        let started = Instant::now();
        let assembled = self.assembler.assemble(sector_id).await;

        let entity = match assembled {
            Ok(Some(entity)) => {
                self.metrics
                    .record_store_load(started.elapsed().as_secs_f64());
                entity
            }
            Ok(None) => {
                self.metrics
                    .record_store_load(started.elapsed().as_secs_f64());
                info!(sector_id, "sector_config_not_found");
                return Ok(None);
            }
            Err(e) if e.is_store_unavailable() => {
                self.metrics.record_store_failure();
                warn!(sector_id, error = %e, "sector_config_db_unavailable");
                return Ok(None);
            }
            Err(e) if e.is_store_error() => {
                self.metrics.record_store_failure();
                error!(sector_id, error = %e, "sector_config_db_error");
                return Ok(None);
            }
            Err(e) => {
                if e.is_contract_violation() {
                    self.metrics.record_contract_violation();
                    error!(sector_id, error = %e, "sector_config_contract_invalid");
                }
                return Err(e);
            }
        };

        let contract = match ContractValidator::validate_entity(&entity) {
            Ok(contract) => contract,
            Err(failure) => {
                self.metrics.record_contract_violation();
                error!(sector_id, violations = %failure, "sector_config_contract_invalid");
                return Err(failure.into_error(sector_id));
            }
        };

        self.cache
            .set(cache_key, entity.to_cache_value()?, self.ttl);
        info!(
            sector_id,
            cache_key,
            ttl_seconds = self.ttl.as_secs(),
            "sector_config_loaded"
        );

        Ok(Some(contract))
    }

    fn decode_cached_all(&self, cached: &str) -> Option<Vec<SectorConfigContract>> {
        let entities: Vec<SectorConfig> = match serde_json::from_str(cached) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(cache_key = ALL_SECTORS_KEY, error = %e, "缓存条目无法解析，重新加载");
                self.cache.delete(ALL_SECTORS_KEY);
                return None;
            }
        };

        let total = entities.len();
        let contracts = self.validate_each(&entities);
        if contracts.len() != total {
            // 只保留可信的条目，下次读取重新加载
            self.cache.delete(ALL_SECTORS_KEY);
        }

        self.metrics.record_hit();
        debug!(cache_key = ALL_SECTORS_KEY, count = contracts.len(), "sector_cache_hit");
        Some(contracts)
    }

    async fn load_all(&self) -> OrgAirResult<Vec<SectorConfigContract>> {
        let started = Instant::now();

        let entities = match self.assembler.assemble_all().await {
            Ok(entities) => entities,
            Err(e) => {
                self.metrics.record_store_failure();
                warn!(error = %e, "sector_configs_db_unavailable");
                return Ok(Vec::new());
            }
        };
        self.metrics
            .record_store_load(started.elapsed().as_secs_f64());

        let contracts = self.validate_each(&entities);
        let valid: Vec<&SectorConfig> = entities
            .iter()
            .filter(|entity| {
                contracts
                    .iter()
                    .any(|contract| contract.sector_id() == entity.focus_group_id)
            })
            .collect();

        self.cache
            .set(ALL_SECTORS_KEY, serde_json::to_string(&valid)?, self.ttl);
        info!(
            cache_key = ALL_SECTORS_KEY,
            loaded = entities.len(),
            cached = valid.len(),
            "sector_configs_loaded"
        );

        Ok(contracts)
    }

    fn validate_each(&self, entities: &[SectorConfig]) -> Vec<SectorConfigContract> {
        entities
            .iter()
            .filter_map(|entity| match ContractValidator::validate_entity(entity) {
                Ok(contract) => Some(contract),
                Err(failure) => {
                    self.metrics.record_contract_violation();
                    error!(
                        sector_id = %entity.focus_group_id,
                        violations = %failure,
                        "sector_config_contract_invalid"
                    );
                    None
                }
            })
            .collect()
    }

    fn join_inflight(&self, cache_key: &str) -> InflightGuard<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = inflight
            .entry(cache_key.to_string())
            .or_insert_with(|| InflightEntry {
                slot: Arc::new(tokio::sync::Mutex::new(InflightLoad::default())),
                holders: 0,
            });
        entry.holders += 1;

        InflightGuard {
            inflight: &self.inflight,
            key: cache_key.to_string(),
            slot: Arc::clone(&entry.slot),
        }
    }
}
