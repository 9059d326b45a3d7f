//! Mock implementations of the store access port
//!
//! The mock recognises the sector queries by the table they read from, so it
//! answers whatever SQL text the application sends without parsing it.

use async_trait::async_trait;
use orgair_domain::{StoreAccessPort, StoreRow, StoreValue};
use orgair_errors::{OrgAirError, OrgAirResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::builders::SectorFixture;

/// In-memory sector store for testing
#[derive(Debug, Clone, Default)]
pub struct MockSectorStore {
    fixtures: Arc<Mutex<Vec<SectorFixture>>>,
    round_trips: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    latency: Arc<Mutex<Duration>>,
}

impl MockSectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(fixtures: Vec<SectorFixture>) -> Self {
        let store = Self::new();
        *store.fixtures.lock().unwrap() = fixtures;
        store
    }

    /// Replace the fixture with the same id, or add it
    pub fn upsert(&self, fixture: SectorFixture) {
        let mut fixtures = self.fixtures.lock().unwrap();
        match fixtures
            .iter_mut()
            .find(|existing| existing.focus_group_id == fixture.focus_group_id)
        {
            Some(existing) => *existing = fixture,
            None => fixtures.push(fixture),
        }
    }

    pub fn remove(&self, focus_group_id: &str) {
        self.fixtures
            .lock()
            .unwrap()
            .retain(|fixture| fixture.focus_group_id != focus_group_id);
    }

    /// Simulate an unreachable store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Number of queries received, including failed ones
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn reset_round_trips(&self) {
        self.round_trips.store(0, Ordering::SeqCst);
    }

    async fn begin(&self) -> OrgAirResult<()> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OrgAirError::store_unavailable("connection refused"));
        }
        Ok(())
    }

    fn text_param(params: &[StoreValue], index: usize) -> OrgAirResult<String> {
        params
            .get(index)
            .and_then(StoreValue::as_text)
            .map(str::to_string)
            .ok_or_else(|| OrgAirError::StoreQuery(format!("missing text parameter ${}", index + 1)))
    }

    fn fixture(&self, focus_group_id: &str) -> Option<SectorFixture> {
        self.fixtures
            .lock()
            .unwrap()
            .iter()
            .find(|fixture| fixture.focus_group_id == focus_group_id)
            .cloned()
    }
}

#[async_trait]
impl StoreAccessPort for MockSectorStore {
    async fn fetch_one(
        &self,
        query: &str,
        params: &[StoreValue],
    ) -> OrgAirResult<Option<StoreRow>> {
        self.begin().await?;

        if !query.contains("focus_groups") {
            return Err(OrgAirError::StoreQuery(format!("unexpected query: {query}")));
        }

        let focus_group_id = Self::text_param(params, 0)?;
        let platform = Self::text_param(params, 1)?;

        Ok(self
            .fixture(&focus_group_id)
            .filter(|fixture| fixture.is_active && fixture.platform == platform)
            .map(|fixture| {
                StoreRow::new()
                    .with("focus_group_id", fixture.focus_group_id)
                    .with("group_name", fixture.group_name)
                    .with("group_code", fixture.group_code)
            }))
    }

    async fn fetch_many(&self, query: &str, params: &[StoreValue]) -> OrgAirResult<Vec<StoreRow>> {
        self.begin().await?;

        if query.contains("focus_group_dimension_weights") {
            let focus_group_id = Self::text_param(params, 0)?;
            let weights = self
                .fixture(&focus_group_id)
                .map(|fixture| fixture.weights)
                .unwrap_or_default();
            return Ok(weights
                .into_iter()
                .map(|(code, weight)| {
                    StoreRow::new()
                        .with("dimension_code", code)
                        .with("weight", weight)
                })
                .collect());
        }

        if query.contains("focus_group_calibrations") {
            let focus_group_id = Self::text_param(params, 0)?;
            let mut calibrations = self
                .fixture(&focus_group_id)
                .map(|fixture| fixture.calibrations)
                .unwrap_or_default();
            calibrations.sort_by(|a, b| a.0.cmp(&b.0));
            return Ok(calibrations
                .into_iter()
                .map(|(name, value)| {
                    StoreRow::new()
                        .with("parameter_name", name)
                        .with("parameter_value", value)
                })
                .collect());
        }

        if query.contains("focus_groups") {
            let platform = Self::text_param(params, 0)?;
            let mut active: Vec<SectorFixture> = self
                .fixtures
                .lock()
                .unwrap()
                .iter()
                .filter(|fixture| fixture.is_active && fixture.platform == platform)
                .cloned()
                .collect();
            active.sort_by_key(|fixture| fixture.display_order);
            return Ok(active
                .into_iter()
                .map(|fixture| StoreRow::new().with("focus_group_id", fixture.focus_group_id))
                .collect());
        }

        Err(OrgAirError::StoreQuery(format!("unexpected query: {query}")))
    }
}
