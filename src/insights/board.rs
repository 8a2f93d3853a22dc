use super::{Forecast, SpreadReport};
use dashmap::DashMap;
use std::sync::Arc;

/// Latest published insights for one currency pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairInsights {
    pub spread: Option<SpreadReport>,
    pub forecast: Option<Forecast>,
}

/// Per-pair view of what the analyzers last computed. Cloning shares state.
#[derive(Clone, Default)]
pub struct InsightBoard {
    inner: Arc<DashMap<String, PairInsights>>,
}

impl InsightBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_spread(&self, report: SpreadReport) {
        let pair = report.pair.clone();
        self.inner.entry(pair).or_default().spread = Some(report);
    }

    pub fn publish_forecast(&self, forecast: Forecast) {
        let pair = forecast.pair.clone();
        self.inner.entry(pair).or_default().forecast = Some(forecast);
    }

    pub fn get(&self, pair: &str) -> Option<PairInsights> {
        self.inner.get(pair).map(|r| r.clone())
    }

    pub fn pairs(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }
}
