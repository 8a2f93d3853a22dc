pub mod board;

use crate::errors::InsufficientData;
use crate::models::Summary;
use crate::orderbook::aggregator::fmt_price;
use crate::runner::Stage;
use crate::store::QuoteStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
pub use board::{InsightBoard, PairInsights};

/// Spread statistics over a pair's summary history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadReport {
    pub pair: String,
    /// Spread of the most recently appended summary, if it had both sides.
    pub latest: Option<Decimal>,
    pub max: Decimal,
    /// Summaries that contributed a spread.
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub pair: String,
    pub next_mid_price: Decimal,
    /// Timestamp of the newest summary the forecast was built from.
    pub based_on: DateTime<Utc>,
}

/// `highest_ask - lowest_bid` over every summary of `pair` that has both.
pub fn max_spread(pair: &str, summaries: &[Summary]) -> Result<SpreadReport, InsufficientData> {
    let summaries: Vec<&Summary> = summaries.iter().filter(|s| s.pair == pair).collect();
    let Some(last) = summaries.last() else {
        return Err(InsufficientData::NoSummariesForPair(pair.to_string()));
    };

    let spreads: Vec<Decimal> = summaries.iter().filter_map(|s| s.spread()).collect();
    let max = spreads
        .iter()
        .copied()
        .max()
        .ok_or_else(|| InsufficientData::UndefinedExtremum(pair.to_string()))?;

    Ok(SpreadReport {
        pair: pair.to_string(),
        latest: last.spread(),
        max,
        samples: spreads.len(),
    })
}

/// Two-point moving average of the most recent mid prices of `pair`.
///
/// Summaries are ordered by timestamp, newest first; on equal timestamps the
/// later-appended summary counts as newer.
pub fn forecast_next_mid(pair: &str, summaries: &[Summary]) -> Result<Forecast, InsufficientData> {
    let mut recent: Vec<&Summary> = summaries.iter().rev().filter(|s| s.pair == pair).collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let window = &recent[..recent.len().min(2)];
    let Some(newest) = window.first() else {
        return Err(InsufficientData::NoSummariesForPair(pair.to_string()));
    };

    let mids = window
        .iter()
        .map(|s| s.mid_price)
        .collect::<Option<Vec<Decimal>>>()
        .ok_or_else(|| InsufficientData::UndefinedExtremum(pair.to_string()))?;

    let next_mid_price = mids.iter().sum::<Decimal>() / Decimal::from(mids.len());

    Ok(Forecast {
        pair: pair.to_string(),
        next_mid_price,
        based_on: newest.timestamp,
    })
}

pub struct SpreadAnalyzer {
    store: QuoteStore,
    board: InsightBoard,
    pair: String,
    print_max_spread: bool,
}

impl SpreadAnalyzer {
    pub fn new(store: QuoteStore, board: InsightBoard, pair: impl Into<String>, print_max_spread: bool) -> Self {
        Self {
            store,
            board,
            pair: pair.into(),
            print_max_spread,
        }
    }
}

impl Stage for SpreadAnalyzer {
    fn name(&self) -> &'static str {
        "spread"
    }

    fn run_cycle(&mut self) -> Result<(), InsufficientData> {
        if self.store.summary_count() == 0 {
            return Err(InsufficientData::NoSummaries);
        }

        let report = max_spread(&self.pair, &self.store.summaries_for(&self.pair))?;

        if self.print_max_spread {
            tracing::info!(
                "[{}] maximum spread: {:.2} (latest: {}, over {} summaries)",
                report.pair,
                report.max,
                fmt_price(report.latest),
                report.samples
            );
        }

        self.board.publish_spread(report);
        Ok(())
    }
}

pub struct ForecastAnalyzer {
    store: QuoteStore,
    board: InsightBoard,
    pair: String,
    print_next_mid_price: bool,
}

impl ForecastAnalyzer {
    pub fn new(
        store: QuoteStore,
        board: InsightBoard,
        pair: impl Into<String>,
        print_next_mid_price: bool,
    ) -> Self {
        Self {
            store,
            board,
            pair: pair.into(),
            print_next_mid_price,
        }
    }
}

impl Stage for ForecastAnalyzer {
    fn name(&self) -> &'static str {
        "forecast"
    }

    fn run_cycle(&mut self) -> Result<(), InsufficientData> {
        if self.store.summary_count() == 0 {
            return Err(InsufficientData::NoSummaries);
        }

        let forecast = forecast_next_mid(&self.pair, &self.store.summaries_for(&self.pair))?;

        if self.print_next_mid_price {
            tracing::info!(
                "[{}] predicted next mid price: {}",
                forecast.pair,
                forecast.next_mid_price
            );
        }

        self.board.publish_forecast(forecast);
        Ok(())
    }
}
