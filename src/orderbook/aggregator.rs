use super::OrderBook;
use crate::errors::InsufficientData;
use crate::models::Summary;
use crate::runner::Stage;
use crate::store::QuoteStore;
use chrono::Utc;

/// Rebuilds top-of-book for one pair from the full quote history every cycle
/// and appends the resulting summary.
pub struct BookAggregator {
    store: QuoteStore,
    pair: String,
    print_extremums: bool,
}

impl BookAggregator {
    pub fn new(store: QuoteStore, pair: impl Into<String>, print_extremums: bool) -> Self {
        Self {
            store,
            pair: pair.into(),
            print_extremums,
        }
    }

    /// Computes and stores a summary without any logging side effects.
    pub fn aggregate(&self) -> Result<Summary, InsufficientData> {
        if self.store.quote_count() == 0 {
            return Err(InsufficientData::NoQuotes);
        }

        let quotes = self.store.quotes_for(&self.pair);
        if quotes.is_empty() {
            return Err(InsufficientData::NoQuotesForPair(self.pair.clone()));
        }

        let summary = OrderBook::from_quotes(&self.pair, &quotes).summarize(Utc::now());
        self.store.append_summary(summary.clone());
        metrics::counter!("summaries_emitted_total").increment(1);

        Ok(summary)
    }
}

impl Stage for BookAggregator {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    fn run_cycle(&mut self) -> Result<(), InsufficientData> {
        let summary = self.aggregate()?;

        if summary.mid_price.is_none() {
            tracing::debug!(pair = %self.pair, "summary stored with an empty book side");
        }

        if self.print_extremums {
            tracing::info!(
                "[{}] lowest ask: {} highest bid: {} | highest ask: {} lowest bid: {}",
                summary.pair,
                fmt_price(summary.lowest_ask),
                fmt_price(summary.highest_bid),
                fmt_price(summary.highest_ask),
                fmt_price(summary.lowest_bid),
            );
        }

        Ok(())
    }
}

pub(crate) fn fmt_price(price: Option<rust_decimal::Decimal>) -> String {
    price.map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quote, Side};
    use rust_decimal_macros::dec;

    fn seeded_store() -> QuoteStore {
        let store = QuoteStore::new();
        let now = Utc::now();
        store.append_quotes(vec![
            Quote::new("BTC-NOK", Side::Bid, dec!(100.00), dec!(1.0), now).unwrap(),
            Quote::new("BTC-NOK", Side::Ask, dec!(105.00), dec!(1.0), now).unwrap(),
        ]);
        store
    }

    #[test]
    fn empty_store_skips_cycle() {
        let store = QuoteStore::new();
        let mut agg = BookAggregator::new(store.clone(), "BTC-NOK", false);

        assert_eq!(agg.run_cycle(), Err(InsufficientData::NoQuotes));
        assert_eq!(store.summary_count(), 0);
    }

    #[test]
    fn unknown_pair_never_produces_summaries() {
        let store = seeded_store();
        let mut agg = BookAggregator::new(store.clone(), "DOGE-NOK", true);

        for _ in 0..3 {
            assert_eq!(
                agg.run_cycle(),
                Err(InsufficientData::NoQuotesForPair("DOGE-NOK".to_string()))
            );
        }
        assert_eq!(store.summary_count(), 0);
    }

    #[test]
    fn each_cycle_appends_one_summary() {
        let store = seeded_store();
        let mut agg = BookAggregator::new(store.clone(), "BTC-NOK", true);

        agg.run_cycle().unwrap();
        agg.run_cycle().unwrap();

        let summaries = store.summaries_for("BTC-NOK");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].mid_price, Some(dec!(102.50)));
        assert_eq!(summaries[0].highest_bid, summaries[1].highest_bid);
        assert_eq!(summaries[0].lowest_ask, summaries[1].lowest_ask);
        assert!(summaries[0].timestamp <= summaries[1].timestamp);
    }

    #[test]
    fn formats_missing_price() {
        assert_eq!(fmt_price(None), "n/a");
        assert_eq!(fmt_price(Some(dec!(102.5))), "102.50");
    }
}
