use super::{BatchKind, FeedGenerator};
use crate::errors::InsufficientData;
use crate::runner::Stage;
use crate::store::QuoteStore;
use chrono::Utc;

/// Outcome of one ingested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestStats {
    pub appended: usize,
    pub rejected: usize,
}

/// Feeds generated batches into the quote log: a snapshot on the first
/// cycle, incremental updates afterwards.
pub struct FeedSimulator {
    generator: FeedGenerator,
    store: QuoteStore,
    cycles: u64,
    print_quotes: bool,
}

impl FeedSimulator {
    pub fn new(generator: FeedGenerator, store: QuoteStore, print_quotes: bool) -> Self {
        Self {
            generator,
            store,
            cycles: 0,
            print_quotes,
        }
    }

    /// Generates one batch and appends every valid quote in it. Levels that
    /// fail to become quotes are logged and skipped.
    pub fn ingest_batch(&mut self) -> IngestStats {
        let kind = if self.cycles == 0 {
            BatchKind::Snapshot
        } else {
            BatchKind::Update
        };
        self.cycles += 1;

        let mut accepted = Vec::new();
        let mut rejected = 0usize;

        for message in self.generator.generate_batch(kind) {
            tracing::trace!(payload = %serde_json::to_string(&message).unwrap_or_default(), "level2 message");
            let pair = message.product_id().to_string();

            for result in message.into_quotes(Utc::now()) {
                match result {
                    Ok(quote) => accepted.push(quote),
                    Err(e) => {
                        rejected += 1;
                        tracing::warn!(pair = %pair, "Error when creating a quote: {e}");
                    }
                }
            }
        }

        if self.print_quotes {
            for q in &accepted {
                tracing::info!(
                    "[{}] {} {} @ {}",
                    q.pair,
                    q.side,
                    q.quantity,
                    q.price
                );
            }
        }

        let appended = accepted.len();
        self.store.append_quotes(accepted);

        metrics::counter!("quotes_ingested_total").increment(appended as u64);
        metrics::counter!("quotes_rejected_total").increment(rejected as u64);
        tracing::debug!(
            ?kind,
            appended,
            rejected,
            total = self.store.quote_count(),
            "feed batch ingested"
        );

        IngestStats { appended, rejected }
    }
}

impl Stage for FeedSimulator {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn run_cycle(&mut self) -> Result<(), InsufficientData> {
        self.ingest_batch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InsufficientData;
    use crate::feed::CurrencyPair;
    use crate::orderbook::BookAggregator;

    fn simulator(store: QuoteStore) -> FeedSimulator {
        let generator = FeedGenerator::new(&CurrencyPair::defaults(), 2, Some(42)).unwrap();
        FeedSimulator::new(generator, store, true)
    }

    #[test]
    fn every_cycle_grows_the_log() {
        let store = QuoteStore::new();
        let mut sim = simulator(store.clone());

        // 2 pairs x 2 levels x 2 sides
        assert_eq!(sim.ingest_batch(), IngestStats { appended: 8, rejected: 0 });
        assert_eq!(store.quote_count(), 8);

        sim.run_cycle().unwrap();
        assert_eq!(store.quote_count(), 16);
        assert_eq!(store.quotes_for("ETH-NOK").len(), 8);
    }

    #[test]
    fn log_keeps_earlier_quotes_untouched() {
        let store = QuoteStore::new();
        let mut sim = simulator(store.clone());

        sim.ingest_batch();
        let first = store.quotes_snapshot();
        sim.ingest_batch();

        assert_eq!(&store.quotes_snapshot()[..first.len()], first.as_slice());
    }

    #[test]
    fn rejected_levels_are_skipped_and_stream_continues() {
        let pairs = [
            CurrencyPair::new("BTC-NOK", 820_000.0, 5_000.0),
            // every drawn price is non-positive
            CurrencyPair::new("NEG-NOK", -1_000.0, 1.0),
        ];
        let generator = FeedGenerator::new(&pairs, 1, Some(3)).unwrap();
        let store = QuoteStore::new();
        let mut sim = FeedSimulator::new(generator, store.clone(), true);

        assert_eq!(sim.ingest_batch(), IngestStats { appended: 2, rejected: 2 });
        assert_eq!(store.quote_count(), 2);
        assert!(store.quotes_for("NEG-NOK").is_empty());

        // second cycle is an update and still runs
        assert_eq!(sim.run_cycle(), Ok(()));
        assert_eq!(store.quote_count(), 4);
        assert_eq!(store.quotes_for("BTC-NOK").len(), 4);
    }

    #[test]
    fn batch_of_only_invalid_levels_leaves_store_unchanged() {
        let generator =
            FeedGenerator::new(&[CurrencyPair::new("NEG-NOK", -1_000.0, 1.0)], 1, Some(3)).unwrap();
        let store = QuoteStore::new();
        let mut sim = FeedSimulator::new(generator, store.clone(), false);

        assert_eq!(sim.ingest_batch(), IngestStats { appended: 0, rejected: 2 });
        assert!(store.quotes_snapshot().is_empty());
        assert_eq!(sim.run_cycle(), Ok(()));
        assert_eq!(store.quote_count(), 0);
    }

    #[test]
    fn out_of_range_prices_never_reach_the_aggregator() {
        let generator = FeedGenerator::new(&[CurrencyPair::new("BIG", 5e28, 1.0)], 1, Some(1)).unwrap();
        let store = QuoteStore::new();
        let mut sim = FeedSimulator::new(generator, store.clone(), false);
        let mut aggregator = BookAggregator::new(store.clone(), "BIG", false);

        assert_eq!(sim.ingest_batch(), IngestStats { appended: 0, rejected: 2 });
        assert_eq!(aggregator.run_cycle(), Err(InsufficientData::NoQuotes));
        assert_eq!(store.summary_count(), 0);
    }
}
