pub mod aggregator;

use crate::models::{PriceRange, Quote, Side, Summary};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
pub use aggregator::BookAggregator;

/// Active price levels of one currency pair, rebuilt from quote history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    pub pair: String,
    // price → quantity. BTreeMap keeps keys sorted ascending.
    pub bids: BTreeMap<Decimal, Decimal>,
    pub asks: BTreeMap<Decimal, Decimal>,
}

impl OrderBook {
    /// Replays `quotes` and keeps, per (side, price), the quote with the latest
    /// timestamp. Equal timestamps resolve to the later record in the slice.
    /// Levels whose latest quote has zero quantity are left out.
    pub fn from_quotes(pair: &str, quotes: &[Quote]) -> Self {
        let mut latest: BTreeMap<(Side, Decimal), &Quote> = BTreeMap::new();

        for quote in quotes.iter().filter(|q| q.pair == pair) {
            latest
                .entry((quote.side, quote.price))
                .and_modify(|current| {
                    if quote.timestamp >= current.timestamp {
                        *current = quote;
                    }
                })
                .or_insert(quote);
        }

        let mut book = OrderBook {
            pair: pair.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        };

        for ((side, price), quote) in latest {
            if quote.is_removal() {
                continue;
            }
            match side {
                Side::Bid => book.bids.insert(price, quote.quantity),
                Side::Ask => book.asks.insert(price, quote.quantity),
            };
        }

        book
    }

    /// Highest bid price (best price a buyer will pay)
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price (best price a seller will accept)
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn bid_range(&self) -> Option<PriceRange> {
        range_of(&self.bids)
    }

    pub fn ask_range(&self) -> Option<PriceRange> {
        range_of(&self.asks)
    }

    pub fn summarize(&self, timestamp: DateTime<Utc>) -> Summary {
        Summary::new(self.pair.clone(), self.ask_range(), self.bid_range(), timestamp)
    }
}

fn range_of(levels: &BTreeMap<Decimal, Decimal>) -> Option<PriceRange> {
    Some(PriceRange {
        lowest: *levels.keys().next()?,
        highest: *levels.keys().next_back()?,
    })
}
