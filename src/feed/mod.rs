pub mod simulator;

use crate::errors::{FeedError, QuoteError};
use crate::models::{Quote, Side};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
pub use simulator::{FeedSimulator, IngestStats};

/// Deepest book a single generated message may carry per side.
pub const MAX_LEVELS_PER_SIDE: usize = 1_000;

/// A simulated market, parameterized by the fair price distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPair {
    pub name: String,
    pub mean: f64,
    pub std_dev: f64,
}

impl CurrencyPair {
    pub fn new(name: impl Into<String>, mean: f64, std_dev: f64) -> Self {
        Self {
            name: name.into(),
            mean,
            std_dev,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("BTC-NOK", 820_000.0, 5_000.0),
            Self::new("ETH-NOK", 29_000.0, 400.0),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Snapshot,
    Update,
}

/// Level-2 channel message, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Level2Message {
    /// Full book state: `[price, size]` per level.
    Snapshot {
        product_id: String,
        bids: Vec<[String; 2]>,
        asks: Vec<[String; 2]>,
    },
    /// Changes since the last message: `[buy|sell, price, size]`.
    L2update {
        product_id: String,
        time: DateTime<Utc>,
        changes: Vec<[String; 3]>,
    },
}

impl Level2Message {
    pub fn product_id(&self) -> &str {
        match self {
            Level2Message::Snapshot { product_id, .. } => product_id,
            Level2Message::L2update { product_id, .. } => product_id,
        }
    }

    /// Converts every level or change into a quote. Each entry fails on its own,
    /// so one malformed level does not discard the rest of the message.
    pub fn into_quotes(self, received_at: DateTime<Utc>) -> Vec<Result<Quote, QuoteError>> {
        match self {
            Level2Message::Snapshot {
                product_id,
                bids,
                asks,
            } => {
                let bids = bids
                    .iter()
                    .map(|[price, size]| Quote::parse(&product_id, Side::Bid, price, size, received_at));
                let asks = asks
                    .iter()
                    .map(|[price, size]| Quote::parse(&product_id, Side::Ask, price, size, received_at));
                bids.chain(asks).collect()
            }
            Level2Message::L2update {
                product_id,
                time,
                changes,
            } => changes
                .iter()
                .map(|[direction, price, size]| {
                    let side = Side::from_direction(direction)?;
                    Quote::parse(&product_id, side, price, size, time)
                })
                .collect(),
        }
    }
}

struct PairModel {
    name: String,
    bid_price: Normal<f64>,
    ask_price: Normal<f64>,
}

/// Draws synthetic level-2 batches from per-pair normal price models.
pub struct FeedGenerator {
    pairs: Vec<PairModel>,
    size: Normal<f64>,
    levels_per_side: usize,
    rng: StdRng,
}

impl FeedGenerator {
    pub fn new(
        pairs: &[CurrencyPair],
        levels_per_side: usize,
        seed: Option<u64>,
    ) -> Result<Self, FeedError> {
        if pairs.is_empty() {
            return Err(FeedError::NoPairs);
        }
        if levels_per_side == 0 {
            return Err(FeedError::NoLevels);
        }
        if levels_per_side > MAX_LEVELS_PER_SIDE {
            return Err(FeedError::TooManyLevels(levels_per_side));
        }

        let pairs = pairs
            .iter()
            .map(|p| {
                let invalid = || FeedError::InvalidDistribution {
                    pair: p.name.clone(),
                    mean: p.mean,
                    std_dev: p.std_dev,
                };
                if !p.mean.is_finite() {
                    return Err(invalid());
                }
                // bids sit below the fair price, asks above
                let bid_price = Normal::new(p.mean - 2.0 * p.std_dev, p.std_dev).map_err(|_| invalid())?;
                let ask_price = Normal::new(p.mean + 2.0 * p.std_dev, p.std_dev).map_err(|_| invalid())?;
                Ok(PairModel {
                    name: p.name.clone(),
                    bid_price,
                    ask_price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let size = Normal::new(0.5, 0.3).map_err(|_| FeedError::InvalidDistribution {
            pair: "size".to_string(),
            mean: 0.5,
            std_dev: 0.3,
        })?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            pairs,
            size,
            levels_per_side,
            rng,
        })
    }

    /// Produces one message per configured pair.
    pub fn generate_batch(&mut self, kind: BatchKind) -> Vec<Level2Message> {
        let mut batch = Vec::with_capacity(self.pairs.len());

        for idx in 0..self.pairs.len() {
            let mut bids = Vec::with_capacity(self.levels_per_side);
            let mut asks = Vec::with_capacity(self.levels_per_side);

            for _ in 0..self.levels_per_side {
                let (bid, ask) = self.draw_levels(idx);
                bids.push(bid);
                asks.push(ask);
            }

            let product_id = self.pairs[idx].name.clone();
            let message = match kind {
                BatchKind::Snapshot => Level2Message::Snapshot {
                    product_id,
                    bids,
                    asks,
                },
                BatchKind::Update => Level2Message::L2update {
                    product_id,
                    time: Utc::now(),
                    changes: bids
                        .into_iter()
                        .map(|[price, size]| ["buy".to_string(), price, size])
                        .chain(asks.into_iter().map(|[price, size]| ["sell".to_string(), price, size]))
                        .collect(),
                },
            };
            batch.push(message);
        }

        batch
    }

    fn draw_levels(&mut self, idx: usize) -> ([String; 2], [String; 2]) {
        let model = &self.pairs[idx];
        let bid_price = model.bid_price.sample(&mut self.rng);
        let ask_price = model.ask_price.sample(&mut self.rng);
        // zero size means the level has no order anymore
        let bid_size = self.size.sample(&mut self.rng).max(0.0);
        let ask_size = self.size.sample(&mut self.rng).max(0.0);

        (
            [format!("{bid_price:.2}"), format!("{bid_size:.8}")],
            [format!("{ask_price:.2}"), format!("{ask_size:.8}")],
        )
    }
}
