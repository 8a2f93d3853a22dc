use thiserror::Error;

/// Raised when a raw feed level cannot become a `Quote`.
#[derive(Debug, Error, PartialEq)]
pub enum QuoteError {
    #[error("invalid price {0:?}")]
    InvalidPrice(String),

    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("price {0} exceeds the supported maximum")]
    PriceOutOfRange(String),

    #[error("quantity must not be negative, got {0}")]
    NegativeQuantity(String),

    #[error("unknown side {0:?}")]
    UnknownSide(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid distribution for {pair}: mean={mean} std_dev={std_dev}")]
    InvalidDistribution { pair: String, mean: f64, std_dev: f64 },

    #[error("feed needs at least one currency pair")]
    NoPairs,

    #[error("levels per side must be at least 1")]
    NoLevels,

    #[error("{0} levels per side exceeds the supported maximum")]
    TooManyLevels(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Why a pipeline cycle produced no output. None of these are failures:
/// the stage logs the reason and waits for the next tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InsufficientData {
    #[error("no quotes available yet")]
    NoQuotes,

    #[error("no quotes for currency pair {0}")]
    NoQuotesForPair(String),

    #[error("no quote summary available yet")]
    NoSummaries,

    #[error("no quote summary for currency pair {0}")]
    NoSummariesForPair(String),

    #[error("book side without active levels for currency pair {0}")]
    UndefinedExtremum(String),
}
