use crate::errors::QuoteError;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PRICE_DECIMALS: u32 = 2;
pub const QUANTITY_DECIMALS: u32 = 8;

/// Upper bound for a quote price. Keeps every sum of two prices well inside
/// `Decimal`'s range.
pub const MAX_PRICE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Rounds a price to 2 decimals, half-up.
pub fn round_price(value: Decimal) -> Decimal {
    fixed_scale(value, PRICE_DECIMALS)
}

/// Rounds a quantity to 8 decimals, half-up.
pub fn round_quantity(value: Decimal) -> Decimal {
    fixed_scale(value, QUANTITY_DECIMALS)
}

// rounding never widens the scale, so pad it back to exactly `dp` digits
fn fixed_scale(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Maps the direction label of an `l2update` change ("buy"/"sell").
    pub fn from_direction(direction: &str) -> Result<Self, QuoteError> {
        match direction {
            "buy" => Ok(Side::Bid),
            "sell" => Ok(Side::Ask),
            other => Err(QuoteError::UnknownSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// One observed price-level state. A zero quantity removes the level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub pair: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        pair: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, QuoteError> {
        let price = round_price(price);
        let quantity = round_quantity(quantity);

        if price <= Decimal::ZERO {
            return Err(QuoteError::NonPositivePrice(price.to_string()));
        }
        if price > MAX_PRICE {
            return Err(QuoteError::PriceOutOfRange(price.to_string()));
        }
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(QuoteError::NegativeQuantity(quantity.to_string()));
        }

        Ok(Self {
            pair: pair.into(),
            side,
            price,
            quantity,
            timestamp,
        })
    }

    /// Builds a quote from the string fields carried on the wire.
    pub fn parse(
        pair: &str,
        side: Side,
        price: &str,
        quantity: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, QuoteError> {
        let price = parse_decimal(price).ok_or_else(|| QuoteError::InvalidPrice(price.to_string()))?;
        let quantity = parse_decimal(quantity)
            .ok_or_else(|| QuoteError::InvalidQuantity(quantity.to_string()))?;

        Self::new(pair, side, price, quantity, timestamp)
    }

    pub fn is_removal(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Top-of-book state derived in one aggregation cycle.
///
/// A side without active levels has both of its extremums set to `None`,
/// and `mid_price` is `None` unless both `lowest_ask` and `highest_bid` exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub pair: String,
    pub highest_ask: Option<Decimal>,
    pub lowest_ask: Option<Decimal>,
    pub mid_price: Option<Decimal>,
    pub highest_bid: Option<Decimal>,
    pub lowest_bid: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Lowest and highest active price on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub lowest: Decimal,
    pub highest: Decimal,
}

impl Summary {
    pub fn new(
        pair: impl Into<String>,
        asks: Option<PriceRange>,
        bids: Option<PriceRange>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let lowest_ask = asks.map(|r| round_price(r.lowest));
        let highest_bid = bids.map(|r| round_price(r.highest));
        let mid_price = match (lowest_ask, highest_bid) {
            (Some(ask), Some(bid)) => ask
                .checked_add(bid)
                .map(|sum| round_price(sum / Decimal::from(2))),
            _ => None,
        };

        Self {
            pair: pair.into(),
            highest_ask: asks.map(|r| round_price(r.highest)),
            lowest_ask,
            mid_price,
            highest_bid,
            lowest_bid: bids.map(|r| round_price(r.lowest)),
            timestamp,
        }
    }

    /// `highest_ask - lowest_bid`, the widest quoted spread in this summary.
    pub fn spread(&self) -> Option<Decimal> {
        self.highest_ask?.checked_sub(self.lowest_bid?).map(round_price)
    }
}
