//! Simulated level-2 order-book feed with rolling top-of-book insights.
//!
//! Four periodic stages share one [`store::QuoteStore`]:
//! the feed simulator appends quotes, the book aggregator turns the quote
//! history of one pair into summaries, and the spread and forecast analyzers
//! publish their results to an [`insights::InsightBoard`].

pub mod config;
pub mod errors;
pub mod feed;
pub mod insights;
pub mod models;
pub mod orderbook;
pub mod runner;
pub mod store;
