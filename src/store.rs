use crate::models::{Quote, Summary};
use parking_lot::RwLock;
use std::sync::Arc;

/// Insertion-ordered, append-only log shared between tasks.
///
/// Writers take the lock for the whole append, so a snapshot always sees a
/// complete prefix of the log in insertion order.
#[derive(Debug)]
pub struct AppendLog<T> {
    inner: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for AppendLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for AppendLog<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Clone> AppendLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: T) {
        self.inner.write().push(record);
    }

    /// Appends every record under a single lock, so readers see all or none.
    pub fn append_all(&self, records: impl IntoIterator<Item = T>) {
        self.inner.write().extend(records);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.inner.read().clone()
    }

    /// Snapshot restricted to the records matching `keep`, in insertion order.
    pub fn snapshot_where(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.inner.read().iter().filter(|r| keep(r)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Process-wide quote and summary logs. Cloning shares the same logs.
#[derive(Clone, Default)]
pub struct QuoteStore {
    quotes: AppendLog<Quote>,
    summaries: AppendLog<Summary>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_quote(&self, quote: Quote) {
        self.quotes.append(quote);
    }

    pub fn append_quotes(&self, quotes: Vec<Quote>) {
        self.quotes.append_all(quotes);
    }

    pub fn append_summary(&self, summary: Summary) {
        self.summaries.append(summary);
    }

    pub fn quotes_snapshot(&self) -> Vec<Quote> {
        self.quotes.snapshot()
    }

    pub fn summaries_snapshot(&self) -> Vec<Summary> {
        self.summaries.snapshot()
    }

    pub fn quotes_for(&self, pair: &str) -> Vec<Quote> {
        self.quotes.snapshot_where(|q| q.pair == pair)
    }

    pub fn summaries_for(&self, pair: &str) -> Vec<Summary> {
        self.summaries.snapshot_where(|s| s.pair == pair)
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    pub fn summary_count(&self) -> usize {
        self.summaries.len()
    }
}
