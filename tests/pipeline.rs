//! End-to-end run of the four pipeline stages over a shared store.

use l2_insights::feed::{CurrencyPair, FeedGenerator, FeedSimulator};
use l2_insights::insights::{ForecastAnalyzer, InsightBoard, SpreadAnalyzer};
use l2_insights::orderbook::BookAggregator;
use l2_insights::runner::run_periodic;
use l2_insights::store::QuoteStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const PERIOD: Duration = Duration::from_millis(100);

fn spawn_pipeline(
    store: &QuoteStore,
    board: &InsightBoard,
    pair: &str,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let generator = FeedGenerator::new(&CurrencyPair::defaults(), 2, Some(2024)).unwrap();

    vec![
        tokio::spawn(run_periodic(
            FeedSimulator::new(generator, store.clone(), false),
            PERIOD,
            cancel.clone(),
        )),
        tokio::spawn(run_periodic(
            BookAggregator::new(store.clone(), pair, false),
            PERIOD,
            cancel.clone(),
        )),
        tokio::spawn(run_periodic(
            SpreadAnalyzer::new(store.clone(), board.clone(), pair, false),
            PERIOD,
            cancel.clone(),
        )),
        tokio::spawn(run_periodic(
            ForecastAnalyzer::new(store.clone(), board.clone(), pair, false),
            PERIOD,
            cancel.clone(),
        )),
    ]
}

async fn stop(cancel: CancellationToken, handles: Vec<JoinHandle<()>>) {
    cancel.cancel();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("stage should stop after cancellation")
            .expect("stage task should not panic");
    }
}

#[tokio::test(start_paused = true)]
async fn pipeline_produces_insights_for_simulated_pair() {
    let store = QuoteStore::new();
    let board = InsightBoard::new();
    let cancel = CancellationToken::new();

    let handles = spawn_pipeline(&store, &board, "BTC-NOK", &cancel);
    tokio::time::sleep(Duration::from_millis(1_050)).await;
    stop(cancel, handles).await;

    assert!(store.quote_count() >= 8 * 10);
    let summaries = store.summaries_for("BTC-NOK");
    assert!(summaries.len() >= 5, "got {} summaries", summaries.len());
    assert!(store.summaries_for("ETH-NOK").is_empty());

    for s in &summaries {
        if let (Some(lo), Some(hi)) = (s.lowest_ask, s.highest_ask) {
            assert!(lo <= hi);
        }
        if let (Some(lo), Some(hi)) = (s.lowest_bid, s.highest_bid) {
            assert!(lo <= hi);
        }
    }

    let insights = board.get("BTC-NOK").expect("analyzers should publish");
    let forecast = insights.forecast.expect("forecast should be published");
    let spread = insights.spread.expect("spread should be published");
    assert!(spread.max > rust_decimal::Decimal::ZERO);
    assert!(forecast.based_on <= summaries.last().unwrap().timestamp);
}

#[tokio::test(start_paused = true)]
async fn unknown_pair_yields_nothing_and_keeps_running() {
    let store = QuoteStore::new();
    let board = InsightBoard::new();
    let cancel = CancellationToken::new();

    let handles = spawn_pipeline(&store, &board, "DOGE-NOK", &cancel);
    tokio::time::sleep(Duration::from_millis(550)).await;

    assert!(store.quote_count() > 0);
    assert_eq!(store.summary_count(), 0);
    assert!(board.get("DOGE-NOK").is_none());
    assert!(handles.iter().all(|h| !h.is_finished()));

    stop(cancel, handles).await;
}
