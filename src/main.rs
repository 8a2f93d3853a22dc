use clap::Parser;
use futures_util::future::join_all;
use l2_insights::config::{Cli, Config};
use l2_insights::feed::{FeedGenerator, FeedSimulator};
use l2_insights::insights::{ForecastAnalyzer, InsightBoard, SpreadAnalyzer};
use l2_insights::orderbook::BookAggregator;
use l2_insights::runner::run_periodic;
use l2_insights::store::QuoteStore;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = QuoteStore::new();
    let board = InsightBoard::new();
    let pair = cli.currency_pair_name.clone();

    tracing::info!(
        "l2-insights starting: simulating {:?}, analysing {} every {:?}",
        config.pairs.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        pair,
        config.update_interval
    );
    if !config.pairs.iter().any(|p| p.name == pair) {
        tracing::warn!("{pair} is not simulated by the feed; no insights will be produced for it");
    }

    let generator = FeedGenerator::new(&config.pairs, config.levels_per_side, config.seed)?;
    let period = config.update_interval;
    let shutdown = CancellationToken::new();

    // ── Spawn one task per pipeline stage ─────────────────────────
    let handles = vec![
        tokio::spawn(run_periodic(
            FeedSimulator::new(generator, store.clone(), cli.print_quotes),
            period,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            BookAggregator::new(store.clone(), pair.clone(), cli.print_extremums),
            period,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            SpreadAnalyzer::new(store.clone(), board.clone(), pair.clone(), cli.print_max_spread),
            period,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            ForecastAnalyzer::new(store.clone(), board.clone(), pair.clone(), cli.print_next_mid_price),
            period,
            shutdown.clone(),
        )),
    ];

    // ── Keep main alive until Ctrl+C / SIGTERM ───────────────────
    await_shutdown().await?;
    tracing::info!("Shutting down...");
    shutdown.cancel();

    for result in join_all(handles).await {
        if let Err(e) = result {
            tracing::error!("stage task failed: {e}");
        }
    }

    match board.get(&pair) {
        Some(insights) => tracing::info!(
            quotes = store.quote_count(),
            summaries = store.summary_count(),
            max_spread = ?insights.spread.map(|s| s.max),
            next_mid_price = ?insights.forecast.map(|f| f.next_mid_price),
            "final insights for {pair}"
        ),
        None => tracing::info!(quotes = store.quote_count(), "no insights were produced for {pair}"),
    }

    Ok(())
}

async fn await_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => res?,
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}
