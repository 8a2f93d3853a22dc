use crate::errors::InsufficientData;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// One periodic step of the pipeline.
pub trait Stage: Send {
    fn name(&self) -> &'static str;

    /// Runs a single cycle. `Err` means the cycle had nothing to work with;
    /// it is logged and the stage waits for the next tick.
    fn run_cycle(&mut self) -> Result<(), InsufficientData>;
}

/// Drives `stage` every `period` until `cancel` fires. The first cycle runs
/// immediately.
pub async fn run_periodic<S: Stage>(mut stage: S, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(stage = stage.name(), period_ms = period.as_millis() as u64, "stage started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(stage = stage.name(), "stage cancelled");
                break;
            }
            _ = interval.tick() => {
                if let Err(reason) = stage.run_cycle() {
                    metrics::counter!("cycles_skipped_total", "stage" => stage.name()).increment(1);
                    tracing::info!(stage = stage.name(), "{reason}");
                }
            }
        }
    }

    tracing::info!(stage = stage.name(), "stage stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        runs: Arc<AtomicUsize>,
        skip: bool,
    }

    impl Stage for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run_cycle(&mut self) -> Result<(), InsufficientData> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.skip {
                Err(InsufficientData::NoQuotes)
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_once_per_period_until_cancelled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let stage = Counting { runs: runs.clone(), skip: false };

        let handle = tokio::spawn(run_periodic(stage, Duration::from_secs(5), cancel.clone()));

        // first tick fires immediately, then at 5s and 10s
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        cancel.cancel();
        handle.await.expect("stage task should complete");

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_cycles_do_not_stop_the_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let stage = Counting { runs: runs.clone(), skip: true };

        let handle = tokio::spawn(run_periodic(stage, Duration::from_secs(1), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        cancel.cancel();
        handle.await.expect("stage task should complete");

        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn cancellation_is_prompt() {
        let cancel = CancellationToken::new();
        let stage = Counting { runs: Arc::new(AtomicUsize::new(0)), skip: false };

        let handle = tokio::spawn(run_periodic(stage, Duration::from_secs(3600), cancel.clone()));
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_millis(100), handle).await;
        assert!(result.is_ok(), "stage should stop on cancellation");
    }
}
