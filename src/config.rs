use crate::errors::ConfigError;
use crate::feed::{CurrencyPair, MAX_LEVELS_PER_SIDE};
use clap::Parser;
use std::env;
use std::time::Duration;

/// Command-line switches for the insight pipeline.
#[derive(Debug, Clone, Parser)]
#[command(name = "l2-insights", about = "Simulated level-2 feed with rolling top-of-book insights")]
pub struct Cli {
    /// Print quotes from the currency pairs as they are received
    #[arg(long)]
    pub print_quotes: bool,

    /// Print extremums as they are calculated
    #[arg(long)]
    pub print_extremums: bool,

    /// Print the max spread as it is calculated
    #[arg(long)]
    pub print_max_spread: bool,

    /// Print the next mid price as it is predicted
    #[arg(long)]
    pub print_next_mid_price: bool,

    /// Currency pair to run calculations on, e.g. BTC-NOK or ETH-NOK
    #[arg(long, default_value = "BTC-NOK")]
    pub currency_pair_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub update_interval: Duration,
    pub pairs: Vec<CurrencyPair>,
    pub levels_per_side: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(5),
            pairs: CurrencyPair::defaults(),
            levels_per_side: 1,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("UPDATE_INTERVAL_SECS") {
            let secs = parse_positive("UPDATE_INTERVAL_SECS", &raw)?;
            config.update_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("FEED_PAIRS") {
            config.pairs = parse_pairs(&raw)?;
        }

        if let Some(raw) = lookup("FEED_LEVELS_PER_SIDE") {
            let levels = parse_positive("FEED_LEVELS_PER_SIDE", &raw)?;
            if levels > MAX_LEVELS_PER_SIDE as u64 {
                return Err(ConfigError::Invalid {
                    var: "FEED_LEVELS_PER_SIDE",
                    value: raw,
                    reason: format!("must be at most {MAX_LEVELS_PER_SIDE}"),
                });
            }
            config.levels_per_side = levels as usize;
        }

        if let Some(raw) = lookup("FEED_SEED") {
            let seed = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "FEED_SEED",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            config.seed = Some(seed);
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason,
    };
    let value = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if value == 0 {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(value)
}

/// Parses `NAME:MEAN:STD_DEV` entries separated by commas,
/// e.g. `BTC-NOK:820000:5000,ETH-NOK:29000:400`.
fn parse_pairs(raw: &str) -> Result<Vec<CurrencyPair>, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "FEED_PAIRS",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let pairs = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
            let [name, mean, std_dev] = fields.as_slice() else {
                return Err(invalid("expected NAME:MEAN:STD_DEV"));
            };
            let mean = mean.parse::<f64>().map_err(|_| invalid("mean is not a number"))?;
            let std_dev = std_dev
                .parse::<f64>()
                .map_err(|_| invalid("std_dev is not a number"))?;
            Ok(CurrencyPair::new(name.to_uppercase(), mean, std_dev))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if pairs.is_empty() {
        return Err(invalid("no currency pairs given"));
    }
    Ok(pairs)
}
