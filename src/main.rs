//! zkPredict odds watcher.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reports the configured holder's reputation, and keeps the odds of the
//! watched markets fresh until Ctrl+C.

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use zkpredict_engine::config;
use zkpredict_engine::engine::poller::{MarketOdds, OddsPoller};
use zkpredict_engine::engine::ReputationSource;
use zkpredict_engine::pricing::ReturnCalculator;
use zkpredict_engine::reputation::ReputationSummary;
use zkpredict_engine::storage::SnapshotFile;
use zkpredict_engine::types::MICROCREDITS_PER_CREDIT;

const BANNER: &str = r#"
 _    ___             _ _    _
| |__| _ \_ _ ___ __| (_)__| |_
|_ / |  _/ '_/ -_) _` | / _|  _|
/__|_|_| |_| \___\__,_|_\__|\__|

  Private prediction market odds engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;
    init_logging(&cfg);

    println!("{BANNER}");
    let calculator = cfg.return_calculator()?;
    info!(
        snapshot = %cfg.polling.snapshot_path,
        markets = cfg.polling.markets.len(),
        interval_secs = cfg.polling.interval_secs,
        fee_rate = %calculator.config().protocol_fee_rate,
        "zkPredict engine starting up"
    );

    let source = SnapshotFile::new(&cfg.polling.snapshot_path);

    if let Some(owner) = cfg.polling.reputation_owner.as_deref() {
        report_reputation(&source, owner).await;
    }

    if cfg.polling.markets.is_empty() {
        warn!("No markets configured under [polling.markets]; nothing to watch");
        return Ok(());
    }

    let poller = OddsPoller::new(source, cfg.polling.markets.clone(), cfg.poll_interval());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    };

    info!("Entering main loop. Press Ctrl+C to stop.");
    let cycles = poller
        .run(|updates| log_updates(&calculator, updates), shutdown)
        .await;

    info!(cycles, "zkPredict engine shut down cleanly.");
    Ok(())
}

async fn report_reputation(source: &SnapshotFile, owner: &str) {
    match source.fetch_reputation(owner).await {
        Ok(Some(rep)) => match ReputationSummary::from_record(&rep) {
            Ok(summary) => info!(
                owner,
                tier = %summary.tier,
                accuracy = %summary.accuracy,
                parlay_accuracy = %summary.parlay_accuracy,
                net_profit = %summary.net_profit,
                max_parlay_legs = summary.max_parlay_legs,
                progress = %summary.progress,
                "Reputation"
            ),
            Err(e) => warn!(owner, error = %e, "Reputation record is inconsistent"),
        },
        Ok(None) => info!(owner, "No reputation record yet"),
        Err(e) => warn!(owner, error = %e, "Failed to fetch reputation"),
    }
}

/// Log each market's odds and the payout of a one-credit bet per outcome.
fn log_updates(calculator: &ReturnCalculator, updates: &[MarketOdds]) {
    let stake = Decimal::from(MICROCREDITS_PER_CREDIT);
    for update in updates {
        let book = match &update.book {
            Ok(book) => book,
            Err(e) => {
                warn!(market_id = %update.market_id, error = %e, "Market could not be quoted");
                continue;
            }
        };
        info!(
            market_id = %update.market_id,
            total_pool = book.total_pool,
            favorite = ?book.favorite().map(|q| q.outcome_index),
            failed_fetches = update.failed_fetches,
            "Odds refreshed"
        );
        for quote in &book.quotes {
            match calculator.quote_bet(book, quote.outcome_index, stake) {
                Ok(payout) => info!(
                    market_id = %update.market_id,
                    quote = %quote,
                    payout = %payout,
                    "Outcome"
                ),
                Err(e) => warn!(market_id = %update.market_id, error = %e, "Payout failed"),
            }
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));

    let json_logging = std::env::var("ZKPREDICT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
