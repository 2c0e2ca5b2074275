use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::bail;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fee_raffle_distributor::config::Config;
use fee_raffle_distributor::cycle::{run_cycle, Collaborators};
use fee_raffle_distributor::helius::HeliusBalanceSource;
use fee_raffle_distributor::ports::Notifier;
use fee_raffle_distributor::sim::{DisabledSink, SimulatedClaimer};
use fee_raffle_distributor::store::PgCycleStore;
use fee_raffle_distributor::telegram::{NoopNotifier, TelegramNotifier};

#[derive(Parser, Debug)]
#[command(name = "fee-raffle-distributor", about = "Creator-fee raffle distributor")]
struct Cli {
    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Compute the cycle without submitting transfers.
    #[arg(long)]
    dry_run: bool,
}

const MIN_SLEEP: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if cli.dry_run {
        config.dry_run = true;
    }
    if !config.dry_run {
        // Transaction signing is out of scope for this repo; claims and
        // transfers need an external ledger adapter behind the seams in
        // ports.rs before a wet run makes sense.
        bail!("no ledger adapter is wired in; run with --dry-run or DRY_RUN=1");
    }

    info!(
        interval_seconds = config.interval_seconds,
        dry_run = config.dry_run,
        winners = config.winner_count,
        "fee raffle distributor starting"
    );

    let balances = HeliusBalanceSource::new(&config.helius_api_key);
    let store = PgCycleStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;
    let notifier: Box<dyn Notifier> = if config.telegram_enabled() {
        Box::new(TelegramNotifier::new(
            &config.telegram_bot_token,
            &config.telegram_chat_id,
        ))
    } else {
        Box::new(NoopNotifier)
    };
    let sink = DisabledSink;

    loop {
        let started = Instant::now();
        let epoch_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let claimer = SimulatedClaimer::new(
            format!("dry-run-{epoch_secs}"),
            config.dry_run_claim_lamports,
        );

        let collaborators = Collaborators {
            claimer: &claimer,
            balances: &balances,
            sink: &sink,
            store: &store,
            notifier: notifier.as_ref(),
        };

        match run_cycle(&config, &collaborators).await {
            Ok(outcome) => info!(?outcome, "cycle finished"),
            Err(err) => {
                let chain = format!("{err:#}");
                error!(error = %chain, "cycle failed");
                if let Err(notify_err) = notifier.send(&format!("Cycle failed: {chain}")).await {
                    error!(error = %notify_err, "failure notification also failed");
                }
            }
        }

        if cli.once {
            break;
        }

        let interval = Duration::from_secs(config.interval_seconds);
        let sleep_for = interval.saturating_sub(started.elapsed()).max(MIN_SLEEP);
        tokio::time::sleep(sleep_for).await;
    }

    Ok(())
}
