mod cli;
mod render;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use auth::{ApiCredentials, TokenCache};
use chrono::{Duration, Utc};
use clap::Parser;
use common::{AppConfig, ConfigLoader};
use kis_rest::KisRestClient;
use model::InstrumentCode;
use notifier::{KakaoNotifier, NoopNotifier};
use strategy_core::{MarketDataGateway, NotificationSink, OrderGateway, SignalEvaluator};
use strategy_runner::{trading_date, DryRunOrderGateway, Gateways, Session, SessionRunner};
use tracing::{error, info, warn};
use watchlist::{Watchlist, WatchlistStore};

use crate::cli::{Cli, Command, SetArgs, WatchCommand};

/// Calendar days of bars fetched by `analyze`.
const ANALYZE_HISTORY_DAYS: i64 = 90;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    common::init_logging();
    let cli = Cli::parse();

    let mut loader = ConfigLoader::from_process_env();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }

    match cli.command {
        Command::Watch { command } => watch(&offline_store(&loader)?, command),
        Command::Set(args) => set(&offline_store(&loader)?, &args),
        Command::Tick { code } => {
            let (runner, _) = build_runner(load_config(&loader)?)?;
            tick(&runner, code).await
        }
        Command::Analyze { code } => {
            let (runner, client) = build_runner(load_config(&loader)?)?;
            analyze(&runner, &client, &code).await
        }
    }
}

/// Watchlist store for commands that never talk to the brokerage.
fn offline_store(loader: &ConfigLoader) -> Result<WatchlistStore> {
    let state_file = loader
        .state_file()
        .context("failed to load configuration")?;
    Ok(WatchlistStore::new(state_file))
}

fn load_config(loader: &ConfigLoader) -> Result<AppConfig> {
    let config = loader.load().context("failed to load configuration")?;
    info!(
        environment = %config.environment,
        dry_run = config.dry_run,
        state_file = %config.state_file.display(),
        "Configuration loaded"
    );
    Ok(config)
}

fn build_runner(config: AppConfig) -> Result<(SessionRunner, Arc<KisRestClient>)> {
    let store = WatchlistStore::new(&config.state_file);
    let credentials = ApiCredentials::new(config.app_key, config.app_secret);
    let mut client = KisRestClient::new(credentials, config.environment)
        .context("failed to build KIS client")?;
    if let Some(account) = config.account {
        client = client.with_account(account);
    }
    let client = Arc::new(client);

    let orders: Arc<dyn OrderGateway> = if config.dry_run {
        warn!("Dry run: orders are simulated, nothing is sent to the brokerage");
        Arc::new(DryRunOrderGateway)
    } else {
        client.clone()
    };

    let notifier: Arc<dyn NotificationSink> = match config.kakao_token {
        Some(token) => {
            Arc::new(KakaoNotifier::new(token).context("failed to build Kakao notifier")?)
        }
        None => Arc::new(NoopNotifier),
    };

    let gateways = Gateways {
        authenticator: client.clone(),
        market_data: client.clone(),
        directory: client.clone(),
        orders,
        notifier,
    };

    let runner = SessionRunner::new(gateways, TokenCache::new(config.token_file), store);
    Ok((runner, client))
}

fn load_session(store: &WatchlistStore) -> Result<Session> {
    let watchlist = store
        .load()
        .with_context(|| format!("failed to load {}", store.path().display()))?;
    Ok(Session::new(watchlist, trading_date(Utc::now())))
}

async fn tick(runner: &SessionRunner, code: Option<InstrumentCode>) -> Result<()> {
    let mut session = load_session(runner.store())?;
    let today = session.trading_date();

    let results = match code {
        Some(code) => vec![runner.tick(&mut session, &code, today).await],
        None => runner
            .tick_all(&mut session, today)
            .await
            .context("session aborted")?,
    };

    let mut failures = 0;
    for result in results {
        match result {
            Ok(report) => print!("{}", render::tick_report(&report)),
            Err(e) if e.is_fatal() => return Err(e).context("session aborted"),
            Err(e) => {
                error!(error = %e, "Tick skipped");
                println!("error: {e}");
                failures += 1;
            }
        }
    }

    if session.is_dirty() {
        runner
            .persist(&mut session)
            .context("failed to save watchlist")?;
    }
    if failures > 0 {
        bail!("{failures} instrument(s) could not be refreshed");
    }
    Ok(())
}

async fn analyze(
    runner: &SessionRunner,
    client: &KisRestClient,
    code: &InstrumentCode,
) -> Result<()> {
    let mut session = load_session(runner.store())?;
    let today = session.trading_date();
    let token = runner
        .ensure_token(&mut session)
        .await
        .context("authentication failed")?;

    let quote = client.current_price(&token, code).await?;
    let bars = client
        .daily_bars(&token, code, today - Duration::days(ANALYZE_HISTORY_DAYS), today)
        .await?;
    let signal = SignalEvaluator::analyze(&bars, quote.last_price);

    println!("{code}  {} ({} bars)", quote.last_price, bars.len());
    println!("{}", render::signal_line(&signal));
    Ok(())
}

fn save(store: &WatchlistStore, watchlist: &Watchlist) -> Result<()> {
    store
        .save(watchlist)
        .with_context(|| format!("failed to save {}", store.path().display()))
}

fn watch(store: &WatchlistStore, command: WatchCommand) -> Result<()> {
    let mut watchlist = store.load()?;

    match command {
        WatchCommand::Add { code } => {
            if watchlist.add(code.clone()) {
                save(store, &watchlist)?;
                info!(code = %code, "Added to watchlist");
            } else {
                println!("{code} is already watched");
            }
        }
        WatchCommand::Remove { code } => {
            if watchlist.remove(&code) {
                save(store, &watchlist)?;
                info!(code = %code, "Removed from watchlist");
            } else {
                bail!("{code} is not on the watchlist");
            }
        }
        WatchCommand::List => {}
    }

    print!("{}", render::watchlist(&watchlist));
    Ok(())
}

fn set(store: &WatchlistStore, args: &SetArgs) -> Result<()> {
    let mut watchlist = store.load()?;
    let current = watchlist
        .config(&args.code)
        .cloned()
        .with_context(|| format!("{} is not on the watchlist", args.code))?;

    let updated = args.apply(&current);
    watchlist
        .set_config(&args.code, updated)
        .with_context(|| format!("invalid configuration for {}", args.code))?;
    save(store, &watchlist)?;

    info!(code = %args.code, "Trigger configuration updated");
    print!("{}", render::watchlist(&watchlist));
    Ok(())
}
