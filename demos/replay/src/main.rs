//! Replay example: run recorded price notifications through one rebalance engine per
//! managed position, each in its own task, against an in-memory vault.
//!
//! Usage: replay <positions.json> <scenario.json> [telegram_bot_key telegram_chat_id]
//!
//! Circuit-breaker trips are pushed to Telegram when credentials are given and logged
//! otherwise. Set `RUST_LOG` to change verbosity (default `info`).

mod paper;
mod scenario;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clients_telegrambot::{TelegramConfig, TelegramNotifier};
use rebalance::{EngineSnapshot, GovernorConfig, RebalanceEngine, SafetyGovernor};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use paper::PaperVault;
use scenario::{events_for, load, PositionConfig, ReplayConfig, ScenarioEvent};

struct ReplaySummary {
    label: String,
    rebalances: usize,
    rejected: usize,
    snapshot: EngineSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 && args.len() != 5 {
        eprintln!(
            "Usage: {} <positions.json> <scenario.json> [telegram_bot_key telegram_chat_id]",
            args.first().map(|s| s.as_str()).unwrap_or("replay")
        );
        std::process::exit(1);
    }

    let config: ReplayConfig = load(Path::new(&args[1]))?;
    let events: Vec<ScenarioEvent> = load(Path::new(&args[2]))?;
    let notifier = match args.get(3..5) {
        Some([bot_key, chat_id]) => Some(Arc::new(TelegramNotifier::new(TelegramConfig {
            bot_key: bot_key.trim().to_string(),
            chat_id: chat_id.trim().to_string(),
            api_base: None,
        })?)),
        _ => None,
    };

    let mut tasks = JoinSet::new();
    for position in config.positions {
        let events = events_for(&events, &position.label);
        let governor = build_governor(position.clone(), config.governor)?;
        info!(position = %position.label, events = events.len(), "starting replay");
        tasks.spawn(replay_position(position.label, governor, events, notifier.clone()));
    }

    while let Some(joined) = tasks.join_next().await {
        let summary = joined.context("replay task panicked")??;
        info!(
            position = %summary.label,
            rebalances = summary.rebalances,
            rejected = summary.rejected,
            "replay finished"
        );
        info!("{}", serde_json::to_string_pretty(&summary.snapshot)?);
    }
    Ok(())
}

fn build_governor(position: PositionConfig, config: GovernorConfig) -> Result<SafetyGovernor<PaperVault>> {
    let vault = PaperVault::new(position.engine.token0, position.vault);
    let engine = RebalanceEngine::new(position.engine, Some(vault))
        .with_context(|| format!("invalid engine config for {}", position.label))?;
    Ok(SafetyGovernor::new(engine, config))
}

async fn replay_position(
    label: String,
    mut governor: SafetyGovernor<PaperVault>,
    events: Vec<ScenarioEvent>,
    notifier: Option<Arc<TelegramNotifier>>,
) -> Result<ReplaySummary> {
    let mut rejected = 0;
    for event in events {
        if let Some(vault) = governor.engine_mut().vault_mut() {
            if let Some(balances) = event.balances {
                vault.set_balances(balances);
            }
            if let Some(revert) = event.revert {
                vault.set_reverting(revert);
            }
        }
        if event.unpause {
            let manager = governor.engine().manager();
            if let Err(err) = governor.engine_mut().unpause(manager) {
                warn!(position = %label, %err, "unpause ignored");
            }
        }

        let update = rebalance::PriceUpdate {
            tick: event.tick,
            timestamp: event.timestamp,
        };
        match governor.on_price_change(update, event.budget) {
            Ok(evaluation) => {
                info!(
                    position = %label,
                    tick = event.tick,
                    timestamp = event.timestamp,
                    status = ?evaluation.status,
                    state = ?evaluation.state,
                    action = ?evaluation.action,
                    "decision"
                );
                if evaluation.is_failure() {
                    alert(&label, governor.engine().snapshot(), notifier.as_deref()).await;
                }
            }
            Err(err) => {
                rejected += 1;
                warn!(position = %label, tick = event.tick, %err, "notification rejected");
            }
        }
        tokio::task::yield_now().await;
    }

    let rebalances = governor
        .engine()
        .vault()
        .map(|vault| vault.rebalances().len())
        .unwrap_or_default();
    Ok(ReplaySummary {
        snapshot: governor.engine().snapshot(),
        label,
        rebalances,
        rejected,
    })
}

async fn alert(label: &str, snapshot: EngineSnapshot, notifier: Option<&TelegramNotifier>) {
    let message = snapshot.to_message(label);
    match notifier {
        Some(telegram) => {
            if let Err(err) = telegram.push_message(&message).await {
                warn!(position = %label, %err, "failed to push alert");
            }
        }
        None => warn!(position = %label, "circuit breaker tripped\n{}", message),
    }
}
