use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use common::{
    Error, Performance, Result, Strategy, StrategyConfig, StrategyEvent, StrategyStatus,
};

/// Length of generated strategy ids (hex chars of a v4 UUID).
const ID_LEN: usize = 8;

/// Single source of truth for which strategies exist, their validated
/// configuration and their running/stopped status.
///
/// Everything lives behind one coarse `RwLock`: operations are O(1)
/// in-memory mutations on a control-plane map, so there is nothing to gain
/// from finer granularity. Callers only ever receive cloned snapshots.
///
/// State is process-local. A restart discards all strategies; stopped
/// strategies stay queryable until then and are never pruned.
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<String, Strategy>>,
    event_tx: broadcast::Sender<StrategyEvent>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        info!("Strategy registry initialized");
        Self {
            strategies: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to lifecycle events (dashboard WebSocket fan-out).
    pub fn subscribe(&self) -> broadcast::Receiver<StrategyEvent> {
        self.event_tx.subscribe()
    }

    /// Validate `config` and register a new running strategy.
    ///
    /// Validation runs before any mutation, so a rejected config leaves the
    /// registry untouched. Returns the generated id, unique among all ids
    /// handed out during the process lifetime.
    pub async fn start(&self, config: StrategyConfig) -> Result<String> {
        validate(&config)?;

        let mut strategies = self.strategies.write().await;
        let id = next_id(&strategies);
        let name = config.display_name().to_string();

        let strategy = Strategy {
            id: id.clone(),
            config,
            status: StrategyStatus::Running,
            started_at: Utc::now(),
            stopped_at: None,
            performance: Performance::default(),
        };
        strategies.insert(id.clone(), strategy);
        drop(strategies);

        info!(id = %id, name = %name, "Strategy started");
        let _ = self.event_tx.send(StrategyEvent::Started {
            id: id.clone(),
            name,
        });
        Ok(id)
    }

    /// Stop the strategy with the given id.
    ///
    /// Unknown ids are a normal outcome, reported as `false` plus a warning
    /// log, never an error. Stopping an already-stopped strategy is
    /// idempotent: it re-stamps `stopped_at` and returns `true`.
    pub async fn stop(&self, id: &str) -> bool {
        let mut strategies = self.strategies.write().await;
        match strategies.get_mut(id) {
            Some(strategy) => {
                strategy.status = StrategyStatus::Stopped;
                strategy.stopped_at = Some(Utc::now());
                drop(strategies);

                info!(id = %id, "Strategy stopped");
                let _ = self.event_tx.send(StrategyEvent::Stopped { id: id.to_string() });
                true
            }
            None => {
                warn!(id = %id, "Stop requested for unknown strategy");
                false
            }
        }
    }

    /// Stop every currently-registered strategy.
    ///
    /// Iterates a stable snapshot of ids taken up front, so stopping one
    /// strategy cannot affect iteration of the rest. Individual misses are
    /// logged by `stop`; the operation as a whole cannot fail.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self.strategies.read().await.keys().cloned().collect();

        let mut stopped = 0usize;
        for id in &ids {
            if self.stop(id).await {
                stopped += 1;
            }
        }

        info!(stopped, "All strategies stopped");
        let _ = self.event_tx.send(StrategyEvent::AllStopped { stopped });
    }

    /// Snapshot of all running strategies, in start order.
    pub async fn list_running(&self) -> Vec<Strategy> {
        let strategies = self.strategies.read().await;
        let mut running: Vec<Strategy> = strategies
            .values()
            .filter(|s| s.status == StrategyStatus::Running)
            .cloned()
            .collect();
        drop(strategies);
        sort_by_start(&mut running);
        running
    }

    /// Snapshot of every strategy ever created, running and stopped.
    pub async fn list_all(&self) -> Vec<Strategy> {
        let mut all: Vec<Strategy> = self.strategies.read().await.values().cloned().collect();
        sort_by_start(&mut all);
        all
    }

    /// Stop all strategies ahead of process exit. Called once from `main`
    /// on the shutdown signal.
    pub async fn shutdown(&self) {
        info!("Strategy registry shutting down");
        self.stop_all().await;
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate an id not present in `strategies`. Called under the write lock,
/// so concurrent starts can never observe or assign the same id.
fn next_id(strategies: &HashMap<String, Strategy>) -> String {
    loop {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        if !strategies.contains_key(&id) {
            return id;
        }
    }
}

fn sort_by_start(strategies: &mut [Strategy]) {
    strategies.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn validate(config: &StrategyConfig) -> Result<()> {
    match config.symbol.as_deref() {
        Some(s) if !s.is_empty() => {}
        _ => return Err(Error::Validation("missing field: symbol".into())),
    }
    if config.strategy_type.is_none() {
        return Err(Error::Validation("missing field: type".into()));
    }
    match config.volume {
        None => Err(Error::Validation("missing field: volume".into())),
        Some(v) if v <= 0.0 => Err(Error::Validation("volume must be positive".into())),
        Some(_) => Ok(()),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
