//! Daemon wiring: alert channel, watcher tasks and the notifier task.

use crate::config::Config;
use crate::fetcher::{HttpLeaderSource, HttpProber, LeaderSource};
use crate::notifier::{LogNotifier, Notifier, NotifierTask, TelegramNotifier};
use crate::watcher::{EndpointWatcher, LeaderWatcher};
use leaderwatch::StateStore;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

/// Buffer for alerts in flight between the watchers and the notifier.
const ALERT_CHANNEL_SIZE: usize = 256;

/// The leaderwatch daemon.
pub struct WatchServer {
    config: Config,
}

impl WatchServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the daemon until one of its tasks stops.
    pub async fn run(self) -> common::Result<()> {
        info!("Starting leaderwatch server");

        let (alert_tx, alert_rx) = mpsc::channel::<String>(ALERT_CHANNEL_SIZE);

        let notifier: Arc<dyn Notifier> = if self.config.telegram.is_configured() {
            info!("Telegram notifier configured");
            Arc::new(TelegramNotifier::new(
                &self.config.telegram.api_url,
                &self.config.telegram.token,
                self.config.telegram.chat_id.unwrap_or_default(),
            ))
        } else {
            info!("No Telegram credentials, alerts will be logged only");
            Arc::new(LogNotifier)
        };

        let store = Arc::new(StateStore::new(&self.config.state_file));
        let state = Arc::new(Mutex::new(store.load()));

        // Leader watcher task
        let leader_handle = if self.config.apis.is_empty() {
            info!("No leader APIs configured, leader watcher disabled");
            None
        } else {
            let client = reqwest::Client::new();
            let sources: Vec<Arc<dyn LeaderSource>> = self
                .config
                .apis
                .iter()
                .map(|api| {
                    Arc::new(HttpLeaderSource::new(client.clone(), api.clone()))
                        as Arc<dyn LeaderSource>
                })
                .collect();
            let watcher = LeaderWatcher::new(
                sources,
                &self.config.watcher,
                store.clone(),
                state.clone(),
                alert_tx.clone(),
            );
            Some(tokio::spawn(watcher.run()))
        };

        // Endpoint watcher task
        let endpoint_handle = if self.config.endpoints.nodes.is_empty() {
            info!("No endpoint nodes configured, endpoint watcher disabled");
            None
        } else {
            let prober = Arc::new(HttpProber::new(self.config.endpoints.probe_timeout)?);
            let watcher = EndpointWatcher::new(
                &self.config.endpoints,
                prober,
                store.clone(),
                state.clone(),
                alert_tx.clone(),
            );
            Some(tokio::spawn(watcher.run()))
        };

        // The notifier stops once every watcher sender is gone.
        drop(alert_tx);
        let notifier_handle = tokio::spawn(NotifierTask::new(alert_rx, notifier).run());

        info!("All tasks spawned, server running");

        tokio::select! {
            _ = join_or_pending(leader_handle) => {
                info!("Leader watcher completed");
            }
            _ = join_or_pending(endpoint_handle) => {
                info!("Endpoint watcher completed");
            }
            _ = notifier_handle => {
                info!("Notifier task completed");
            }
        }

        info!("Leaderwatch server stopped");
        Ok(())
    }
}

async fn join_or_pending(handle: Option<tokio::task::JoinHandle<()>>) {
    match handle {
        Some(handle) => {
            handle.await.ok();
        }
        // Never completes when the watcher is disabled.
        None => std::future::pending::<()>().await,
    }
}
