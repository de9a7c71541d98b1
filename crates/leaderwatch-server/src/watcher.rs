//! Periodic watch cycles for leader performance and endpoint availability.

use crate::config::{EndpointSettings, WatcherSettings};
use crate::fetcher::{FetchError, LeaderSource, Prober};
use leaderwatch::{diff_endpoints, diff_leaders, Leader, PersistedState, StateStore, TriggerSchedule};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};

/// Polls the leader ranking, diffs it against the previous snapshot and
/// persists the result.
///
/// One task owns the watcher and runs each cycle to completion before the
/// next tick, so cycles never overlap.
pub struct LeaderWatcher {
    sources: Vec<Arc<dyn LeaderSource>>,
    current: usize,
    retries: u32,
    retry_delay: Duration,
    poll_interval: Duration,
    schedule: TriggerSchedule,
    store: Arc<StateStore>,
    state: Arc<Mutex<PersistedState>>,
    alert_tx: mpsc::Sender<String>,
}

impl LeaderWatcher {
    pub fn new(
        sources: Vec<Arc<dyn LeaderSource>>,
        settings: &WatcherSettings,
        store: Arc<StateStore>,
        state: Arc<Mutex<PersistedState>>,
        alert_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            sources,
            current: 0,
            retries: settings.retries,
            retry_delay: settings.retry_delay,
            poll_interval: settings.interval,
            schedule: settings.triggers.clone(),
            store,
            state,
            alert_tx,
        }
    }

    /// Run the watch loop. The first tick fires immediately.
    pub async fn run(mut self) {
        info!("Leader watcher started");

        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One polling cycle: fetch with bounded rotating retry, diff, persist.
    ///
    /// On fetch failure the cycle aborts without touching state.
    pub async fn run_once(&mut self) {
        debug!("Leader watch cycle starting");

        let Some(new_leaders) = self.fetch_with_retry().await else {
            return;
        };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let old = std::mem::replace(&mut state.leaders, new_leaders);
        let alerts = diff_leaders(&old, &state.leaders, &mut state.missers, &self.schedule);
        if let Err(e) = self.store.save(state) {
            warn!(error = %e, "Failed to persist state");
        }
        drop(guard);

        for alert in alerts {
            if self.alert_tx.send(alert).await.is_err() {
                warn!("Alert channel closed");
                break;
            }
        }

        debug!("Leader watch cycle done");
    }

    async fn fetch_with_retry(&mut self) -> Option<Vec<Leader>> {
        let mut attempts = 0u32;
        loop {
            let index = self.current % self.sources.len();
            match self.sources[index].fetch_leaders().await {
                Ok(leaders) => return Some(leaders),
                Err(FetchError::Malformed(e)) => {
                    warn!(api = index, error = %e, "Leader payload malformed, skipping cycle");
                    return None;
                }
                Err(FetchError::Transport(e)) => {
                    warn!(api = index, error = %e, "Leader fetch failed");
                    // Rotate to the next configured API before any retry.
                    self.current = (self.current + 1) % self.sources.len();
                    if attempts >= self.retries {
                        info!("Reached the retries limit, giving up until the next cycle");
                        return None;
                    }
                    attempts += 1;
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}

/// Probes the configured nodes and tracks the down-set.
pub struct EndpointWatcher {
    nodes: Vec<String>,
    prober: Arc<dyn Prober>,
    poll_interval: Duration,
    schedule: TriggerSchedule,
    store: Arc<StateStore>,
    state: Arc<Mutex<PersistedState>>,
    alert_tx: mpsc::Sender<String>,
}

impl EndpointWatcher {
    pub fn new(
        settings: &EndpointSettings,
        prober: Arc<dyn Prober>,
        store: Arc<StateStore>,
        state: Arc<Mutex<PersistedState>>,
        alert_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            nodes: settings.nodes.clone(),
            prober,
            poll_interval: settings.interval,
            schedule: settings.triggers.clone(),
            store,
            state,
            alert_tx,
        }
    }

    /// Run the watch loop. The first tick fires immediately.
    pub async fn run(mut self) {
        info!("Endpoint watcher started");

        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One probe round: fan out the probes, diff the down-set, persist.
    pub async fn run_once(&mut self) {
        debug!("Endpoint watch cycle starting");

        let probes = self.nodes.iter().map(|node| {
            let prober = self.prober.clone();
            async move { (node.clone(), prober.probe(node).await) }
        });
        let failing: Vec<String> = futures::future::join_all(probes)
            .await
            .into_iter()
            .filter_map(|(node, up)| (!up).then_some(node))
            .collect();

        let now = SystemTime::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let previous = std::mem::take(&mut state.down);
        let (down, alerts) = diff_endpoints(previous, &failing, now, &self.schedule);
        state.down = down;
        // The down-set is persisted every cycle, changed or not.
        if let Err(e) = self.store.save(state) {
            warn!(error = %e, "Failed to persist state");
        }
        drop(guard);

        for alert in alerts {
            if self.alert_tx.send(alert).await.is_err() {
                warn!("Alert channel closed");
                break;
            }
        }

        debug!("Endpoint watch cycle done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MockLeaderSource, MockProber};
    use leaderwatch::MisserRecord;

    fn leader(name: &str, produced: u64, missed: u64) -> Leader {
        Leader {
            name: name.to_string(),
            produced,
            missed,
        }
    }

    fn watcher_settings() -> WatcherSettings {
        WatcherSettings {
            interval: Duration::from_secs(300),
            retries: 3,
            retry_delay: Duration::from_millis(1),
            triggers: TriggerSchedule::new(10, vec![1, 3, 5]),
        }
    }

    fn temp_store(name: &str) -> Arc<StateStore> {
        let path = std::env::temp_dir().join(format!(
            "leaderwatch-watcher-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();
        Arc::new(StateStore::new(path))
    }

    #[tokio::test]
    async fn test_leader_cycle_diffs_and_persists() {
        let mut source = MockLeaderSource::new();
        source
            .expect_fetch_leaders()
            .returning(|| Ok(vec![leader("alice", 10, 2)]));

        let store = temp_store("diff");
        let state = Arc::new(Mutex::new(PersistedState {
            leaders: vec![leader("alice", 10, 0)],
            ..Default::default()
        }));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = LeaderWatcher::new(
            vec![Arc::new(source)],
            &watcher_settings(),
            store.clone(),
            state.clone(),
            alert_tx,
        );
        watcher.run_once().await;

        assert_eq!(
            alert_rx.recv().await.unwrap(),
            "Leader `alice` missed *2* block(s)"
        );

        let snapshot = state.lock().await;
        assert_eq!(snapshot.leaders, vec![leader("alice", 10, 2)]);
        assert_eq!(
            snapshot.missers["alice"],
            MisserRecord { start: 1, last: 2 }
        );
        // The persisted copy matches the in-memory state.
        assert_eq!(store.load(), *snapshot);
    }

    #[tokio::test]
    async fn test_leader_cycle_rotates_to_next_api_on_failure() {
        let mut flaky = MockLeaderSource::new();
        flaky
            .expect_fetch_leaders()
            .times(1)
            .returning(|| Err(FetchError::Transport("connection refused".to_string())));
        let mut healthy = MockLeaderSource::new();
        healthy
            .expect_fetch_leaders()
            .times(1)
            .returning(|| Ok(vec![leader("alice", 10, 0)]));

        let store = temp_store("rotate");
        let state = Arc::new(Mutex::new(PersistedState::default()));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = LeaderWatcher::new(
            vec![Arc::new(flaky), Arc::new(healthy)],
            &watcher_settings(),
            store,
            state.clone(),
            alert_tx,
        );
        watcher.run_once().await;

        assert_eq!(
            alert_rx.recv().await.unwrap(),
            "Leader `alice` registered"
        );
        assert_eq!(state.lock().await.leaders, vec![leader("alice", 10, 0)]);
    }

    #[tokio::test]
    async fn test_leader_cycle_gives_up_after_retries() {
        let mut source = MockLeaderSource::new();
        // 1 initial attempt + 3 retries.
        source
            .expect_fetch_leaders()
            .times(4)
            .returning(|| Err(FetchError::Transport("timeout".to_string())));

        let store = temp_store("giveup");
        let state = Arc::new(Mutex::new(PersistedState {
            leaders: vec![leader("alice", 10, 0)],
            ..Default::default()
        }));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = LeaderWatcher::new(
            vec![Arc::new(source)],
            &watcher_settings(),
            store.clone(),
            state.clone(),
            alert_tx,
        );
        watcher.run_once().await;

        // Cycle aborted: no alerts, no mutation, nothing persisted.
        assert!(alert_rx.try_recv().is_err());
        assert_eq!(state.lock().await.leaders, vec![leader("alice", 10, 0)]);
        assert_eq!(store.load(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_leader_cycle_malformed_payload_is_not_retried() {
        let mut source = MockLeaderSource::new();
        source
            .expect_fetch_leaders()
            .times(1)
            .returning(|| Err(FetchError::Malformed("not an array".to_string())));

        let store = temp_store("malformed");
        let state = Arc::new(Mutex::new(PersistedState::default()));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = LeaderWatcher::new(
            vec![Arc::new(source)],
            &watcher_settings(),
            store,
            state,
            alert_tx,
        );
        watcher.run_once().await;

        assert!(alert_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_endpoint_cycle_marks_failing_nodes_down() {
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .returning(|node| node != "http://node-b");

        let settings = EndpointSettings {
            nodes: vec!["http://node-a".to_string(), "http://node-b".to_string()],
            ..Default::default()
        };
        let store = temp_store("endpoint");
        let state = Arc::new(Mutex::new(PersistedState::default()));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = EndpointWatcher::new(
            &settings,
            Arc::new(prober),
            store.clone(),
            state.clone(),
            alert_tx,
        );
        watcher.run_once().await;

        assert_eq!(
            alert_rx.recv().await.unwrap(),
            "API node http://node-b failed to reply"
        );
        let snapshot = state.lock().await;
        assert_eq!(snapshot.down.len(), 1);
        assert_eq!(snapshot.down[0].node, "http://node-b");
        // Down-set persisted even though the leader side never ran.
        assert_eq!(store.load().down, snapshot.down);
    }

    #[tokio::test]
    async fn test_endpoint_cycle_persists_unchanged_down_set() {
        let mut prober = MockProber::new();
        prober.expect_probe().returning(|_| true);

        let settings = EndpointSettings {
            nodes: vec!["http://node-a".to_string()],
            ..Default::default()
        };
        let store = temp_store("unchanged");
        let state = Arc::new(Mutex::new(PersistedState {
            leaders: vec![leader("alice", 10, 0)],
            ..Default::default()
        }));
        let (alert_tx, mut alert_rx) = mpsc::channel(16);

        let mut watcher = EndpointWatcher::new(
            &settings,
            Arc::new(prober),
            store.clone(),
            state.clone(),
            alert_tx,
        );
        watcher.run_once().await;

        assert!(alert_rx.try_recv().is_err());
        // Saved even with zero down-set changes: the file now carries the
        // full in-memory state.
        assert_eq!(store.load(), *state.lock().await);
    }
}
