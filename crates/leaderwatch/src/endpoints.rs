//! Endpoint availability diffing and downtime re-alert schedule.

use crate::trigger::TriggerSchedule;
use crate::types::DownRecord;
use std::time::{Duration, SystemTime};

/// Compare the previous down-set against the nodes that failed this cycle's
/// liveness probe, returning the updated down-set and the alerts to send.
///
/// Recovery alerts come first, then went-down / still-down alerts in probe
/// order. The first-down timestamp of a node that stays down is carried
/// forward unchanged, so the duration reported on recovery spans the whole
/// outage regardless of any intermediate re-alerts.
pub fn diff_endpoints(
    previous: Vec<DownRecord>,
    failing: &[String],
    now: SystemTime,
    schedule: &TriggerSchedule,
) -> (Vec<DownRecord>, Vec<String>) {
    let mut alerts = Vec::new();

    for recovered in previous.iter().filter(|r| !failing.contains(&r.node)) {
        let downtime = now
            .duration_since(recovered.since)
            .unwrap_or(Duration::ZERO);
        alerts.push(format!(
            "API node {} is back up, after being down for {}",
            recovered.node,
            humantime::format_duration(Duration::from_secs(downtime.as_secs()))
        ));
    }

    let mut down = Vec::with_capacity(failing.len());
    for node in failing {
        match previous.iter().find(|r| &r.node == node) {
            Some(existing) => {
                let secs = now
                    .duration_since(existing.since)
                    .unwrap_or(Duration::ZERO)
                    .as_secs();
                if schedule.should_fire_after(secs) {
                    alerts.push(format!(
                        "API node {} is still down, duration {}",
                        node,
                        humantime::format_duration(Duration::from_secs(secs))
                    ));
                }
                down.push(existing.clone());
            }
            None => {
                alerts.push(format!("API node {} failed to reply", node));
                down.push(DownRecord {
                    node: node.clone(),
                    since: now,
                });
            }
        }
    }

    (down, alerts)
}
