//! Leader snapshot diffing and misser streak lifecycle.

use crate::trigger::TriggerSchedule;
use crate::types::{Leader, MisserRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Compare two leader snapshots, updating the misser map in place and
/// returning the alerts this cycle produced.
///
/// Alerts come out in snapshot iteration order (unregistrations first), and
/// each leader contributes at most one alert per cycle.
pub fn diff_leaders(
    old: &[Leader],
    new: &[Leader],
    missers: &mut BTreeMap<String, MisserRecord>,
    schedule: &TriggerSchedule,
) -> Vec<String> {
    let mut alerts = Vec::new();

    // Leaders that dropped out of the snapshot. Their misser records go
    // too: a stale record would underflow the miss delta if the name
    // re-registers with a lower missed count.
    for gone in old.iter().filter(|o| !new.iter().any(|l| l.name == o.name)) {
        alerts.push(format!("Leader `{}` unregistered", gone.name));
        if missers.remove(&gone.name).is_some() {
            debug!(leader = %gone.name, "Dropped misser record for unregistered leader");
        }
    }

    for leader in new {
        let Some(old_leader) = old.iter().find(|o| o.name == leader.name) else {
            alerts.push(format!("Leader `{}` registered", leader.name));
            continue;
        };

        match missers.get(&leader.name).copied() {
            Some(misser) => {
                let total = leader.missed.saturating_sub(misser.start) + 1;

                // Streak stopped growing: resolved one way or the other.
                if leader.missed == old_leader.missed {
                    let action = if leader.produced > old_leader.produced {
                        "started producing again"
                    } else {
                        "is out of schedule"
                    };
                    alerts.push(format!(
                        "Leader `{}` {}, after missing *{}* block(s), \
                         total blocks missed now is *{}*",
                        leader.name, action, total, leader.missed
                    ));
                    missers.remove(&leader.name);
                    continue;
                }

                let misses = leader.missed.saturating_sub(misser.last);
                if schedule.should_fire(total, misses) {
                    alerts.push(format!(
                        "Leader `{}` continues missing, now with *{}* block(s) missed",
                        leader.name, total
                    ));
                    missers.insert(
                        leader.name.clone(),
                        MisserRecord {
                            last: leader.missed,
                            ..misser
                        },
                    );
                }
            }
            None => {
                let misses = leader.missed.saturating_sub(old_leader.missed);
                if misses > 0 {
                    missers.insert(
                        leader.name.clone(),
                        MisserRecord {
                            start: old_leader.missed + 1,
                            last: leader.missed,
                        },
                    );
                    alerts.push(format!(
                        "Leader `{}` missed *{}* block(s)",
                        leader.name, misses
                    ));
                }
            }
        }
    }

    alerts
}
