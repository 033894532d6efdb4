// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-group activity decay scheduler.
//!
//! The bot pays more attention to a group right after it was addressed, and
//! that attention fades linearly unless refreshed. [`ActivityScheduler`]
//! owns one independent countdown per active group: [`renew`] installs the
//! configured base level and a background decay task, the task decrements
//! the level on a fixed interval, and a level reaching zero removes its own
//! entry. [`query`] reads the current level without blocking.
//!
//! Levels are stored as integer hundredths so decay arithmetic is exact and
//! no floating-point rounding workaround is needed.
//!
//! [`renew`]: ActivityScheduler::renew
//! [`query`]: ActivityScheduler::query

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_config::SettingsManager;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed decay tick interval.
pub const DECAY_INTERVAL: Duration = Duration::from_secs(60);

/// Level decrement per tick, in hundredths (0.1).
const DECAY_STEP: u32 = 10;

const LEVEL_SCALE: f64 = 100.0;

/// Upper bound of the stored level, in hundredths.
const MAX_LEVEL: u32 = 100;

struct GroupEntry {
    /// Activity level in hundredths, 0..=100.
    level: u32,
    cancel: CancellationToken,
}

struct SchedulerState {
    entries: HashMap<String, GroupEntry>,
    shutting_down: bool,
}

/// Owns one time-decaying participation level per active group.
///
/// All state lives behind a single mutex; renew, decay ticks, query, and
/// shutdown each take it as one critical section, so a query can never
/// observe two tasks for the same key or a transiently absent entry right
/// after a successful renew.
pub struct ActivityScheduler {
    settings: Arc<SettingsManager>,
    state: Arc<Mutex<SchedulerState>>,
}

impl ActivityScheduler {
    /// Creates an idle scheduler reading its base level from `settings`.
    pub fn new(settings: Arc<SettingsManager>) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(SchedulerState {
                entries: HashMap::new(),
                shutting_down: false,
            })),
        }
    }

    /// Resets the group to the configured base level and restarts its decay
    /// countdown. This is a full reset, not an additive boost: any existing
    /// countdown is cancelled before the replacement is installed, within
    /// the same critical section.
    ///
    /// Returns `false` without side effect once shutdown has begun.
    pub fn renew(&self, group: &str) -> bool {
        // Read at call time, never cached. A hand-edited settings record
        // can carry any f64; the saturating cast lands NaN and negatives at
        // 0, and the cap keeps oversized values within 0..=100.
        let base = self.settings.base_activity();
        let level = ((base * LEVEL_SCALE).round() as u32).min(MAX_LEVEL);

        let cancel = CancellationToken::new();
        {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if state.shutting_down {
                warn!(group, "renew ignored: scheduler is shutting down");
                return false;
            }
            if let Some(old) = state.entries.remove(group) {
                old.cancel.cancel();
            }
            state.entries.insert(
                group.to_string(),
                GroupEntry {
                    level,
                    cancel: cancel.clone(),
                },
            );
        }

        tokio::spawn(decay_task(
            Arc::clone(&self.state),
            group.to_string(),
            cancel,
        ));
        info!(group, level = base, "activity renewed");
        true
    }

    /// Returns the group's current level, 0.0 when inactive. Never suspends.
    pub fn query(&self, group: &str) -> f64 {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .entries
            .get(group)
            .map(|e| f64::from(e.level) / LEVEL_SCALE)
            .unwrap_or(0.0)
    }

    /// Groups with a live countdown, with their current levels.
    pub fn active_groups(&self) -> Vec<(String, f64)> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .entries
            .iter()
            .map(|(g, e)| (g.clone(), f64::from(e.level) / LEVEL_SCALE))
            .collect()
    }

    /// Cancels every outstanding countdown and clears all state. Further
    /// `renew` calls become no-ops; no tick re-schedules itself afterwards.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.shutting_down = true;
        for (group, entry) in state.entries.drain() {
            entry.cancel.cancel();
            debug!(group, "decay task cancelled");
        }
        info!("activity scheduler shut down");
    }
}

/// Background countdown for one group.
///
/// Cancellation is checked at every wakeup, and re-checked under the state
/// lock before mutating, so a task replaced or shut down between wakeup and
/// lock acquisition never decrements its successor's entry. The same task
/// that observes level 0 removes the map entry.
async fn decay_task(state: Arc<Mutex<SchedulerState>>, group: String, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(group, "decay task exiting on cancellation");
                return;
            }
            _ = tokio::time::sleep(DECAY_INTERVAL) => {}
        }

        let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
        if cancel.is_cancelled() {
            return;
        }
        let Some(entry) = state.entries.get_mut(&group) else {
            return;
        };
        let previous = entry.level;
        entry.level = entry.level.saturating_sub(DECAY_STEP);
        debug!(
            group,
            from = f64::from(previous) / LEVEL_SCALE,
            to = f64::from(entry.level) / LEVEL_SCALE,
            "activity decayed"
        );
        if entry.level == 0 {
            state.entries.remove(&group);
            info!(group, "activity expired, entry removed");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(base: f64) -> (tempfile::TempDir, ActivityScheduler) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsManager::load(dir.path().join("settings.json")));
        settings.set_base_activity(base);
        (dir, ActivityScheduler::new(settings))
    }

    /// Advances paused time by one decay interval and lets spawned tasks run.
    async fn tick() {
        // Let freshly spawned decay tasks register their sleep timers
        // before the clock moves, or the advance passes them by.
        tokio::task::yield_now().await;
        tokio::time::advance(DECAY_INTERVAL).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn renew_installs_base_level_and_decays_per_interval() {
        let (_dir, sched) = scheduler(0.5);

        assert!(sched.renew("g1"));
        assert_eq!(sched.query("g1"), 0.5);

        tick().await;
        assert_eq!(sched.query("g1"), 0.4);

        // Four more intervals: 0.3, 0.2, 0.1, 0.0 -- then the entry is gone.
        for _ in 0..4 {
            tick().await;
        }
        assert_eq!(sched.query("g1"), 0.0);
        assert!(sched.active_groups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_persisted_base_level_is_clamped() {
        // Bypass the mutator's range check the way a hand-edited record
        // would: the raw file deserializes any f64.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"base_activity": 5.0}"#).unwrap();
        let settings = Arc::new(SettingsManager::load(&path));
        let sched = ActivityScheduler::new(settings);

        sched.renew("g1");
        assert_eq!(sched.query("g1"), 1.0);

        std::fs::write(&path, r#"{"base_activity": -2.0}"#).unwrap();
        let settings = Arc::new(SettingsManager::load(&path));
        let sched = ActivityScheduler::new(settings);

        sched.renew("g2");
        assert_eq!(sched.query("g2"), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn query_returns_zero_for_unknown_group() {
        let (_dir, sched) = scheduler(0.5);
        assert_eq!(sched.query("never-renewed"), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn renew_reads_base_level_at_call_time() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsManager::load(dir.path().join("settings.json")));
        settings.set_base_activity(0.3);
        let sched = ActivityScheduler::new(Arc::clone(&settings));

        sched.renew("g1");
        assert_eq!(sched.query("g1"), 0.3);

        settings.set_base_activity(0.8);
        sched.renew("g1");
        assert_eq!(sched.query("g1"), 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn renewing_replaces_the_countdown_without_duplicate_decrements() {
        let (_dir, sched) = scheduler(0.5);

        sched.renew("g1");
        tick().await;
        assert_eq!(sched.query("g1"), 0.4);

        // Renew mid-flight: full reset to base, old task retired.
        sched.renew("g1");
        assert_eq!(sched.query("g1"), 0.5);

        // Exactly one live countdown: two intervals decay by exactly 0.2.
        tick().await;
        assert_eq!(sched.query("g1"), 0.4);
        tick().await;
        assert_eq!(sched.query("g1"), 0.3);
        assert_eq!(sched.active_groups().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn groups_decay_independently() {
        let (_dir, sched) = scheduler(0.2);

        sched.renew("g1");
        tick().await;
        sched.renew("g2");

        assert_eq!(sched.query("g1"), 0.1);
        assert_eq!(sched.query("g2"), 0.2);

        tick().await;
        // g1 reached zero and was removed; g2 is still alive.
        assert_eq!(sched.query("g1"), 0.0);
        assert_eq!(sched.query("g2"), 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticks_and_rejects_renewals() {
        let (_dir, sched) = scheduler(0.5);

        sched.renew("g1");
        sched.renew("g2");
        sched.shutdown();

        assert_eq!(sched.query("g1"), 0.0);
        assert_eq!(sched.query("g2"), 0.0);
        assert!(!sched.renew("g1"));

        // No tick may fire after shutdown.
        tick().await;
        tick().await;
        assert!(sched.active_groups().is_empty());
    }
}
