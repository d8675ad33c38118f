//! Daily calorie counter shared between the analysis flow and any number of
//! observers.
//!
//! The running total is scoped to a calendar day. Activation compares the
//! persisted `last_updated_date` with today's date and zeroes the total when
//! they differ; activating again on the same day never resets it.

use crate::error::AppError;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use storage::Preferences;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const LAST_UPDATED_KEY: &str = "last_updated_date";
pub const TOTAL_KEY: &str = "calories_total";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct DailyProgress {
    tx: Arc<watch::Sender<f32>>,
    goal: f32,
}

impl DailyProgress {
    pub fn new(goal: f32) -> Self {
        let (tx, _rx) = watch::channel(0.0_f32);
        Self {
            tx: Arc::new(tx),
            goal,
        }
    }

    pub fn goal(&self) -> f32 {
        self.goal
    }

    pub fn current(&self) -> f32 {
        *self.tx.borrow()
    }

    /// Adds `amount` kcal and wakes every subscriber.
    pub fn increase(&self, amount: f32) {
        if !amount.is_finite() || amount < 0.0 {
            warn!(amount, "ignoring invalid calorie increase");
            return;
        }
        self.tx.send_modify(|total| *total += amount);
        debug!(amount, total = self.current(), "daily progress increased");
    }

    fn reset(&self) {
        self.tx.send_replace(0.0);
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub async fn activate(&self, prefs: &Preferences) -> Result<bool, AppError> {
        self.activate_on(prefs, Local::now().date_naive()).await
    }

    /// Returns true when the total was reset for a new day.
    pub async fn activate_on(
        &self,
        prefs: &Preferences,
        today: NaiveDate,
    ) -> Result<bool, AppError> {
        let today = today.format(DATE_FORMAT).to_string();
        let last = prefs.get(LAST_UPDATED_KEY).await?;
        if last.as_deref() != Some(today.as_str()) {
            self.reset();
            prefs.put(LAST_UPDATED_KEY, &today).await?;
            prefs.remove(TOTAL_KEY).await?;
            info!(previous = ?last, %today, "daily progress reset");
            return Ok(true);
        }

        let stored = prefs
            .get(TOTAL_KEY)
            .await?
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0);
        if let Some(stored) = stored {
            // Only ever raise the in-memory value so observers stay monotonic.
            self.tx.send_if_modified(|total| {
                if stored > *total {
                    *total = stored;
                    true
                } else {
                    false
                }
            });
        }
        Ok(false)
    }

    pub async fn save(&self, prefs: &Preferences) -> Result<(), AppError> {
        prefs.put(TOTAL_KEY, &self.current().to_string()).await?;
        Ok(())
    }

    pub fn display(&self) -> ProgressDisplay {
        ProgressDisplay {
            current: self.current(),
            goal: self.goal,
        }
    }
}

/// Detaches from the counter when dropped.
pub struct ProgressSubscription {
    rx: watch::Receiver<f32>,
}

impl ProgressSubscription {
    pub fn current(&self) -> f32 {
        *self.rx.borrow()
    }

    /// Waits for the next change. `None` once the counter is gone.
    pub async fn changed(&mut self) -> Option<f32> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn unsubscribe(self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressDisplay {
    pub current: f32,
    pub goal: f32,
}

impl ProgressDisplay {
    /// `current/goal` with both sides truncated to whole kcal.
    pub fn label(&self) -> String {
        format!("{}/{}", self.current as i64, self.goal as i64)
    }

    /// Value for the indicator, which never draws past the goal.
    pub fn bounded(&self) -> f32 {
        self.current.min(self.goal)
    }

    pub fn fraction(&self) -> f32 {
        if self.goal <= 0.0 {
            return 0.0;
        }
        self.bounded() / self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn prefs() -> Preferences {
        let pool = storage::connect("sqlite::memory:").await.unwrap();
        storage::migrate(&pool).await.unwrap();
        Preferences::new(pool, "home_prefs")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn first_activation_resets_and_stores_date() {
        let prefs = prefs().await;
        let progress = DailyProgress::new(300.0);
        progress.increase(50.0);
        assert!(progress.activate_on(&prefs, day(1)).await.unwrap());
        assert_eq!(progress.current(), 0.0);
        assert_eq!(
            prefs.get(LAST_UPDATED_KEY).await.unwrap().as_deref(),
            Some("2024-06-01")
        );
    }

    #[tokio::test]
    async fn same_day_activation_keeps_total() {
        let prefs = prefs().await;
        let progress = DailyProgress::new(300.0);
        progress.activate_on(&prefs, day(1)).await.unwrap();
        progress.increase(120.0);
        assert!(!progress.activate_on(&prefs, day(1)).await.unwrap());
        assert!(!progress.activate_on(&prefs, day(1)).await.unwrap());
        assert_eq!(progress.current(), 120.0);
    }

    #[tokio::test]
    async fn new_day_resets_total_and_updates_date() {
        let prefs = prefs().await;
        let progress = DailyProgress::new(300.0);
        progress.activate_on(&prefs, day(1)).await.unwrap();
        progress.increase(250.0);
        progress.save(&prefs).await.unwrap();

        assert!(progress.activate_on(&prefs, day(2)).await.unwrap());
        assert_eq!(progress.current(), 0.0);
        assert_eq!(
            prefs.get(LAST_UPDATED_KEY).await.unwrap().as_deref(),
            Some("2024-06-02")
        );
        assert_eq!(prefs.get(TOTAL_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn saved_total_is_restored_on_same_day() {
        let prefs = prefs().await;
        let first = DailyProgress::new(300.0);
        first.activate_on(&prefs, day(3)).await.unwrap();
        first.increase(193.0);
        first.save(&prefs).await.unwrap();

        let second = DailyProgress::new(300.0);
        assert!(!second.activate_on(&prefs, day(3)).await.unwrap());
        assert_eq!(second.current(), 193.0);
    }

    #[test]
    fn invalid_amounts_are_ignored() {
        let progress = DailyProgress::new(300.0);
        progress.increase(10.0);
        progress.increase(-5.0);
        progress.increase(f32::NAN);
        progress.increase(f32::INFINITY);
        assert_eq!(progress.current(), 10.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increases_are_not_lost() {
        let progress = DailyProgress::new(300.0);
        let mut handles = Vec::new();
        for _ in 0..50 {
            let p = progress.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..20 {
                    p.increase(1.0);
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(progress.current(), 1000.0);
    }

    #[tokio::test]
    async fn subscribers_see_updates_and_detach() {
        let progress = DailyProgress::new(300.0);
        let mut home = progress.subscribe();
        let other = progress.subscribe();
        assert_eq!(progress.subscriber_count(), 2);

        progress.increase(42.0);
        assert_eq!(home.changed().await, Some(42.0));
        assert_eq!(other.current(), 42.0);

        other.unsubscribe();
        assert_eq!(progress.subscriber_count(), 1);
        drop(home);
        assert_eq!(progress.subscriber_count(), 0);

        // Updates with nobody watching still land.
        progress.increase(8.0);
        assert_eq!(progress.current(), 50.0);
    }

    #[test]
    fn display_bounds_indicator_but_not_value() {
        let progress = DailyProgress::new(300.0);
        progress.increase(123.7);
        let d = progress.display();
        assert_eq!(d.label(), "123/300");
        assert!((d.fraction() - 123.7 / 300.0).abs() < 1e-6);

        progress.increase(400.0);
        let d = progress.display();
        assert_eq!(d.label(), "523/300");
        assert_eq!(d.bounded(), 300.0);
        assert_eq!(d.fraction(), 1.0);
    }
}
