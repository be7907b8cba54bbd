//! Periodic reminder sweep.
//!
//! The sweep reads active requests older than the configured threshold and
//! posts a reminder card for each. It never mutates request status; the
//! lifecycle manager stays passive and the sweep stays read-only.

use crate::announce;
use crate::channel::Channel;
use crate::config::RemindersConfig;
use crate::db::{Database, now_ms};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct ReminderSweep {
    db: Arc<Database>,
    channel: Arc<dyn Channel>,
    config: RemindersConfig,
}

impl ReminderSweep {
    pub fn new(db: Arc<Database>, channel: Arc<dyn Channel>, config: RemindersConfig) -> Self {
        Self {
            db,
            channel,
            config,
        }
    }

    /// Post a reminder for every active request older than the threshold.
    /// Returns the number of reminders posted.
    pub async fn sweep_once(&self) -> Result<usize> {
        let cutoff = now_ms() - (self.config.age_threshold_hours as i64) * 3_600_000;
        let candidates = self.db.reminder_candidates(cutoff)?;

        let mut posted = 0;
        for request in &candidates {
            let card = announce::reminder_card(request);
            match self.channel.post_message(&request.channel_id, &card).await {
                Ok(_) => posted += 1,
                Err(e) => {
                    warn!(id = request.id, error = %e, "reminder post failed");
                }
            }
        }

        if posted > 0 {
            info!(posted, "reminder sweep complete");
        }
        Ok(posted)
    }

    /// Run the sweep on a fixed interval until the process exits.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = self.sweep_once().await {
                error!(error = %e, "reminder sweep failed");
            }
        }
    }
}
