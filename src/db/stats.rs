//! Aggregation queries for statistics.

use super::Database;
use crate::error::LifecycleResult;
use crate::types::{RequestStatus, Stats};

impl Database {
    /// Get aggregate request counts.
    pub fn get_stats(&self) -> LifecycleResult<Stats> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;

            let mut stats = Stats {
                total,
                ..Stats::default()
            };

            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM requests GROUP BY status")?;
            let counts = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;

            for row in counts {
                let (status, count) = row?;
                match RequestStatus::parse(&status) {
                    Some(s) if s.is_active() => stats.open += count,
                    Some(RequestStatus::Resolved) => stats.resolved += count,
                    Some(RequestStatus::Discarded) => stats.discarded += count,
                    _ => {}
                }
            }

            Ok(stats)
        })
    }
}
