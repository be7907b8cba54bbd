//! Append-only transition log.
//!
//! One row per lifecycle transition, written in the same transaction as the
//! status update so the log never disagrees with the requests table.

use super::Database;
use crate::error::LifecycleResult;
use crate::types::{RequestEvent, RequestStatus, UnknownVariant};
use rusqlite::{Connection, params};

/// Record that `request_id` entered `status`.
pub(crate) fn record_transition(
    conn: &Connection,
    request_id: i64,
    status: RequestStatus,
    actor: Option<&str>,
) -> LifecycleResult<()> {
    conn.execute(
        "INSERT INTO request_events (request_id, status, actor, timestamp)
         VALUES (?1, ?2, ?3, ?4)",
        params![request_id, status.as_str(), actor, super::now_ms()],
    )?;
    Ok(())
}

impl Database {
    /// Get the transition history for a request, oldest first.
    pub fn get_request_history(&self, request_id: i64) -> LifecycleResult<Vec<RequestEvent>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, request_id, status, actor, timestamp
                 FROM request_events
                 WHERE request_id = ?1
                 ORDER BY id ASC",
            )?;

            let events = stmt
                .query_map(params![request_id], |row| {
                    let status: String = row.get(2)?;
                    Ok(RequestEvent {
                        id: row.get(0)?,
                        request_id: row.get(1)?,
                        status: RequestStatus::parse(&status).ok_or_else(|| {
                            rusqlite::Error::FromSqlConversionFailure(
                                2,
                                rusqlite::types::Type::Text,
                                Box::new(UnknownVariant::new("status", status.clone())),
                            )
                        })?,
                        actor: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(events)
        })
    }
}
