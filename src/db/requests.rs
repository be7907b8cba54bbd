//! Request CRUD and lifecycle transitions.

use super::events::record_transition;
use super::{Database, now_ms};
use crate::error::{LifecycleError, LifecycleResult};
use crate::lifecycle::{TransitionAction, check_transition};
use crate::types::{
    Entitlement, Priority, Request, RequestStatus, SkillGroup, Submission, SupportTier,
    UnknownVariant,
};
use rusqlite::{Connection, Row, params};

/// Parse an enum column, surfacing unknown stored values as a conversion
/// failure instead of a panic.
fn parse_column<T>(
    field: &'static str,
    value: String,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(UnknownVariant::new(field, value)),
        )
    })
}

pub(crate) fn parse_request_row(row: &Row) -> rusqlite::Result<Request> {
    let entitlement: String = row.get("entitlement")?;
    let skill_group: String = row.get("skill_group")?;
    let support_tier: String = row.get("support_tier")?;
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;

    Ok(Request {
        id: row.get("id")?,
        ticket: row.get("ticket")?,
        entitlement: parse_column("entitlement", entitlement, Entitlement::parse)?,
        skill_group: parse_column("skill_group", skill_group, SkillGroup::parse)?,
        support_tier: parse_column("support_tier", support_tier, SupportTier::parse)?,
        priority: parse_column("priority", priority, Priority::parse)?,
        issue_description: row.get("issue_description")?,
        help_required: row.get("help_required")?,
        user_id: row.get("user_id")?,
        channel_id: row.get("channel_id")?,
        correlation_key: row.get("correlation_key")?,
        status: parse_column("status", status, RequestStatus::parse)?,
        created_at: row.get("created_at")?,
        resolved_at: row.get("resolved_at")?,
        discarded_at: row.get("discarded_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a request using an existing connection.
fn get_request_internal(conn: &Connection, id: i64) -> LifecycleResult<Option<Request>> {
    let mut stmt = conn.prepare("SELECT * FROM requests WHERE id = ?1")?;

    match stmt.query_row(params![id], parse_request_row) {
        Ok(request) => Ok(Some(request)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Internal helper to find a request by correlation key.
fn find_by_key_internal(conn: &Connection, key: &str) -> LifecycleResult<Option<Request>> {
    let mut stmt = conn.prepare("SELECT * FROM requests WHERE correlation_key = ?1")?;

    match stmt.query_row(params![key], parse_request_row) {
        Ok(request) => Ok(Some(request)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reject empty or whitespace-only text fields.
fn require_text(field: &'static str, value: &str) -> LifecycleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::missing_field(field));
    }
    Ok(trimmed.to_string())
}

/// Parse a select-style field against its allowed value set.
fn require_choice<T>(
    field: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    allowed: &[&'static str],
) -> LifecycleResult<T> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::missing_field(field));
    }
    parse(trimmed).ok_or_else(|| {
        LifecycleError::invalid_field(field, format!("must be one of: {}", allowed.join(", ")))
    })
}

/// A submission with every field validated and typed.
struct ValidatedSubmission {
    ticket: String,
    entitlement: Entitlement,
    skill_group: SkillGroup,
    support_tier: SupportTier,
    priority: Priority,
    issue_description: String,
    help_required: String,
}

fn validate_submission(submission: &Submission) -> LifecycleResult<ValidatedSubmission> {
    Ok(ValidatedSubmission {
        ticket: require_text("ticket", &submission.ticket)?,
        entitlement: require_choice(
            "entitlement",
            &submission.entitlement,
            Entitlement::parse,
            &Entitlement::ALL.map(|e| e.as_str()),
        )?,
        skill_group: require_choice(
            "skill_group",
            &submission.skill_group,
            SkillGroup::parse,
            &SkillGroup::ALL.map(|g| g.as_str()),
        )?,
        support_tier: require_choice(
            "support_tier",
            &submission.support_tier,
            SupportTier::parse,
            &SupportTier::ALL.map(|t| t.as_str()),
        )?,
        priority: require_choice(
            "priority",
            &submission.priority,
            Priority::parse,
            &Priority::ALL.map(|p| p.as_str()),
        )?,
        issue_description: require_text("issue_description", &submission.issue_description)?,
        help_required: require_text("help_required", &submission.help_required)?,
    })
}

impl Database {
    /// Create a new request with status `open`.
    ///
    /// Validates every form field before touching the store; the insert and
    /// the initial transition-log row commit together.
    pub fn create_request(
        &self,
        submission: &Submission,
        user_id: &str,
        channel_id: &str,
    ) -> LifecycleResult<Request> {
        let fields = validate_submission(submission)?;
        let user_id = require_text("user_id", user_id)?;
        let channel_id = require_text("channel_id", channel_id)?;
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO requests (
                    ticket, entitlement, skill_group, support_tier, priority,
                    issue_description, help_required, user_id, channel_id,
                    status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    &fields.ticket,
                    fields.entitlement.as_str(),
                    fields.skill_group.as_str(),
                    fields.support_tier.as_str(),
                    fields.priority.as_str(),
                    &fields.issue_description,
                    &fields.help_required,
                    &user_id,
                    &channel_id,
                    RequestStatus::Open.as_str(),
                    now,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            record_transition(&tx, id, RequestStatus::Open, None)?;

            tx.commit()?;

            Ok(Request {
                id,
                ticket: fields.ticket,
                entitlement: fields.entitlement,
                skill_group: fields.skill_group,
                support_tier: fields.support_tier,
                priority: fields.priority,
                issue_description: fields.issue_description,
                help_required: fields.help_required,
                user_id,
                channel_id,
                correlation_key: None,
                status: RequestStatus::Open,
                created_at: now,
                resolved_at: None,
                discarded_at: None,
                updated_at: now,
            })
        })
    }

    /// Get a request by id.
    pub fn get_request(&self, id: i64) -> LifecycleResult<Option<Request>> {
        self.with_conn(|conn| get_request_internal(conn, id))
    }

    /// Find a request by its correlation key.
    pub fn find_by_key(&self, key: &str) -> LifecycleResult<Option<Request>> {
        self.with_conn(|conn| find_by_key_internal(conn, key))
    }

    /// Attach the announcement-message identifier to a request.
    ///
    /// Exactly-once: a second attachment for the same request, or reuse of
    /// a key already attached to another request, is a conflict.
    pub fn attach_correlation_key(&self, id: i64, key: &str) -> LifecycleResult<Request> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LifecycleError::missing_field("correlation_key"));
        }
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_request_internal(&tx, id)?
                .ok_or(LifecycleError::RequestNotFound { id })?;
            if let Some(existing) = current.correlation_key {
                return Err(LifecycleError::KeyAlreadyAttached { id, key: existing });
            }

            let updated = tx.execute(
                "UPDATE requests SET correlation_key = ?1, updated_at = ?2
                 WHERE id = ?3 AND correlation_key IS NULL",
                params![key, now, id],
            );
            match updated {
                Ok(0) => {
                    return Err(LifecycleError::KeyAlreadyAttached {
                        id,
                        key: key.to_string(),
                    });
                }
                Ok(_) => {}
                Err(e)
                    if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) =>
                {
                    return Err(LifecycleError::KeyInUse {
                        key: key.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }

            let refreshed = get_request_internal(&tx, id)?
                .ok_or(LifecycleError::RequestNotFound { id })?;
            tx.commit()?;
            Ok(refreshed)
        })
    }

    /// Apply a lifecycle transition to the request identified by `key`.
    ///
    /// The status change is a single conditional update keyed on the set of
    /// states the action is legal from. That condition, enforced by the
    /// store, is what serializes racing button clicks: of two concurrent
    /// transitions on one key, exactly one matches and the other sees an
    /// illegal transition. Holds across process instances as well, since
    /// nothing here relies on in-process locking.
    pub fn apply_transition(
        &self,
        key: &str,
        action: TransitionAction,
        actor: Option<&str>,
    ) -> LifecycleResult<Request> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = find_by_key_internal(&tx, key)?
                .ok_or_else(|| LifecycleError::key_not_found(key))?;
            let target = check_transition(current.status, action)?;

            let set_clause = match action {
                TransitionAction::Resolve => "status = 'resolved', resolved_at = ?1, updated_at = ?1",
                TransitionAction::Discard => {
                    "status = 'discarded', discarded_at = ?1, updated_at = ?1"
                }
                TransitionAction::Reopen => {
                    "status = 'reopened', resolved_at = NULL, discarded_at = NULL, updated_at = ?1"
                }
            };
            let allowed: Vec<String> = action
                .allowed_from()
                .iter()
                .map(|s| format!("'{}'", s.as_str()))
                .collect();
            let sql = format!(
                "UPDATE requests SET {} WHERE correlation_key = ?2 AND status IN ({})",
                set_clause,
                allowed.join(", ")
            );

            let updated = tx.execute(&sql, params![now, key])?;
            if updated == 0 {
                // Another writer moved the request between our read and the
                // update; the click loses the race.
                return Err(LifecycleError::InvalidTransition {
                    action,
                    status: current.status,
                });
            }

            record_transition(&tx, current.id, target, actor)?;

            let refreshed = get_request_internal(&tx, current.id)?
                .ok_or(LifecycleError::RequestNotFound { id: current.id })?;
            tx.commit()?;
            Ok(refreshed)
        })
    }

    /// Mark the request announced by `key` as resolved.
    pub fn resolve(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.apply_transition(key, TransitionAction::Resolve, actor)
    }

    /// Mark the request announced by `key` as discarded.
    pub fn discard(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.apply_transition(key, TransitionAction::Discard, actor)
    }

    /// Reopen a resolved or discarded request.
    pub fn reopen(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.apply_transition(key, TransitionAction::Reopen, actor)
    }

    /// Active requests created before `older_than`, oldest first.
    ///
    /// Read-only: the reminder sweep never mutates request status.
    pub fn reminder_candidates(&self, older_than: i64) -> LifecycleResult<Vec<Request>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM requests
                 WHERE status IN ('open', 'reopened') AND created_at < ?1
                 ORDER BY created_at ASC",
            )?;

            let requests = stmt
                .query_map(params![older_than], parse_request_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(requests)
        })
    }
}
