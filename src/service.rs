//! Request lifecycle orchestration.
//!
//! [`RequestService`] is the seam between the store and the presentation
//! collaborator: it persists first, then announces, and on transitions it
//! commits the status change before touching the announcement message.

use crate::announce;
use crate::channel::Channel;
use crate::db::Database;
use crate::error::{LifecycleError, LifecycleResult};
use crate::lifecycle::TransitionAction;
use crate::types::{Request, Stats, Submission};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default delay before the single delivery retry.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub struct RequestService {
    db: Arc<Database>,
    channel: Arc<dyn Channel>,
    retry_backoff: Duration,
}

impl RequestService {
    pub fn new(db: Arc<Database>, channel: Arc<dyn Channel>) -> Self {
        Self {
            db,
            channel,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Set the delay before the single delivery retry.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Accept a form submission: persist the request, announce it, and
    /// attach the announcement's message id as the correlation key.
    ///
    /// If the announcement cannot be delivered even after the retry, the
    /// persisted request is kept (open, without a key) and the delivery
    /// error is surfaced.
    pub async fn submit(
        &self,
        submission: &Submission,
        user_id: &str,
        channel_id: &str,
    ) -> LifecycleResult<Request> {
        let request = self.db.create_request(submission, user_id, channel_id)?;
        info!(id = request.id, ticket = %request.ticket, "request created");

        let card = announce::request_card(&request);
        let key = self.post_with_retry(&request.channel_id, &card).await?;

        let request = self.db.attach_correlation_key(request.id, &key)?;
        info!(id = request.id, key = %key, "request announced");
        Ok(request)
    }

    /// Resolve the request announced by `key`.
    pub async fn resolve(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.transition(key, TransitionAction::Resolve, actor).await
    }

    /// Discard the request announced by `key`.
    pub async fn discard(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.transition(key, TransitionAction::Discard, actor).await
    }

    /// Reopen the request announced by `key`.
    pub async fn reopen(&self, key: &str, actor: Option<&str>) -> LifecycleResult<Request> {
        self.transition(key, TransitionAction::Reopen, actor).await
    }

    /// Fetch the request announced by `key`.
    pub fn lookup(&self, key: &str) -> LifecycleResult<Request> {
        self.db
            .find_by_key(key)?
            .ok_or_else(|| LifecycleError::key_not_found(key))
    }

    pub fn stats(&self) -> LifecycleResult<Stats> {
        self.db.get_stats()
    }

    /// Apply the transition in the store, then refresh the announcement.
    ///
    /// The store update is the one atomic write; if the refresh fails after
    /// its retry the transition stays committed and the caller sees a
    /// channel error it can retry independently.
    async fn transition(
        &self,
        key: &str,
        action: TransitionAction,
        actor: Option<&str>,
    ) -> LifecycleResult<Request> {
        let request = self.db.apply_transition(key, action, actor)?;
        info!(
            id = request.id,
            key = %key,
            status = %request.status,
            actor = actor.unwrap_or("-"),
            "request transitioned"
        );

        let card = announce::card_for(&request);
        self.update_with_retry(&request.channel_id, key, &card)
            .await?;
        Ok(request)
    }

    async fn post_with_retry(
        &self,
        channel_id: &str,
        message: &announce::Message,
    ) -> LifecycleResult<String> {
        match self.channel.post_message(channel_id, message).await {
            Ok(key) => Ok(key),
            Err(first) => {
                warn!(error = %first, "announcement post failed, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.channel
                    .post_message(channel_id, message)
                    .await
                    .map_err(LifecycleError::channel)
            }
        }
    }

    async fn update_with_retry(
        &self,
        channel_id: &str,
        key: &str,
        message: &announce::Message,
    ) -> LifecycleResult<()> {
        match self.channel.update_message(channel_id, key, message).await {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(error = %first, key = %key, "announcement update failed, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.channel
                    .update_message(channel_id, key, message)
                    .await
                    .map_err(LifecycleError::channel)
            }
        }
    }
}
