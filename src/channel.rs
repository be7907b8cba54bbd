//! Presentation collaborator boundary.
//!
//! The chat SDK sits behind this trait: the lifecycle manager hands it
//! rendered payloads and gets back opaque message identifiers. Whatever id
//! the platform assigns to a posted announcement becomes the request's
//! correlation key.

use crate::announce::Message;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// A channel that can post and update announcement messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Post a message to `channel_id`, returning the platform identifier of
    /// the posted message.
    async fn post_message(&self, channel_id: &str, message: &Message) -> Result<String>;

    /// Replace the content of the message identified by `key`.
    async fn update_message(&self, channel_id: &str, key: &str, message: &Message) -> Result<()>;
}

/// Channel that writes payloads to the process log and mints monotonic
/// message ids. Used for local runs; a real chat adapter replaces it in
/// deployment.
#[derive(Default)]
pub struct ConsoleChannel {
    counter: AtomicU64,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    async fn post_message(&self, channel_id: &str, message: &Message) -> Result<String> {
        let key = format!("console-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::info!(channel = channel_id, key = %key, text = %message.text, "post");
        tracing::debug!(blocks = %message.blocks, "post blocks");
        Ok(key)
    }

    async fn update_message(&self, channel_id: &str, key: &str, message: &Message) -> Result<()> {
        tracing::info!(channel = channel_id, key = %key, text = %message.text, "update");
        tracing::debug!(blocks = %message.blocks, "update blocks");
        Ok(())
    }
}
