use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backend::{reply_for, BotBackend};
use super::commands::BotCommand;
use super::telegram::{next_offset, TelegramClient, Update};

pub struct BotPoller {
    telegram: TelegramClient,
    backend: Arc<dyn BotBackend>,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl BotPoller {
    pub fn new(
        telegram: TelegramClient,
        backend: Arc<dyn BotBackend>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            telegram,
            backend,
            poll_timeout,
            retry_delay: Duration::from_secs(5),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text else {
            return;
        };

        let command = BotCommand::parse(&text);
        debug!(chat_id = message.chat.id, ?command, "Handling bot message");
        let reply = reply_for(self.backend.as_ref(), command).await;
        if reply.is_empty() {
            warn!(chat_id = message.chat.id, "Empty reply, nothing sent");
            return;
        }

        if let Err(e) = self.telegram.send_message(message.chat.id, &reply).await {
            error!("Failed to send reply to chat {}: {}", message.chat.id, e);
        }
    }

    /// Long-polls for updates until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("Bot poller started");
        let mut offset = 0;

        loop {
            let updates = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.telegram.get_updates(offset, self.poll_timeout) => result,
            };

            match updates {
                Ok(updates) => {
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!("Polling for updates failed, retrying: {}", e);
                    } else {
                        error!("Polling for updates failed: {}", e);
                    }
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Bot poller stopped");
    }
}
