//! Forwards domain events from the broadcast bus to the external
//! notification topic. Delivery is at-least-once, best-effort: a failed
//! POST is logged and dropped, never retried, and never blocks the request
//! that produced the event.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::NotificationConfig;
use crate::domain::events::NotificationEvent;

pub struct Notifier {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl Notifier {
    pub fn new(config: NotificationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build notification client: {e}"))?;

        Ok(Self { client, config })
    }

    /// Spawns the bus listener. Lagged receivers drop the oldest events,
    /// which is acceptable for best-effort delivery.
    pub fn start_listener(self: Arc<Self>, mut rx: broadcast::Receiver<NotificationEvent>) {
        tokio::spawn(async move {
            info!("Notification listener started ({})", self.config.topic_url);
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.publish(&event).await {
                            error!("Error publishing notification: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Notification listener lagged, {} events dropped", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn publish(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        self.client
            .post(&self.config.topic_url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;

        info!("Notification published");
        Ok(())
    }
}
