//! Fan-out of update notifications to subscribers.

use crate::config::NotificationConfig;
use crate::error::{NegotiationError, NegotiationResult};
use chrono::{DateTime, Utc};
use dsc_store::{QueryWindow, Repository};
use dsc_types::{Artifact, Data, EntityKind, Payload, SelfLinkResolver, Subscription, Uri};
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Body posted to a subscriber's callback URL.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub target: Uri,
    pub event: &'static str,
    /// Current artifact data, for subscriptions asking for pushed data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

/// Notifies the subscribers of a target after it changed.
///
/// Delivery runs on a detached task, in parallel across subscribers. A
/// subscriber answering with a server error is retried with a fixed delay;
/// one that keeps failing is logged and otherwise ignored.
#[derive(Clone)]
pub struct SubscriberNotifier {
    client: Client,
    subscriptions: Arc<dyn Repository<Subscription>>,
    artifacts: Arc<dyn Repository<Artifact>>,
    config: NotificationConfig,
}

impl SubscriberNotifier {
    pub fn new(
        subscriptions: Arc<dyn Repository<Subscription>>,
        artifacts: Arc<dyn Repository<Artifact>>,
        config: NotificationConfig,
    ) -> NegotiationResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NegotiationError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            subscriptions,
            artifacts,
            config,
        })
    }

    /// Start notifying every subscriber of `target`. The handle resolves to
    /// the number of subscribers that acknowledged.
    pub fn notify_subscribers(&self, target: Uri) -> JoinHandle<usize> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver_all(target).await })
    }

    async fn deliver_all(&self, target: Uri) -> usize {
        let subscriptions = match self.subscriptions.list(QueryWindow::all()).await {
            Ok(all) => all
                .into_iter()
                .filter(|s| s.target == target)
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(target = %target, error = %e, "Could not load subscriptions");
                return 0;
            }
        };
        if subscriptions.is_empty() {
            debug!(target = %target, "No subscribers to notify");
            return 0;
        }

        let timestamp = Utc::now();
        let deliveries = subscriptions.iter().map(|subscription| {
            let target = target.clone();
            async move {
                let data = if subscription.push_data {
                    self.current_data(&target).await
                } else {
                    None
                };
                let notification = Notification {
                    timestamp,
                    target,
                    event: "UPDATED",
                    data,
                };
                self.deliver(subscription, &notification).await
            }
        });

        let delivered = join_all(deliveries).await.into_iter().filter(|ok| *ok).count();
        info!(
            target = %target,
            subscribers = subscriptions.len(),
            delivered,
            "Subscribers notified"
        );
        delivered
    }

    async fn current_data(&self, target: &Uri) -> Option<Payload> {
        let id = SelfLinkResolver::parse_as(target, EntityKind::Artifact).ok()?;
        match self.artifacts.get(id).await {
            Ok(Some(Artifact {
                data: Data::Local { value },
                ..
            })) if !value.is_empty() => Some(Payload::from_bytes(&value)),
            _ => None,
        }
    }

    async fn deliver(&self, subscription: &Subscription, notification: &Notification) -> bool {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self
                .client
                .post(subscription.url.clone())
                .json(notification)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    debug!(subscriber = %subscription.subscriber, attempt, "Subscriber notified");
                    return true;
                }
                Ok(response) if response.status().is_server_error() => {
                    warn!(
                        subscriber = %subscription.subscriber,
                        status = %response.status(),
                        attempt,
                        "Subscriber failed, retrying"
                    );
                }
                Ok(response) => {
                    warn!(
                        subscriber = %subscription.subscriber,
                        status = %response.status(),
                        "Subscriber rejected notification"
                    );
                    return false;
                }
                Err(e) => {
                    warn!(subscriber = %subscription.subscriber, error = %e, "Subscriber unreachable");
                    return false;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        warn!(
            subscriber = %subscription.subscriber,
            attempts,
            "Giving up on subscriber"
        );
        false
    }
}
