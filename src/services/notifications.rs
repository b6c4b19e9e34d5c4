//! Durable alert notification records
//!
//! Guardian/operator-facing alerts are persisted through a JetStream work
//! queue that the platform's notification consumers drain. Persistence is
//! fire-and-forget relative to the tick loop: failures are logged and
//! dropped, never retried synchronously.

use std::sync::Arc;

use anyhow::Result;
use async_nats::jetstream::{self, Context as JsContext};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{AlertEvent, AlertNotification};

// Stream and subject names
const STREAM_NAME: &str = "BUSLINK_NOTIFICATIONS";
const SUBJECT_PREFIX: &str = "buslink.notifications.alert";

/// Destination for durable alert records
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn persist(&self, notification: AlertNotification) -> Result<()>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Persist a notification without blocking the caller. Failures are logged
/// and dropped.
pub fn persist_async(
    store: &Arc<dyn NotificationStore>,
    vehicle_id: Uuid,
    route_id: Uuid,
    stop_name: &str,
    event: AlertEvent,
) {
    let store = store.clone();
    let notification = AlertNotification::new(vehicle_id, route_id, stop_name, event);

    tokio::spawn(async move {
        if let Err(e) = store.persist(notification).await {
            warn!("Failed to persist alert notification: {:#}", e);
        }
    });
}

/// JetStream-backed notification store
pub struct JetStreamNotificationStore {
    js: JsContext,
}

impl JetStreamNotificationStore {
    /// Create the store, initializing the JetStream stream
    pub async fn new(client: async_nats::Client) -> Result<Self> {
        let js = jetstream::new(client);

        let stream_config = jetstream::stream::Config {
            name: STREAM_NAME.to_string(),
            subjects: vec![format!("{}.*", SUBJECT_PREFIX)],
            max_messages: 50_000,
            max_bytes: 20 * 1024 * 1024,
            retention: jetstream::stream::RetentionPolicy::WorkQueue,
            ..Default::default()
        };
        js.get_or_create_stream(stream_config).await?;
        info!("JetStream notification stream '{}' ready", STREAM_NAME);

        Ok(Self { js })
    }
}

#[async_trait]
impl NotificationStore for JetStreamNotificationStore {
    async fn persist(&self, notification: AlertNotification) -> Result<()> {
        let subject = format!("{}.{}", SUBJECT_PREFIX, notification.event.alert_type.as_str());
        let payload = serde_json::to_vec(&notification)?;
        self.js.publish(subject, payload.into()).await?.await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "JetStreamNotifications"
    }
}

/// In-memory notification store for tests and NATS-less runs
#[derive(Default)]
pub struct InMemoryNotificationStore {
    records: Mutex<Vec<AlertNotification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AlertNotification> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn persist(&self, notification: AlertNotification) -> Result<()> {
        self.records.lock().push(notification);
        Ok(())
    }

    fn name(&self) -> &str {
        "InMemoryNotifications"
    }
}
