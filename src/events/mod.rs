use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Cloneable handle used by services to publish domain events
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Mutations must not fail because the event loop is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

/// Events emitted after successful mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Business events
    BusinessCreated(i64),
    BusinessUpdated(i64),
    BusinessDeleted {
        business_id: i64,
        categories_deleted: u64,
        photos_deleted: u64,
        wifi_networks_deleted: u64,
    },
    BusinessActivationChanged {
        business_id: i64,
        is_active: bool,
    },
    PhotoAdded {
        business_id: i64,
        photo_id: i64,
    },
    PhotoRemoved {
        business_id: i64,
        photo_id: i64,
    },

    // Menu events
    CategoryCreated(i64),
    CategoryUpdated(i64),
    CategoryDeleted {
        category_id: i64,
        subcategories_deleted: u64,
        items_deleted: u64,
    },
    SubcategoryCreated(i64),
    SubcategoryUpdated(i64),
    SubcategoryDeleted {
        subcategory_id: i64,
        items_deleted: u64,
    },
    ItemCreated(i64),
    ItemUpdated(i64),
    ItemDeleted(i64),

    // WiFi events
    WifiNetworkCreated(i64),
    WifiNetworkUpdated(i64),
    WifiNetworkDeleted(i64),

    // Account events
    UserRegistered(i64),
    UserRoleChanged {
        user_id: i64,
        role: String,
    },
    UserActivationChanged {
        user_id: i64,
        is_active: bool,
    },

    /// Generic event data
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Consumes incoming events for the lifetime of the process.
/// The current consumer only logs; anything that needs to react to
/// mutations (cache busting, notifications) hangs off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CategoryDeleted {
                category_id,
                subcategories_deleted,
                items_deleted,
            } => {
                info!(
                    category_id,
                    subcategories_deleted, items_deleted, "Category cascade completed"
                );
            }
            Event::SubcategoryDeleted {
                subcategory_id,
                items_deleted,
            } => {
                info!(subcategory_id, items_deleted, "Subcategory cascade completed");
            }
            Event::BusinessDeleted {
                business_id,
                categories_deleted,
                photos_deleted,
                wifi_networks_deleted,
            } => {
                info!(
                    business_id,
                    categories_deleted,
                    photos_deleted,
                    wifi_networks_deleted,
                    "Business cascade completed"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
