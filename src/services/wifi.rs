use crate::{
    auth::AuthUser,
    entities::{business, wifi_network, wifi_network::SecurityType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// CRUD over the WiFi credentials a business publishes for guests.
/// Flat collection, no hierarchy, no cascade.
#[derive(Clone)]
pub struct WifiService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WifiService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_networks(
        &self,
        business_id: i64,
    ) -> Result<Vec<wifi_network::Model>, ServiceError> {
        wifi_network::Entity::find()
            .filter(wifi_network::Column::BusinessId.eq(business_id))
            .order_by_asc(wifi_network::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn create_network(
        &self,
        actor: &AuthUser,
        input: CreateWifiInput,
    ) -> Result<wifi_network::Model, ServiceError> {
        let ssid = input.ssid.trim().to_string();
        if ssid.is_empty() {
            return Err(ServiceError::ValidationError(
                "SSID is required".to_string(),
            ));
        }
        if input.security_type != SecurityType::Nopass
            && input.password.as_deref().map_or(true, |p| p.is_empty())
        {
            return Err(ServiceError::ValidationError(
                "Password is required unless the network is open".to_string(),
            ));
        }

        let owner = business::Entity::find_by_id(input.business_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Business {} not found", input.business_id))
            })?;
        ensure_can_manage(actor, owner.id)?;

        let network = wifi_network::ActiveModel {
            business_id: Set(input.business_id),
            ssid: Set(ssid),
            password: Set(input.password),
            security_type: Set(input.security_type),
            is_hidden: Set(input.is_hidden.unwrap_or(false)),
            ..Default::default()
        };

        let network = network.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WifiNetworkCreated(network.id))
            .await;

        info!(
            "Created wifi network {} for business {}",
            network.id, input.business_id
        );
        Ok(network)
    }

    #[instrument(skip(self, input))]
    pub async fn update_network(
        &self,
        actor: &AuthUser,
        network_id: i64,
        input: UpdateWifiInput,
    ) -> Result<wifi_network::Model, ServiceError> {
        let network = self.get_network(network_id).await?;
        ensure_can_manage(actor, network.business_id)?;

        let mut active: wifi_network::ActiveModel = network.into();

        if let Some(ssid) = input.ssid {
            let ssid = ssid.trim().to_string();
            if ssid.is_empty() {
                return Err(ServiceError::ValidationError(
                    "SSID is required".to_string(),
                ));
            }
            active.ssid = Set(ssid);
        }
        if let Some(password) = input.password {
            active.password = Set(Some(password));
        }
        if let Some(security_type) = input.security_type {
            active.security_type = Set(security_type);
        }
        if let Some(is_hidden) = input.is_hidden {
            active.is_hidden = Set(is_hidden);
        }

        let network = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WifiNetworkUpdated(network.id))
            .await;

        Ok(network)
    }

    #[instrument(skip(self))]
    pub async fn delete_network(
        &self,
        actor: &AuthUser,
        network_id: i64,
    ) -> Result<(), ServiceError> {
        let network = self.get_network(network_id).await?;
        ensure_can_manage(actor, network.business_id)?;

        let active: wifi_network::ActiveModel = network.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WifiNetworkDeleted(network_id))
            .await;

        info!("Deleted wifi network {}", network_id);
        Ok(())
    }

    async fn get_network(&self, network_id: i64) -> Result<wifi_network::Model, ServiceError> {
        wifi_network::Entity::find_by_id(network_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("WiFi network {} not found", network_id))
            })
    }
}

fn ensure_can_manage(actor: &AuthUser, business_id: i64) -> Result<(), ServiceError> {
    if actor.can_manage_business(business_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "Not allowed to manage business {}",
            business_id
        )))
    }
}

/// Input for publishing a network
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateWifiInput {
    pub business_id: i64,
    pub ssid: String,
    pub password: Option<String>,
    pub security_type: SecurityType,
    pub is_hidden: Option<bool>,
}

/// Input for updating a network
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateWifiInput {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub security_type: Option<SecurityType>,
    pub is_hidden: Option<bool>,
}
