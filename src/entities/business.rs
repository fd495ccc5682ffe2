use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Business profile entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unique public handle, lowercase
    #[sea_orm(unique)]
    #[validate(length(
        min = 3,
        max = 40,
        message = "Username must be between 3 and 40 characters"
    ))]
    pub username: String,

    /// Display name
    #[validate(length(
        min = 1,
        max = 120,
        message = "Business name must be between 1 and 120 characters"
    ))]
    pub name: String,

    /// Free-form description shown on the profile
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// Directory category tag (e.g. "restaurant", "barbershop")
    pub category: Option<String>,

    /// Human-readable location / address line
    pub location: Option<String>,

    /// Contact phone number
    pub phone: Option<String>,

    /// Contact email
    #[validate(email(message = "Contact email must be a valid email address"))]
    pub email: Option<String>,

    /// Website URL
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    /// WhatsApp number or link
    pub whatsapp: Option<String>,

    /// Instagram handle
    pub instagram: Option<String>,

    /// Facebook page
    pub facebook: Option<String>,

    /// Hosted logo image URL
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    /// Hosted cover image URL
    #[validate(url(message = "Cover URL must be a valid URL"))]
    pub cover_url: Option<String>,

    /// Branding: primary color as a hex string (e.g. "#1a2b3c")
    pub primary_color: Option<String>,

    /// Branding: secondary color as a hex string
    pub secondary_color: Option<String>,

    /// Whether the business is visible in the directory
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::business_photo::Entity")]
    Photos,
    #[sea_orm(has_many = "super::menu_category::Entity")]
    MenuCategories,
    #[sea_orm(has_many = "super::wifi_network::Entity")]
    WifiNetworks,
}

impl Related<super::business_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::menu_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuCategories.def()
    }
}

impl Related<super::wifi_network::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WifiNetworks.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        Ok(active_model)
    }
}
