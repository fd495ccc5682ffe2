use crate::{
    auth::AuthUser,
    entities::{business, menu_category, menu_item, menu_subcategory},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Service managing the three-level menu hierarchy:
/// category → subcategory → item.
///
/// Deleting a parent cascades over its descendants inside one database
/// transaction; a failed cascade rolls back completely instead of leaving
/// orphaned children behind.
#[derive(Clone)]
pub struct MenuService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Descendant counts reported by a cascade delete
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CascadeOutcome {
    pub subcategories_deleted: u64,
    pub items_deleted: u64,
}

impl MenuService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- categories ----

    /// Lists a business's categories ordered by display_order, ties by id
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        business_id: i64,
    ) -> Result<Vec<menu_category::Model>, ServiceError> {
        menu_category::Entity::find()
            .filter(menu_category::Column::BusinessId.eq(business_id))
            .order_by_asc(menu_category::Column::DisplayOrder)
            .order_by_asc(menu_category::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Creates a category under a business
    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        actor: &AuthUser,
        input: CreateCategoryInput,
    ) -> Result<menu_category::Model, ServiceError> {
        let name = required_name(&input.name)?;

        let owner = business::Entity::find_by_id(input.business_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Business {} not found", input.business_id))
            })?;
        ensure_can_manage(actor, owner.id)?;

        let category = menu_category::ActiveModel {
            business_id: Set(input.business_id),
            name: Set(name),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category {}", category.id);
        Ok(category)
    }

    /// Partially updates a category by id
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        actor: &AuthUser,
        category_id: i64,
        input: UpdateCategoryInput,
    ) -> Result<menu_category::Model, ServiceError> {
        let category = self.get_category(category_id).await?;
        ensure_can_manage(actor, category.business_id)?;

        let mut active: menu_category::ActiveModel = category.into();

        if let Some(name) = input.name {
            active.name = Set(required_name(&name)?);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(display_order) = input.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category.id))
            .await;

        info!("Updated category {}", category.id);
        Ok(category)
    }

    /// Deletes a category together with every subcategory and item below it.
    /// The whole cascade happens in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_category(
        &self,
        actor: &AuthUser,
        category_id: i64,
    ) -> Result<CascadeOutcome, ServiceError> {
        let category = self.get_category(category_id).await?;
        ensure_can_manage(actor, category.business_id)?;

        let outcome = self
            .db
            .transaction::<_, CascadeOutcome, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let subcategory_ids: Vec<i64> = menu_subcategory::Entity::find()
                        .filter(menu_subcategory::Column::CategoryId.eq(category_id))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|s| s.id)
                        .collect();

                    let items_deleted = if subcategory_ids.is_empty() {
                        0
                    } else {
                        menu_item::Entity::delete_many()
                            .filter(menu_item::Column::SubcategoryId.is_in(subcategory_ids))
                            .exec(txn)
                            .await?
                            .rows_affected
                    };

                    let subcategories_deleted = menu_subcategory::Entity::delete_many()
                        .filter(menu_subcategory::Column::CategoryId.eq(category_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    menu_category::Entity::delete_by_id(category_id)
                        .exec(txn)
                        .await?;

                    Ok(CascadeOutcome {
                        subcategories_deleted,
                        items_deleted,
                    })
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted {
                category_id,
                subcategories_deleted: outcome.subcategories_deleted,
                items_deleted: outcome.items_deleted,
            })
            .await;

        info!(
            "Deleted category {} ({} subcategories, {} items)",
            category_id, outcome.subcategories_deleted, outcome.items_deleted
        );
        Ok(outcome)
    }

    /// Fetches a category by id
    pub async fn get_category(&self, category_id: i64) -> Result<menu_category::Model, ServiceError> {
        menu_category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    // ---- subcategories ----

    #[instrument(skip(self))]
    pub async fn list_subcategories(
        &self,
        category_id: i64,
    ) -> Result<Vec<menu_subcategory::Model>, ServiceError> {
        menu_subcategory::Entity::find()
            .filter(menu_subcategory::Column::CategoryId.eq(category_id))
            .order_by_asc(menu_subcategory::Column::DisplayOrder)
            .order_by_asc(menu_subcategory::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn create_subcategory(
        &self,
        actor: &AuthUser,
        input: CreateSubcategoryInput,
    ) -> Result<menu_subcategory::Model, ServiceError> {
        let name = required_name(&input.name)?;

        let parent = self.get_category(input.category_id).await?;
        ensure_can_manage(actor, parent.business_id)?;

        let subcategory = menu_subcategory::ActiveModel {
            category_id: Set(input.category_id),
            name: Set(name),
            display_order: Set(input.display_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        };

        let subcategory = subcategory.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::SubcategoryCreated(subcategory.id))
            .await;

        info!(
            "Created subcategory {} under category {}",
            subcategory.id, input.category_id
        );
        Ok(subcategory)
    }

    #[instrument(skip(self, input))]
    pub async fn update_subcategory(
        &self,
        actor: &AuthUser,
        subcategory_id: i64,
        input: UpdateSubcategoryInput,
    ) -> Result<menu_subcategory::Model, ServiceError> {
        let (subcategory, business_id) = self.subcategory_with_business(subcategory_id).await?;
        ensure_can_manage(actor, business_id)?;

        let mut active: menu_subcategory::ActiveModel = subcategory.into();

        if let Some(name) = input.name {
            active.name = Set(required_name(&name)?);
        }
        if let Some(display_order) = input.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let subcategory = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::SubcategoryUpdated(subcategory.id))
            .await;

        Ok(subcategory)
    }

    /// Deletes a subcategory and its items in one transaction
    #[instrument(skip(self))]
    pub async fn delete_subcategory(
        &self,
        actor: &AuthUser,
        subcategory_id: i64,
    ) -> Result<CascadeOutcome, ServiceError> {
        let (_, business_id) = self.subcategory_with_business(subcategory_id).await?;
        ensure_can_manage(actor, business_id)?;

        let outcome = self
            .db
            .transaction::<_, CascadeOutcome, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let items_deleted = menu_item::Entity::delete_many()
                        .filter(menu_item::Column::SubcategoryId.eq(subcategory_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    menu_subcategory::Entity::delete_by_id(subcategory_id)
                        .exec(txn)
                        .await?;

                    Ok(CascadeOutcome {
                        subcategories_deleted: 1,
                        items_deleted,
                    })
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        self.event_sender
            .send_or_log(Event::SubcategoryDeleted {
                subcategory_id,
                items_deleted: outcome.items_deleted,
            })
            .await;

        info!(
            "Deleted subcategory {} ({} items)",
            subcategory_id, outcome.items_deleted
        );
        Ok(outcome)
    }

    // ---- items ----

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        subcategory_id: i64,
    ) -> Result<Vec<menu_item::Model>, ServiceError> {
        menu_item::Entity::find()
            .filter(menu_item::Column::SubcategoryId.eq(subcategory_id))
            .order_by_asc(menu_item::Column::DisplayOrder)
            .order_by_asc(menu_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Creates an item under a subcategory.
    /// Name and price are validated before any database round trip.
    #[instrument(skip(self, input))]
    pub async fn create_item(
        &self,
        actor: &AuthUser,
        input: CreateItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        let name = required_name(&input.name)?;
        let price = parse_price(&input.price)?;

        let (_, business_id) = self.subcategory_with_business(input.subcategory_id).await?;
        ensure_can_manage(actor, business_id)?;

        let item = menu_item::ActiveModel {
            subcategory_id: Set(input.subcategory_id),
            name: Set(name),
            description: Set(input.description),
            price: Set(price),
            image_url: Set(input.image_url),
            display_order: Set(input.display_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            ..Default::default()
        };

        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ItemCreated(item.id))
            .await;

        info!(
            "Created item {} under subcategory {}",
            item.id, input.subcategory_id
        );
        Ok(item)
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        actor: &AuthUser,
        item_id: i64,
        input: UpdateItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        // Validate up front so a bad price never reaches the database
        let price = input.price.as_deref().map(parse_price).transpose()?;

        let (item, business_id) = self.item_with_business(item_id).await?;
        ensure_can_manage(actor, business_id)?;

        let mut active: menu_item::ActiveModel = item.into();

        if let Some(name) = input.name {
            active.name = Set(required_name(&name)?);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(display_order) = input.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let item = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ItemUpdated(item.id))
            .await;

        Ok(item)
    }

    /// Deletes a single item; leaf level, nothing cascades
    #[instrument(skip(self))]
    pub async fn delete_item(&self, actor: &AuthUser, item_id: i64) -> Result<(), ServiceError> {
        let (item, business_id) = self.item_with_business(item_id).await?;
        ensure_can_manage(actor, business_id)?;

        let active: menu_item::ActiveModel = item.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ItemDeleted(item_id))
            .await;

        info!("Deleted item {}", item_id);
        Ok(())
    }

    // ---- ownership resolution ----

    async fn subcategory_with_business(
        &self,
        subcategory_id: i64,
    ) -> Result<(menu_subcategory::Model, i64), ServiceError> {
        let subcategory = menu_subcategory::Entity::find_by_id(subcategory_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id))
            })?;

        let category = self.get_category(subcategory.category_id).await?;
        Ok((subcategory, category.business_id))
    }

    async fn item_with_business(
        &self,
        item_id: i64,
    ) -> Result<(menu_item::Model, i64), ServiceError> {
        let item = menu_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;

        let (_, business_id) = self.subcategory_with_business(item.subcategory_id).await?;
        Ok((item, business_id))
    }
}

fn flatten_transaction_error(err: TransactionError<sea_orm::DbErr>) -> ServiceError {
    match err {
        TransactionError::Connection(e) => ServiceError::DatabaseError(e),
        TransactionError::Transaction(e) => ServiceError::DatabaseError(e),
    }
}

/// Rejects mutations from accounts that do not control the business
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

/// Trims and requires a non-empty name
fn required_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError("Name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Parses a user-entered price into a non-negative decimal.
/// Invalid text must fail here, before any gateway call is made.
pub fn parse_price(raw: &str) -> Result<Decimal, ServiceError> {
    let trimmed = raw.trim();
    let price = Decimal::from_str(trimmed).map_err(|_| {
        ServiceError::ValidationError(format!("Price must be a number, got \"{}\"", trimmed))
    })?;

    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }

    Ok(price)
}

/// Input for creating a category
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryInput {
    pub business_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Input for creating a subcategory
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateSubcategoryInput {
    pub category_id: i64,
    pub name: String,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Input for updating a subcategory
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateSubcategoryInput {
    pub name: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Input for creating an item. The price arrives as user-entered text.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateItemInput {
    pub subcategory_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Input for updating an item
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}
