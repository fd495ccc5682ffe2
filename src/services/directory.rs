use crate::{
    auth::AuthUser,
    entities::{business, business_photo, menu_category, menu_item, menu_subcategory, user, wifi_network},
    errors::ServiceError,
    events::{Event, EventSender},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{2,39}$").expect("valid username regex"));

/// Service managing the business directory: profiles, the public search
/// filter, the photo gallery, and admin moderation.
#[derive(Clone)]
pub struct DirectoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    max_photos: usize,
    /// Moderation actions are audit-logged here
    logger: Logger,
}

/// Filter applied to the fetched business list.
/// The text matches name, description, category, and location
/// case-insensitively; the category is an exact match ANDed with the text.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SearchFilter {
    pub text: Option<String>,
    pub category: Option<String>,
}

/// Counts reported when a business is removed with everything under it
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct BusinessCascadeOutcome {
    pub categories_deleted: u64,
    pub subcategories_deleted: u64,
    pub items_deleted: u64,
    pub photos_deleted: u64,
    pub wifi_networks_deleted: u64,
}

impl DirectoryService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        max_photos: usize,
        logger: Logger,
    ) -> Self {
        Self {
            db,
            event_sender,
            max_photos,
            logger,
        }
    }

    /// Fetches the entire directory. The dataset is one town's businesses,
    /// so the whole table is pulled and filtered in memory.
    #[instrument(skip(self))]
    pub async fn list_businesses(&self) -> Result<Vec<business::Model>, ServiceError> {
        business::Entity::find()
            .order_by_asc(business::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Fetches the directory and applies the search filter
    #[instrument(skip(self))]
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<business::Model>, ServiceError> {
        let all = self.list_businesses().await?;
        Ok(filter_businesses(&all, &filter))
    }

    pub async fn get_business(&self, business_id: i64) -> Result<business::Model, ServiceError> {
        business::Entity::find_by_id(business_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Business {} not found", business_id)))
    }

    /// Looks up a profile by its public handle
    pub async fn get_business_by_username(
        &self,
        username: &str,
    ) -> Result<business::Model, ServiceError> {
        let handle = username.trim().to_lowercase();
        business::Entity::find()
            .filter(business::Column::Username.eq(handle.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Business '{}' not found", handle)))
    }

    /// Creates a business profile and links it to the creating account.
    ///
    /// Each account owns at most one business; the username is
    /// lowercase-normalized and must be free.
    #[instrument(skip(self, input))]
    pub async fn create_business(
        &self,
        actor: &AuthUser,
        input: CreateBusinessInput,
    ) -> Result<business::Model, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Business name is required".to_string(),
            ));
        }
        let username = normalize_username(&input.username)?;

        // The claims may be stale; the account row is authoritative for the
        // one-business-per-account rule
        let account = user::Entity::find_by_id(actor.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Unknown account".to_string()))?;
        if !actor.is_admin() && account.business_id.is_some() {
            return Err(ServiceError::Conflict(
                "This account already has a business".to_string(),
            ));
        }

        let link_owner = !actor.is_admin();
        let actor_id = actor.user_id;
        let username_for_insert = username.clone();
        let result = self
            .db
            .transaction::<_, business::Model, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let created = business::ActiveModel {
                        username: Set(username_for_insert),
                        name: Set(name),
                        description: Set(input.description),
                        category: Set(input.category),
                        location: Set(input.location),
                        phone: Set(input.phone),
                        email: Set(input.email),
                        website: Set(input.website),
                        whatsapp: Set(input.whatsapp),
                        instagram: Set(input.instagram),
                        facebook: Set(input.facebook),
                        logo_url: Set(input.logo_url),
                        cover_url: Set(input.cover_url),
                        primary_color: Set(input.primary_color),
                        secondary_color: Set(input.secondary_color),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    if link_owner {
                        let mut owner: user::ActiveModel = user::Entity::find_by_id(actor_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                sea_orm::DbErr::Custom("Owning account disappeared".to_string())
                            })?
                            .into();
                        owner.business_id = Set(Some(created.id));
                        owner.update(txn).await?;
                    }

                    Ok(created)
                })
            })
            .await;

        let created = match result {
            Ok(created) => created,
            Err(TransactionError::Transaction(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                return Err(ServiceError::Conflict(format!(
                    "Username '{}' is already taken",
                    username
                )));
            }
            Err(TransactionError::Transaction(e)) | Err(TransactionError::Connection(e)) => {
                return Err(ServiceError::DatabaseError(e));
            }
        };

        self.event_sender
            .send_or_log(Event::BusinessCreated(created.id))
            .await;

        info!("Created business {} ('{}')", created.id, created.username);
        Ok(created)
    }

    /// Partially updates a profile
    #[instrument(skip(self, input))]
    pub async fn update_business(
        &self,
        actor: &AuthUser,
        business_id: i64,
        input: UpdateBusinessInput,
    ) -> Result<business::Model, ServiceError> {
        let existing = self.get_business(business_id).await?;
        ensure_can_manage(actor, existing.id)?;

        let mut active: business::ActiveModel = existing.into();

        if let Some(username) = input.username {
            active.username = Set(normalize_username(&username)?);
        }
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Business name is required".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(website) = input.website {
            active.website = Set(Some(website));
        }
        if let Some(whatsapp) = input.whatsapp {
            active.whatsapp = Set(Some(whatsapp));
        }
        if let Some(instagram) = input.instagram {
            active.instagram = Set(Some(instagram));
        }
        if let Some(facebook) = input.facebook {
            active.facebook = Set(Some(facebook));
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(cover_url) = input.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        if let Some(primary_color) = input.primary_color {
            active.primary_color = Set(Some(primary_color));
        }
        if let Some(secondary_color) = input.secondary_color {
            active.secondary_color = Set(Some(secondary_color));
        }

        let updated = active.update(&*self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict("Username is already taken".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::BusinessUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Admin moderation: show or hide a business in the directory
    #[instrument(skip(self))]
    pub async fn set_business_active(
        &self,
        actor: &AuthUser,
        business_id: i64,
        is_active: bool,
    ) -> Result<business::Model, ServiceError> {
        ensure_admin(actor)?;

        let existing = self.get_business(business_id).await?;
        let mut active: business::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        let updated = active.update(&*self.db).await?;

        slog::info!(self.logger, "moderation: business activation changed";
            "business_id" => business_id,
            "is_active" => is_active,
            "moderator" => actor.user_id,
        );

        self.event_sender
            .send_or_log(Event::BusinessActivationChanged {
                business_id,
                is_active,
            })
            .await;

        Ok(updated)
    }

    /// Admin moderation: removes a business with everything under it — menu
    /// hierarchy, photos, wifi networks — and unlinks owning accounts.
    /// Runs as one transaction.
    #[instrument(skip(self))]
    pub async fn delete_business(
        &self,
        actor: &AuthUser,
        business_id: i64,
    ) -> Result<BusinessCascadeOutcome, ServiceError> {
        ensure_admin(actor)?;
        self.get_business(business_id).await?;

        let outcome = self
            .db
            .transaction::<_, BusinessCascadeOutcome, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let category_ids: Vec<i64> = menu_category::Entity::find()
                        .filter(menu_category::Column::BusinessId.eq(business_id))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|c| c.id)
                        .collect();

                    let subcategory_ids: Vec<i64> = if category_ids.is_empty() {
                        Vec::new()
                    } else {
                        menu_subcategory::Entity::find()
                            .filter(
                                menu_subcategory::Column::CategoryId.is_in(category_ids.clone()),
                            )
                            .all(txn)
                            .await?
                            .into_iter()
                            .map(|s| s.id)
                            .collect()
                    };

                    let items_deleted = if subcategory_ids.is_empty() {
                        0
                    } else {
                        menu_item::Entity::delete_many()
                            .filter(menu_item::Column::SubcategoryId.is_in(subcategory_ids.clone()))
                            .exec(txn)
                            .await?
                            .rows_affected
                    };

                    let subcategories_deleted = if category_ids.is_empty() {
                        0
                    } else {
                        menu_subcategory::Entity::delete_many()
                            .filter(
                                menu_subcategory::Column::CategoryId.is_in(category_ids.clone()),
                            )
                            .exec(txn)
                            .await?
                            .rows_affected
                    };

                    let categories_deleted = menu_category::Entity::delete_many()
                        .filter(menu_category::Column::BusinessId.eq(business_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    let photos_deleted = business_photo::Entity::delete_many()
                        .filter(business_photo::Column::BusinessId.eq(business_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    let wifi_networks_deleted = wifi_network::Entity::delete_many()
                        .filter(wifi_network::Column::BusinessId.eq(business_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    let owners = user::Entity::find()
                        .filter(user::Column::BusinessId.eq(business_id))
                        .all(txn)
                        .await?;
                    for owner in owners {
                        let mut active: user::ActiveModel = owner.into();
                        active.business_id = Set(None);
                        active.update(txn).await?;
                    }

                    business::Entity::delete_by_id(business_id).exec(txn).await?;

                    Ok(BusinessCascadeOutcome {
                        categories_deleted,
                        subcategories_deleted,
                        items_deleted,
                        photos_deleted,
                        wifi_networks_deleted,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(e) | TransactionError::Transaction(e) => {
                    ServiceError::DatabaseError(e)
                }
            })?;

        slog::info!(self.logger, "moderation: business deleted";
            "business_id" => business_id,
            "moderator" => actor.user_id,
            "items_deleted" => outcome.items_deleted,
        );

        self.event_sender
            .send_or_log(Event::BusinessDeleted {
                business_id,
                categories_deleted: outcome.categories_deleted,
                photos_deleted: outcome.photos_deleted,
                wifi_networks_deleted: outcome.wifi_networks_deleted,
            })
            .await;

        info!("Deleted business {} with cascade", business_id);
        Ok(outcome)
    }

    // ---- photo gallery ----

    #[instrument(skip(self))]
    pub async fn list_photos(
        &self,
        business_id: i64,
    ) -> Result<Vec<business_photo::Model>, ServiceError> {
        business_photo::Entity::find()
            .filter(business_photo::Column::BusinessId.eq(business_id))
            .order_by_asc(business_photo::Column::Position)
            .order_by_asc(business_photo::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Attaches an uploaded photo URL, enforcing the gallery cap
    #[instrument(skip(self))]
    pub async fn add_photo(
        &self,
        actor: &AuthUser,
        business_id: i64,
        url: String,
    ) -> Result<business_photo::Model, ServiceError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(ServiceError::ValidationError(
                "Photo URL is required".to_string(),
            ));
        }

        let owner = self.get_business(business_id).await?;
        ensure_can_manage(actor, owner.id)?;

        let count = business_photo::Entity::find()
            .filter(business_photo::Column::BusinessId.eq(business_id))
            .count(&*self.db)
            .await? as usize;
        if count >= self.max_photos {
            return Err(ServiceError::ValidationError(format!(
                "Photo limit reached ({} per business)",
                self.max_photos
            )));
        }

        let photo = business_photo::ActiveModel {
            business_id: Set(business_id),
            url: Set(url),
            position: Set(count as i32),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::PhotoAdded {
                business_id,
                photo_id: photo.id,
            })
            .await;

        Ok(photo)
    }

    #[instrument(skip(self))]
    pub async fn remove_photo(
        &self,
        actor: &AuthUser,
        business_id: i64,
        photo_id: i64,
    ) -> Result<(), ServiceError> {
        let owner = self.get_business(business_id).await?;
        ensure_can_manage(actor, owner.id)?;

        let photo = business_photo::Entity::find_by_id(photo_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.business_id == business_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Photo {} not found", photo_id)))?;

        let active: business_photo::ActiveModel = photo.into();
        active.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PhotoRemoved {
                business_id,
                photo_id,
            })
            .await;

        Ok(())
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

fn ensure_admin(actor: &AuthUser) -> Result<(), ServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Requires admin role".to_string(),
        ))
    }
}

/// Lowercases and validates a public handle
fn normalize_username(raw: &str) -> Result<String, ServiceError> {
    let username = raw.trim().to_lowercase();
    if !USERNAME_RE.is_match(&username) {
        return Err(ServiceError::ValidationError(
            "Username must be 3-40 characters: lowercase letters, digits, '-' or '_', starting with a letter or digit"
                .to_string(),
        ));
    }
    Ok(username)
}

/// Applies the directory search filter to an already-fetched list.
///
/// Pure and deterministic: filtering the same list with the same filter
/// always yields the same result.
pub fn filter_businesses(list: &[business::Model], filter: &SearchFilter) -> Vec<business::Model> {
    let needle = filter
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let category = filter
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase);

    list.iter()
        .filter(|b| {
            let text_matches = match &needle {
                None => true,
                Some(needle) => {
                    let mut haystacks = vec![b.name.to_lowercase()];
                    if let Some(description) = &b.description {
                        haystacks.push(description.to_lowercase());
                    }
                    if let Some(cat) = &b.category {
                        haystacks.push(cat.to_lowercase());
                    }
                    if let Some(location) = &b.location {
                        haystacks.push(location.to_lowercase());
                    }
                    haystacks.iter().any(|h| h.contains(needle))
                }
            };

            let category_matches = match &category {
                None => true,
                Some(wanted) => b
                    .category
                    .as_deref()
                    .map(|c| c.to_lowercase() == *wanted)
                    .unwrap_or(false),
            };

            text_matches && category_matches
        })
        .cloned()
        .collect()
}

/// Input for creating a business profile
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateBusinessInput {
    pub username: String,
    pub name: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Contact email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

/// Input for updating a business profile
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateBusinessInput {
    pub username: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn sample(name: &str, category: Option<&str>, location: Option<&str>) -> business::Model {
        business::Model {
            id: 0,
            username: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            description: None,
            category: category.map(str::to_string),
            location: location.map(str::to_string),
            phone: None,
            email: None,
            website: None,
            whatsapp: None,
            instagram: None,
            facebook: None,
            logo_url: None,
            cover_url: None,
            primary_color: None,
            secondary_color: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn empty_filter_returns_everything() {
        let list = vec![
            sample("Pizza Place", Some("restaurant"), Some("Main St")),
            sample("Cut & Go", Some("barbershop"), None),
        ];
        let result = filter_businesses(&list, &SearchFilter::default());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn text_filter_is_case_insensitive_across_fields() {
        let list = vec![
            sample("Pizza Place", Some("restaurant"), Some("Main St")),
            sample("Cut & Go", Some("barbershop"), Some("pizza alley")),
            sample("Book Nook", Some("bookstore"), None),
        ];

        let result = filter_businesses(
            &list,
            &SearchFilter {
                text: Some("PIZZA".to_string()),
                category: None,
            },
        );
        // Matches the name of one and the location of another
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn category_filter_is_exact_and_ands_with_text() {
        let list = vec![
            sample("Pizza Place", Some("restaurant"), None),
            sample("Pasta Corner", Some("restaurant"), None),
            sample("Pizza Supplies", Some("wholesale"), None),
        ];

        let result = filter_businesses(
            &list,
            &SearchFilter {
                text: Some("pizza".to_string()),
                category: Some("restaurant".to_string()),
            },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Pizza Place");
    }

    #[test]
    fn username_normalization() {
        assert_eq!(normalize_username("  Pizza-Place ").unwrap(), "pizza-place");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username("-leading-dash").is_err());
    }

    proptest! {
        /// Same list + same filter twice yields identical results
        #[test]
        fn filter_is_idempotent(
            names in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..8),
            text in proptest::option::of("[a-zA-Z]{0,6}"),
            category in proptest::option::of("[a-z]{0,6}"),
        ) {
            let list: Vec<business::Model> = names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let category = if i % 2 == 0 { Some("restaurant") } else { None };
                    sample(n, category, None)
                })
                .collect();
            let filter = SearchFilter { text, category };

            let first = filter_businesses(&list, &filter);
            let second = filter_businesses(&list, &filter);
            prop_assert_eq!(&first, &second);

            // Filtering is also a projection: applying it to its own output
            // changes nothing
            let third = filter_businesses(&first, &filter);
            prop_assert_eq!(&first, &third);
        }
    }
}
