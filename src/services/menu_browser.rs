use crate::{
    auth::AuthUser,
    entities::{menu_category, menu_item, menu_subcategory},
    errors::ServiceError,
    services::menu::{CascadeOutcome, MenuService},
};
use serde::Serialize;

/// Drill-down position inside a business's menu.
///
/// A tagged enum instead of nullable pointers: a subcategory can never be
/// selected without its parent category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuSelection {
    None,
    Category {
        category_id: i64,
    },
    Subcategory {
        category_id: i64,
        subcategory_id: i64,
    },
}

impl MenuSelection {
    /// The selected category, at either drill-down level
    pub fn category_id(&self) -> Option<i64> {
        match self {
            MenuSelection::None => None,
            MenuSelection::Category { category_id }
            | MenuSelection::Subcategory { category_id, .. } => Some(*category_id),
        }
    }

    pub fn subcategory_id(&self) -> Option<i64> {
        match self {
            MenuSelection::Subcategory { subcategory_id, .. } => Some(*subcategory_id),
            _ => None,
        }
    }
}

/// Stateful two-level drill-down over one business's menu.
///
/// Owns the current selection plus the collections fetched for it, and keeps
/// both consistent across deletes: removing the selected node pops the
/// selection one level and clears the descendant caches, so stale children
/// are never shown.
pub struct MenuBrowser {
    service: MenuService,
    business_id: i64,
    selection: MenuSelection,
    categories: Vec<menu_category::Model>,
    subcategories: Vec<menu_subcategory::Model>,
    items: Vec<menu_item::Model>,
}

impl MenuBrowser {
    pub fn new(service: MenuService, business_id: i64) -> Self {
        Self {
            service,
            business_id,
            selection: MenuSelection::None,
            categories: Vec::new(),
            subcategories: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn selection(&self) -> MenuSelection {
        self.selection
    }

    pub fn categories(&self) -> &[menu_category::Model] {
        &self.categories
    }

    pub fn subcategories(&self) -> &[menu_subcategory::Model] {
        &self.subcategories
    }

    pub fn items(&self) -> &[menu_item::Model] {
        &self.items
    }

    /// Fetches the category list for the business
    pub async fn load(&mut self) -> Result<(), ServiceError> {
        self.categories = self.service.list_categories(self.business_id).await?;
        Ok(())
    }

    /// Drills into a category: fetches its subcategories and clears any
    /// previously shown items
    pub async fn select_category(&mut self, category_id: i64) -> Result<(), ServiceError> {
        let category = self.service.get_category(category_id).await?;
        if category.business_id != self.business_id {
            return Err(ServiceError::InvalidOperation(format!(
                "Category {} does not belong to business {}",
                category_id, self.business_id
            )));
        }

        self.subcategories = self.service.list_subcategories(category_id).await?;
        self.items.clear();
        self.selection = MenuSelection::Category { category_id };
        Ok(())
    }

    /// Drills into a subcategory of the currently selected category and
    /// fetches its items
    pub async fn select_subcategory(&mut self, subcategory_id: i64) -> Result<(), ServiceError> {
        let category_id = self.selection.category_id().ok_or_else(|| {
            ServiceError::InvalidOperation(
                "Select a category before selecting a subcategory".to_string(),
            )
        })?;

        let belongs = self
            .subcategories
            .iter()
            .any(|s| s.id == subcategory_id && s.category_id == category_id);
        if !belongs {
            return Err(ServiceError::InvalidOperation(format!(
                "Subcategory {} is not part of category {}",
                subcategory_id, category_id
            )));
        }

        self.items = self.service.list_items(subcategory_id).await?;
        self.selection = MenuSelection::Subcategory {
            category_id,
            subcategory_id,
        };
        Ok(())
    }

    /// Clears the selection and all descendant caches
    pub fn clear_selection(&mut self) {
        self.selection = MenuSelection::None;
        self.subcategories.clear();
        self.items.clear();
    }

    /// Re-fetches the collections backing the current selection
    pub async fn refresh(&mut self) -> Result<(), ServiceError> {
        self.categories = self.service.list_categories(self.business_id).await?;

        if let Some(category_id) = self.selection.category_id() {
            self.subcategories = self.service.list_subcategories(category_id).await?;
        }
        if let Some(subcategory_id) = self.selection.subcategory_id() {
            self.items = self.service.list_items(subcategory_id).await?;
        }
        Ok(())
    }

    /// Deletes a category through the service cascade, then repairs local
    /// state: if the deleted category was selected the browser falls back to
    /// no selection with empty child lists
    pub async fn delete_category(
        &mut self,
        actor: &AuthUser,
        category_id: i64,
    ) -> Result<CascadeOutcome, ServiceError> {
        let outcome = self.service.delete_category(actor, category_id).await?;

        if self.selection.category_id() == Some(category_id) {
            self.clear_selection();
        }
        self.categories = self.service.list_categories(self.business_id).await?;
        Ok(outcome)
    }

    /// Deletes a subcategory; if it was selected, the browser pops back to
    /// its parent category and clears the item list
    pub async fn delete_subcategory(
        &mut self,
        actor: &AuthUser,
        subcategory_id: i64,
    ) -> Result<CascadeOutcome, ServiceError> {
        let outcome = self
            .service
            .delete_subcategory(actor, subcategory_id)
            .await?;

        if let MenuSelection::Subcategory {
            category_id,
            subcategory_id: selected,
        } = self.selection
        {
            if selected == subcategory_id {
                self.items.clear();
                self.selection = MenuSelection::Category { category_id };
            }
        }
        if let Some(category_id) = self.selection.category_id() {
            self.subcategories = self.service.list_subcategories(category_id).await?;
        }
        Ok(outcome)
    }

    /// Deletes an item and re-fetches the visible item list
    pub async fn delete_item(
        &mut self,
        actor: &AuthUser,
        item_id: i64,
    ) -> Result<(), ServiceError> {
        self.service.delete_item(actor, item_id).await?;

        if let Some(subcategory_id) = self.selection.subcategory_id() {
            self.items = self.service.list_items(subcategory_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::entities::business;
    use crate::events::EventSender;
    use crate::migrator::Migrator;
    use crate::services::menu::{
        CreateCategoryInput, CreateItemInput, CreateSubcategoryInput, MenuService,
    };
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
    use sea_orm_migration::MigratorTrait;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn seeded_browser() -> (MenuBrowser, MenuService, AuthUser, i64) {
        // One pooled connection keeps the in-memory database shared
        let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.expect("in-memory sqlite");
        Migrator::up(&db, None).await.expect("migrations");
        let db = Arc::new(db);

        let (event_tx, _event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let service = MenuService::new(db.clone(), event_sender);

        let shop = business::ActiveModel {
            username: Set("pizza-place".to_string()),
            name: Set("Pizza Place".to_string()),
            ..Default::default()
        }
        .insert(&*db)
        .await
        .expect("seed business");

        let actor = AuthUser {
            user_id: 1,
            email: None,
            role: Role::Owner,
            business_id: Some(shop.id),
            token_id: "test".to_string(),
        };

        let browser = MenuBrowser::new(service.clone(), shop.id);
        (browser, service, actor, shop.id)
    }

    #[tokio::test]
    async fn selecting_category_loads_children_and_clears_items() {
        let (mut browser, service, actor, business_id) = seeded_browser().await;

        let pizzas = service
            .create_category(
                &actor,
                CreateCategoryInput {
                    business_id,
                    name: "Pizzas".to_string(),
                    image_url: None,
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        let classic = service
            .create_subcategory(
                &actor,
                CreateSubcategoryInput {
                    category_id: pizzas.id,
                    name: "Classic".to_string(),
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();

        browser.load().await.unwrap();
        assert_eq!(browser.categories().len(), 1);
        assert_eq!(browser.selection(), MenuSelection::None);

        browser.select_category(pizzas.id).await.unwrap();
        assert_eq!(
            browser.selection(),
            MenuSelection::Category {
                category_id: pizzas.id
            }
        );
        assert_eq!(browser.subcategories().len(), 1);
        assert!(browser.items().is_empty());

        browser.select_subcategory(classic.id).await.unwrap();
        assert_eq!(
            browser.selection(),
            MenuSelection::Subcategory {
                category_id: pizzas.id,
                subcategory_id: classic.id
            }
        );
    }

    #[tokio::test]
    async fn subcategory_selection_requires_a_category() {
        let (mut browser, _service, _actor, _business_id) = seeded_browser().await;

        let err = browser.select_subcategory(1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn deleting_selected_category_resets_selection_and_caches() {
        let (mut browser, service, actor, business_id) = seeded_browser().await;

        let pizzas = service
            .create_category(
                &actor,
                CreateCategoryInput {
                    business_id,
                    name: "Pizzas".to_string(),
                    image_url: None,
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        let classic = service
            .create_subcategory(
                &actor,
                CreateSubcategoryInput {
                    category_id: pizzas.id,
                    name: "Classic".to_string(),
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        service
            .create_item(
                &actor,
                CreateItemInput {
                    subcategory_id: classic.id,
                    name: "Margherita".to_string(),
                    description: None,
                    price: "9.5".to_string(),
                    image_url: None,
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();

        browser.load().await.unwrap();
        browser.select_category(pizzas.id).await.unwrap();
        browser.select_subcategory(classic.id).await.unwrap();
        assert_eq!(browser.items().len(), 1);

        let outcome = browser.delete_category(&actor, pizzas.id).await.unwrap();
        assert_eq!(outcome.subcategories_deleted, 1);
        assert_eq!(outcome.items_deleted, 1);

        // No stale children after the cascade
        assert_eq!(browser.selection(), MenuSelection::None);
        assert!(browser.categories().is_empty());
        assert!(browser.subcategories().is_empty());
        assert!(browser.items().is_empty());
    }

    #[tokio::test]
    async fn deleting_selected_subcategory_pops_to_category() {
        let (mut browser, service, actor, business_id) = seeded_browser().await;

        let drinks = service
            .create_category(
                &actor,
                CreateCategoryInput {
                    business_id,
                    name: "Drinks".to_string(),
                    image_url: None,
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        let sodas = service
            .create_subcategory(
                &actor,
                CreateSubcategoryInput {
                    category_id: drinks.id,
                    name: "Sodas".to_string(),
                    display_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();

        browser.load().await.unwrap();
        browser.select_category(drinks.id).await.unwrap();
        browser.select_subcategory(sodas.id).await.unwrap();

        browser.delete_subcategory(&actor, sodas.id).await.unwrap();

        assert_eq!(
            browser.selection(),
            MenuSelection::Category {
                category_id: drinks.id
            }
        );
        assert!(browser.items().is_empty());
        assert!(browser.subcategories().is_empty());
    }
}
