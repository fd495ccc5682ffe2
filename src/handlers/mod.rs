pub mod businesses;
pub mod common;
pub mod menu;
pub mod users;
pub mod wifi;

use crate::db::DbPool;
use crate::events::EventSender;
use slog::Logger;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub menu: Arc<crate::services::menu::MenuService>,
    pub directory: Arc<crate::services::directory::DirectoryService>,
    pub wifi: Arc<crate::services::wifi::WifiService>,
    pub users: Arc<crate::services::users::UsersService>,
}

impl AppServices {
    /// Builds the service container shared by every handler
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        max_photos_per_business: usize,
        base_logger: Logger,
    ) -> Self {
        let directory_logger = base_logger.new(slog::o!("component" => "directory_service"));

        let menu = Arc::new(crate::services::menu::MenuService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let directory = Arc::new(crate::services::directory::DirectoryService::new(
            db_pool.clone(),
            event_sender.clone(),
            max_photos_per_business,
            directory_logger,
        ));
        let wifi = Arc::new(crate::services::wifi::WifiService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let users = Arc::new(crate::services::users::UsersService::new(
            db_pool,
            event_sender,
        ));

        Self {
            menu,
            directory,
            wifi,
            users,
        }
    }
}
