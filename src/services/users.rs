use crate::{
    auth::{AuthUser, Role},
    entities::user,
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};

/// Admin-side user moderation backing the dashboard
#[derive(Clone)]
pub struct UsersService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl UsersService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, actor: &AuthUser) -> Result<Vec<user::Model>, ServiceError> {
        ensure_admin(actor)?;
        user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Changes an account's role. Admins cannot demote themselves, so the
    /// platform always keeps at least the acting administrator.
    #[instrument(skip(self))]
    pub async fn set_user_role(
        &self,
        actor: &AuthUser,
        user_id: i64,
        role: Role,
    ) -> Result<user::Model, ServiceError> {
        ensure_admin(actor)?;
        if actor.user_id == user_id && role != Role::Admin {
            return Err(ServiceError::InvalidOperation(
                "Admins cannot demote their own account".to_string(),
            ));
        }

        let account = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = account.into();
        active.role = Set(role);
        let account = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRoleChanged {
                user_id,
                role: role.to_string(),
            })
            .await;

        info!("Changed role of user {} to {}", user_id, role);
        Ok(account)
    }

    /// Enables or disables an account. Self-deactivation is rejected.
    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        actor: &AuthUser,
        user_id: i64,
        is_active: bool,
    ) -> Result<user::Model, ServiceError> {
        ensure_admin(actor)?;
        if actor.user_id == user_id && !is_active {
            return Err(ServiceError::InvalidOperation(
                "Admins cannot deactivate their own account".to_string(),
            ));
        }

        let account = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = account.into();
        active.is_active = Set(is_active);
        let account = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserActivationChanged { user_id, is_active })
            .await;

        Ok(account)
    }

    async fn get_user(&self, user_id: i64) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }
}

fn ensure_admin(actor: &AuthUser) -> Result<(), ServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Requires admin role".to_string()))
    }
}
