use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::UserRepository;
use crate::schema::models::{ProfileChanges, RoleName, User, UserProfile};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Non-deleted user or NotFound.
    async fn live_user(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn profile_of(&self, user: User) -> Result<UserProfile, AppError> {
        let roles = self.repo.roles_for(user.id).await?;
        Ok(UserProfile::new(user, roles))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        let user = self.live_user(user_id).await?;
        debug!(%user_id, "profile fetched");
        self.profile_of(user).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<UserProfile, AppError> {
        let user = self.live_user(user_id).await?;
        if let Some(username) = changes.username.as_deref() {
            if username != user.username && self.repo.username_taken(username, user_id).await? {
                return Err(AppError::bad_request("Username already taken"));
            }
        }

        let updated = self.repo.update_profile(user_id, changes).await?;
        info!(%user_id, "profile updated");
        self.profile_of(updated).await
    }

    pub async fn delete_profile(&self, user_id: Uuid) -> Result<(), AppError> {
        self.live_user(user_id).await?;
        self.repo.soft_delete(user_id).await?;
        info!(%user_id, "account deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, AppError> {
        let users = self.repo.list_active().await?;
        Ok(users
            .into_iter()
            .map(|(user, roles)| UserProfile::new(user, roles))
            .collect())
    }

    pub async fn update_roles(
        &self,
        user_id: Uuid,
        roles: Vec<RoleName>,
    ) -> Result<UserProfile, AppError> {
        let user = self.live_user(user_id).await?;
        let mut roles = roles;
        roles.sort_by_key(|r| r.as_str());
        roles.dedup();

        self.repo.set_roles(user_id, &roles).await?;
        info!(%user_id, ?roles, "roles replaced");
        Ok(UserProfile::new(user, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn service() -> (Arc<MemoryStore>, UserService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), UserService::new(store))
    }

    #[tokio::test]
    async fn profile_hides_deleted_users() {
        let (store, service) = service();
        let user = store.add_user("a@shop.test", "hash", &[RoleName::User]);

        let profile = service.profile(user.id).await.unwrap();
        assert_eq!(profile.roles, vec![RoleName::User]);

        service.delete_profile(user.id).await.unwrap();
        assert!(matches!(
            service.profile(user.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_must_be_unique() {
        let (store, service) = service();
        let a = store.add_user("alice@shop.test", "hash", &[RoleName::User]);
        store.add_user("bob@shop.test", "hash", &[RoleName::User]);

        let err = service
            .update_profile(
                a.id,
                ProfileChanges {
                    username: Some("bob".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Username already taken"));

        // keeping one's own name is not a clash
        let profile = service
            .update_profile(
                a.id,
                ProfileChanges {
                    username: Some("alice".into()),
                    first_name: Some("Alice".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn roles_are_replaced_not_merged() {
        let (store, service) = service();
        let user = store.add_user("c@shop.test", "hash", &[RoleName::User]);

        let profile = service
            .update_roles(user.id, vec![RoleName::Admin, RoleName::Admin])
            .await
            .unwrap();
        assert_eq!(profile.roles, vec![RoleName::Admin]);
        assert!(matches!(
            service.update_roles(Uuid::new_v4(), vec![RoleName::User]).await,
            Err(AppError::NotFound(_))
        ));
    }
}
