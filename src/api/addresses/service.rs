use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::AddressRepository;
use crate::schema::models::{Address, AddressChanges, NewAddress};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

pub struct AddressService {
    repo: Arc<dyn AddressRepository>,
}

impl AddressService {
    pub fn new(repo: Arc<dyn AddressRepository>) -> Self {
        Self { repo }
    }

    /// Missing or deleted is NotFound; someone else's is Forbidden.
    async fn owned(&self, user_id: Uuid, id: Uuid) -> Result<Address, AppError> {
        let address = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|a| !a.is_deleted())
            .ok_or_else(|| AppError::not_found("Address not found"))?;
        if address.user_id != user_id {
            return Err(AppError::forbidden("You do not have access to this address"));
        }
        Ok(address)
    }

    pub async fn create(&self, user_id: Uuid, address: NewAddress) -> Result<Address, AppError> {
        let created = self.repo.create(user_id, address).await?;
        info!(%user_id, address_id = %created.id, "address created");
        Ok(created)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Address>, AppError> {
        let addresses = self.repo.list_for_user(user_id).await?;
        debug!(%user_id, count = addresses.len(), "addresses listed");
        Ok(addresses)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Address, AppError> {
        self.owned(user_id, id).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: AddressChanges,
    ) -> Result<Address, AppError> {
        self.owned(user_id, id).await?;
        let updated = self.repo.update(id, user_id, changes).await?;
        info!(%user_id, address_id = %id, "address updated");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.owned(user_id, id).await?;
        self.repo.soft_delete(id).await?;
        info!(%user_id, address_id = %id, "address deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::schema::models::{AddressType, RoleName};

    fn home(is_default: bool) -> NewAddress {
        NewAddress {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: None,
            street: "1 Main St".into(),
            address_line2: None,
            city: "Pune".into(),
            state: "MH".into(),
            country: "IN".into(),
            zip_code: "411001".into(),
            latitude: Some(18.52),
            longitude: Some(73.85),
            address_type: AddressType::Home,
            is_default,
            delivery_instructions: None,
            label: Some("home".into()),
        }
    }

    #[tokio::test]
    async fn at_most_one_default_per_user() {
        let store = Arc::new(MemoryStore::new());
        let service = AddressService::new(store.clone());
        let user = store.add_user("a@shop.test", "hash", &[RoleName::User]);

        let first = service.create(user.id, home(true)).await.unwrap();
        let second = service.create(user.id, home(true)).await.unwrap();
        let defaults = |list: &[Address]| list.iter().filter(|a| a.is_default).count();

        let list = service.list(user.id).await.unwrap();
        assert_eq!(defaults(list.as_slice()), 1);
        assert!(list.iter().any(|a| a.id == second.id && a.is_default));

        service
            .update(
                user.id,
                first.id,
                AddressChanges {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let list = service.list(user.id).await.unwrap();
        assert_eq!(defaults(list.as_slice()), 1);
        assert!(list.iter().any(|a| a.id == first.id && a.is_default));
    }

    #[tokio::test]
    async fn foreign_address_is_forbidden_and_deleted_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = AddressService::new(store.clone());
        let owner = store.add_user("o@shop.test", "hash", &[RoleName::User]);
        let other = store.add_user("x@shop.test", "hash", &[RoleName::User]);
        let address = service.create(owner.id, home(false)).await.unwrap();

        assert!(matches!(
            service.get(other.id, address.id).await,
            Err(AppError::Forbidden(_))
        ));

        service.delete(owner.id, address.id).await.unwrap();
        assert!(matches!(
            service.get(owner.id, address.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list(owner.id).await.unwrap().is_empty());
    }
}
