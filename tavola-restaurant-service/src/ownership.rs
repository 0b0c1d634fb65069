//! Ownership rules. Restaurants are owned directly; a menu item is owned by
//! whoever owns its restaurant. Both guards are independent and can be called
//! in either order.

use crate::error::FlowError;
use crate::models::{MenuItem, Restaurant, UserId};
use crate::store::Store;

pub trait Owned {
    /// The user allowed to mutate this record.
    fn effective_owner(&self, store: &dyn Store) -> Result<UserId, FlowError>;
}

impl Owned for Restaurant {
    fn effective_owner(&self, _store: &dyn Store) -> Result<UserId, FlowError> {
        Ok(self.owner())
    }
}

impl Owned for MenuItem {
    fn effective_owner(&self, store: &dyn Store) -> Result<UserId, FlowError> {
        let parent = store
            .find_restaurant(self.restaurant_id)?
            .ok_or(FlowError::RecordNotFound)?;
        parent.effective_owner(store)
    }
}

pub fn require_login(identity: Option<UserId>) -> Result<UserId, FlowError> {
    identity.ok_or(FlowError::NotAuthenticated)
}

pub fn require_owner(
    store: &dyn Store,
    record: &impl Owned,
    user: UserId,
) -> Result<(), FlowError> {
    if record.effective_owner(store)? == user {
        Ok(())
    } else {
        Err(FlowError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMenuItem, NewRestaurant, User};
    use crate::store::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(store: &MemoryStore, username: &str) -> UserId {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        store.insert_user(&user).unwrap();
        user.user_id()
    }

    fn seed(store: &MemoryStore, owner: UserId) -> (Restaurant, MenuItem) {
        let now = Utc::now();
        let restaurant = store
            .insert_restaurant(&NewRestaurant {
                name: "Trattoria".to_string(),
                address: "Via Roma 1".to_string(),
                cuisine_type: "Italiana".to_string(),
                operating_hours: "Seg-Sex 10h-22h".to_string(),
                owner_id: owner.0,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        let item = store
            .insert_menu_item(&NewMenuItem {
                restaurant_id: restaurant.id,
                name: "Lasagna".to_string(),
                description: "Baked".to_string(),
                price: BigDecimal::from(30),
                dine_in_only: false,
                photo_path: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        (restaurant, item)
    }

    #[test]
    fn test_require_login() {
        let id = UserId(Uuid::new_v4());
        assert_eq!(require_login(Some(id)).unwrap(), id);
        assert!(matches!(require_login(None), Err(FlowError::NotAuthenticated)));
    }

    #[test]
    fn test_menu_item_owner_resolves_through_restaurant() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice");
        let (restaurant, item) = seed(&store, alice);

        assert_eq!(restaurant.effective_owner(&store).unwrap(), alice);
        assert_eq!(item.effective_owner(&store).unwrap(), alice);
    }

    #[test]
    fn test_require_owner_rejects_other_user() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");
        let (restaurant, item) = seed(&store, alice);

        assert!(require_owner(&store, &restaurant, alice).is_ok());
        assert!(require_owner(&store, &item, alice).is_ok());
        assert!(matches!(
            require_owner(&store, &restaurant, bob),
            Err(FlowError::NotAuthorized)
        ));
        assert!(matches!(
            require_owner(&store, &item, bob),
            Err(FlowError::NotAuthorized)
        ));
    }

    #[test]
    fn test_orphaned_menu_item_has_no_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice");
        let (restaurant, item) = seed(&store, alice);
        store.delete_restaurant(restaurant.id).unwrap();

        assert!(matches!(
            item.effective_owner(&store),
            Err(FlowError::RecordNotFound)
        ));
    }
}
