use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    MenuItem, MenuItemChanges, NewMenuItem, NewRestaurant, Restaurant, RestaurantChanges, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    restaurants: Vec<Restaurant>,
    menu_items: Vec<MenuItem>,
    restaurant_seq: i64,
    menu_item_seq: i64,
}

/// In-process store with the same referential rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Writes finish before the guard drops, so a poisoned table is still consistent.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Rows are kept in insertion order; a stable sort over the reversed rows
/// orders by creation time descending and breaks ties by newest id.
fn newest_first<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}

impl Store for MemoryStore {
    fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if tables
            .users
            .iter()
            .any(|u| u.id == user.id || u.username == user.username)
        {
            return Err(StoreError::Constraint(format!(
                "user {} already exists",
                user.username
            )));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        let tables = self.lock();
        Ok(newest_first(tables.restaurants.iter().cloned(), |r| r.created_at))
    }

    fn find_restaurant(&self, id: i64) -> Result<Option<Restaurant>, StoreError> {
        Ok(self.lock().restaurants.iter().find(|r| r.id == id).cloned())
    }

    fn insert_restaurant(&self, restaurant: &NewRestaurant) -> Result<Restaurant, StoreError> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == restaurant.owner_id) {
            return Err(StoreError::Constraint(format!(
                "owner {} does not exist",
                restaurant.owner_id
            )));
        }
        tables.restaurant_seq += 1;
        let row = Restaurant {
            id: tables.restaurant_seq,
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            cuisine_type: restaurant.cuisine_type.clone(),
            operating_hours: restaurant.operating_hours.clone(),
            owner_id: restaurant.owner_id,
            created_at: restaurant.created_at,
            updated_at: restaurant.updated_at,
        };
        tables.restaurants.push(row.clone());
        Ok(row)
    }

    fn update_restaurant(
        &self,
        id: i64,
        changes: &RestaurantChanges,
    ) -> Result<Restaurant, StoreError> {
        let mut tables = self.lock();
        let row = tables
            .restaurants
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        row.name = changes.name.clone();
        row.address = changes.address.clone();
        row.cuisine_type = changes.cuisine_type.clone();
        row.operating_hours = changes.operating_hours.clone();
        row.updated_at = changes.updated_at;
        Ok(row.clone())
    }

    fn delete_restaurant(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let before = tables.restaurants.len();
        tables.restaurants.retain(|r| r.id != id);
        if tables.restaurants.len() == before {
            return Err(StoreError::NotFound);
        }
        tables.menu_items.retain(|i| i.restaurant_id != id);
        Ok(())
    }

    fn list_menu_items(&self, restaurant_id: i64) -> Result<Vec<MenuItem>, StoreError> {
        let tables = self.lock();
        Ok(newest_first(
            tables
                .menu_items
                .iter()
                .filter(|i| i.restaurant_id == restaurant_id)
                .cloned(),
            |i| i.created_at,
        ))
    }

    fn find_menu_item(&self, id: i64) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.lock().menu_items.iter().find(|i| i.id == id).cloned())
    }

    fn insert_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, StoreError> {
        let mut tables = self.lock();
        if !tables.restaurants.iter().any(|r| r.id == item.restaurant_id) {
            return Err(StoreError::Constraint(format!(
                "restaurant {} does not exist",
                item.restaurant_id
            )));
        }
        tables.menu_item_seq += 1;
        let row = MenuItem {
            id: tables.menu_item_seq,
            restaurant_id: item.restaurant_id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.clone(),
            dine_in_only: item.dine_in_only,
            photo_path: item.photo_path.clone(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        };
        tables.menu_items.push(row.clone());
        Ok(row)
    }

    fn update_menu_item(
        &self,
        id: i64,
        changes: &MenuItemChanges,
    ) -> Result<MenuItem, StoreError> {
        let mut tables = self.lock();
        let row = tables
            .menu_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        row.name = changes.name.clone();
        row.description = changes.description.clone();
        row.price = changes.price.clone();
        row.dine_in_only = changes.dine_in_only;
        row.photo_path = changes.photo_path.clone();
        row.updated_at = changes.updated_at;
        Ok(row.clone())
    }

    fn delete_menu_item(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let before = tables.menu_items.len();
        tables.menu_items.retain(|i| i.id != id);
        if tables.menu_items.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
