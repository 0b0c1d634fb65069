//! Persistence seam. The flow in [`crate::service`] only talks to [`Store`];
//! [`pg::PgStore`] backs it with PostgreSQL and [`memory::MemoryStore`] keeps
//! everything in process.

use uuid::Uuid;

use crate::models::{
    MenuItem, MenuItemChanges, NewMenuItem, NewRestaurant, Restaurant, RestaurantChanges, User,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("record not found")]
    NotFound,
}

/// Every method is atomic on its own. Lists come back newest first.
pub trait Store: Send + Sync {
    fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError>;
    fn find_restaurant(&self, id: i64) -> Result<Option<Restaurant>, StoreError>;
    fn insert_restaurant(&self, restaurant: &NewRestaurant) -> Result<Restaurant, StoreError>;
    fn update_restaurant(
        &self,
        id: i64,
        changes: &RestaurantChanges,
    ) -> Result<Restaurant, StoreError>;
    /// Removes the restaurant together with all of its menu items.
    fn delete_restaurant(&self, id: i64) -> Result<(), StoreError>;

    fn list_menu_items(&self, restaurant_id: i64) -> Result<Vec<MenuItem>, StoreError>;
    fn find_menu_item(&self, id: i64) -> Result<Option<MenuItem>, StoreError>;
    fn insert_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, StoreError>;
    fn update_menu_item(&self, id: i64, changes: &MenuItemChanges)
        -> Result<MenuItem, StoreError>;
    fn delete_menu_item(&self, id: i64) -> Result<(), StoreError>;
}
