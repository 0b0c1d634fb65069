use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{menu_items, restaurants, users};

/// Identity of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Clone, Debug, PartialEq)]
#[diesel(belongs_to(User, foreign_key = owner_id))]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub operating_hours: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn owner(&self) -> UserId {
        UserId(self.owner_id)
    }
}

impl fmt::Display for Restaurant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub operating_hours: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-editable restaurant columns; never includes the owner.
#[derive(AsChangeset, Clone, Debug, PartialEq)]
#[diesel(table_name = restaurants)]
pub struct RestaurantChanges {
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub operating_hours: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Restaurant))]
#[diesel(table_name = menu_items)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub dine_in_only: bool,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Renders as `"<item> - <restaurant>"`.
    pub fn label(&self, restaurant: &Restaurant) -> String {
        format!("{} - {}", self.name, restaurant.name)
    }
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItem {
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub dine_in_only: bool,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-editable menu item columns; never includes the parent restaurant.
#[derive(AsChangeset, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items, treat_none_as_null = true)]
pub struct MenuItemChanges {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub dine_in_only: bool,
    pub photo_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}
