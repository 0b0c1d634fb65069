//! Read and mutation flows for restaurants and menu items.
//!
//! Every mutation runs the same sequence: [`require_login`], resolve the
//! target, [`require_owner`], validate, persist. Each step either passes or
//! ends the request with a [`FlowError`]; nothing is written before the last
//! step.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::FlowError;
use crate::forms::{MenuItemForm, RestaurantForm};
use crate::models::{
    MenuItem, MenuItemChanges, NewMenuItem, NewRestaurant, Restaurant, RestaurantChanges, UserId,
};
use crate::ownership::{require_login, require_owner, Owned};
use crate::store::Store;

/// A restaurant with its menu, newest items first.
#[derive(Clone, Debug)]
pub struct RestaurantPage {
    pub restaurant: Restaurant,
    pub owner_name: Option<String>,
    pub menu_items: Vec<MenuItem>,
}

#[derive(Clone, Debug)]
pub struct MenuItemPage {
    pub menu_item: MenuItem,
    pub restaurant: Restaurant,
}

#[derive(Clone)]
pub struct RestaurantService {
    store: Arc<dyn Store>,
}

impl RestaurantService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn find_restaurant(&self, id: i64) -> Result<Restaurant, FlowError> {
        self.store
            .find_restaurant(id)?
            .ok_or(FlowError::RecordNotFound)
    }

    fn find_menu_item(&self, id: i64) -> Result<MenuItem, FlowError> {
        self.store
            .find_menu_item(id)?
            .ok_or(FlowError::RecordNotFound)
    }

    fn authorize<T: Owned>(&self, record: &T, user: UserId, action: &str) -> Result<(), FlowError> {
        require_owner(self.store(), record, user).inspect_err(|err| {
            if matches!(err, FlowError::NotAuthorized) {
                warn!(%user, action, "mutation denied");
            }
        })
    }

    // Reads

    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>, FlowError> {
        Ok(self.store.list_restaurants()?)
    }

    pub fn restaurant_page(&self, id: i64) -> Result<RestaurantPage, FlowError> {
        let restaurant = self.find_restaurant(id)?;
        let owner_name = self
            .store
            .find_user(restaurant.owner_id)?
            .map(|u| u.username);
        let menu_items = self.store.list_menu_items(restaurant.id)?;
        Ok(RestaurantPage {
            restaurant,
            owner_name,
            menu_items,
        })
    }

    pub fn menu_item_page(&self, id: i64) -> Result<MenuItemPage, FlowError> {
        let menu_item = self.find_menu_item(id)?;
        let restaurant = self.find_restaurant(menu_item.restaurant_id)?;
        Ok(MenuItemPage {
            menu_item,
            restaurant,
        })
    }

    // Restaurant mutations

    /// Gate for showing the empty creation form.
    pub fn authorize_create_restaurant(
        &self,
        identity: Option<UserId>,
    ) -> Result<UserId, FlowError> {
        require_login(identity)
    }

    pub fn create_restaurant(
        &self,
        identity: Option<UserId>,
        form: &RestaurantForm,
    ) -> Result<Restaurant, FlowError> {
        let user = require_login(identity)?;
        let fields = form.validate().map_err(FlowError::ValidationFailed)?;

        let now = Utc::now();
        let restaurant = self.store.insert_restaurant(&NewRestaurant {
            name: fields.name,
            address: fields.address,
            cuisine_type: fields.cuisine_type,
            operating_hours: fields.operating_hours,
            owner_id: user.0,
            created_at: now,
            updated_at: now,
        })?;
        info!(restaurant_id = restaurant.id, %user, "restaurant created");
        Ok(restaurant)
    }

    /// Gate for the edit form and the delete confirmation.
    pub fn authorize_restaurant(
        &self,
        identity: Option<UserId>,
        id: i64,
    ) -> Result<Restaurant, FlowError> {
        let user = require_login(identity)?;
        let restaurant = self.find_restaurant(id)?;
        self.authorize(&restaurant, user, "edit restaurant")?;
        Ok(restaurant)
    }

    pub fn update_restaurant(
        &self,
        identity: Option<UserId>,
        id: i64,
        form: &RestaurantForm,
    ) -> Result<Restaurant, FlowError> {
        let user = require_login(identity)?;
        let restaurant = self.find_restaurant(id)?;
        self.authorize(&restaurant, user, "update restaurant")?;
        let fields = form.validate().map_err(FlowError::ValidationFailed)?;

        let updated = self.store.update_restaurant(
            restaurant.id,
            &RestaurantChanges {
                name: fields.name,
                address: fields.address,
                cuisine_type: fields.cuisine_type,
                operating_hours: fields.operating_hours,
                updated_at: Utc::now(),
            },
        )?;
        info!(restaurant_id = updated.id, %user, "restaurant updated");
        Ok(updated)
    }

    /// Deletes the restaurant and, with it, its whole menu.
    pub fn delete_restaurant(
        &self,
        identity: Option<UserId>,
        id: i64,
    ) -> Result<Restaurant, FlowError> {
        let user = require_login(identity)?;
        let restaurant = self.find_restaurant(id)?;
        self.authorize(&restaurant, user, "delete restaurant")?;

        self.store.delete_restaurant(restaurant.id)?;
        info!(restaurant_id = restaurant.id, %user, "restaurant deleted");
        Ok(restaurant)
    }

    // Menu item mutations

    /// Gate for showing the empty menu item form; yields the parent.
    pub fn authorize_create_menu_item(
        &self,
        identity: Option<UserId>,
        restaurant_id: i64,
    ) -> Result<Restaurant, FlowError> {
        let user = require_login(identity)?;
        let restaurant = self.find_restaurant(restaurant_id)?;
        self.authorize(&restaurant, user, "add menu item")?;
        Ok(restaurant)
    }

    pub fn create_menu_item(
        &self,
        identity: Option<UserId>,
        restaurant_id: i64,
        form: &MenuItemForm,
    ) -> Result<MenuItem, FlowError> {
        let restaurant = self.authorize_create_menu_item(identity, restaurant_id)?;
        let fields = form.validate().map_err(FlowError::ValidationFailed)?;

        let now = Utc::now();
        let menu_item = self.store.insert_menu_item(&NewMenuItem {
            restaurant_id: restaurant.id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            dine_in_only: fields.dine_in_only,
            photo_path: fields.photo_path,
            created_at: now,
            updated_at: now,
        })?;
        info!(
            menu_item_id = menu_item.id,
            restaurant_id = restaurant.id,
            "menu item created"
        );
        Ok(menu_item)
    }

    /// Gate for the edit form and the delete confirmation.
    pub fn authorize_menu_item(
        &self,
        identity: Option<UserId>,
        id: i64,
    ) -> Result<MenuItemPage, FlowError> {
        let user = require_login(identity)?;
        let menu_item = self.find_menu_item(id)?;
        self.authorize(&menu_item, user, "edit menu item")?;
        let restaurant = self.find_restaurant(menu_item.restaurant_id)?;
        Ok(MenuItemPage {
            menu_item,
            restaurant,
        })
    }

    pub fn update_menu_item(
        &self,
        identity: Option<UserId>,
        id: i64,
        form: &MenuItemForm,
    ) -> Result<MenuItem, FlowError> {
        let user = require_login(identity)?;
        let menu_item = self.find_menu_item(id)?;
        self.authorize(&menu_item, user, "update menu item")?;
        let fields = form.validate().map_err(FlowError::ValidationFailed)?;

        let updated = self.store.update_menu_item(
            menu_item.id,
            &MenuItemChanges {
                name: fields.name,
                description: fields.description,
                price: fields.price,
                dine_in_only: fields.dine_in_only,
                photo_path: fields.photo_path,
                updated_at: Utc::now(),
            },
        )?;
        info!(menu_item_id = updated.id, %user, "menu item updated");
        Ok(updated)
    }

    pub fn delete_menu_item(
        &self,
        identity: Option<UserId>,
        id: i64,
    ) -> Result<MenuItem, FlowError> {
        let user = require_login(identity)?;
        let menu_item = self.find_menu_item(id)?;
        self.authorize(&menu_item, user, "delete menu item")?;

        self.store.delete_menu_item(menu_item.id)?;
        info!(menu_item_id = menu_item.id, %user, "menu item deleted");
        Ok(menu_item)
    }
}
