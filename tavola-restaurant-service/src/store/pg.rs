use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{insert_into, prelude::*, PgConnection};
use diesel_migrations::MigrationHarness;
use tracing::info;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    MenuItem, MenuItemChanges, NewMenuItem, NewRestaurant, Restaurant, RestaurantChanges, User,
};
use crate::schema::{menu_items, restaurants, users};
use crate::MIGRATIONS;

/// Opens a fresh connection per operation.
#[derive(Clone, Debug)]
pub struct PgStore {
    database_url: String,
}

impl PgStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    pub fn connect(&self) -> Result<PgConnection, StoreError> {
        Ok(PgConnection::establish(&self.database_url)?)
    }

    pub fn run_migrations(&self) -> Result<usize, StoreError> {
        let conn = &mut self.connect()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        for version in &applied {
            info!(%version, "applied migration");
        }
        Ok(applied.len())
    }
}

fn classify(err: DieselError) -> StoreError {
    match err {
        DieselError::NotFound => StoreError::NotFound,
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation,
            info,
        ) => StoreError::Constraint(info.message().to_string()),
        other => StoreError::Query(other),
    }
}

impl Store for PgStore {
    fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = &mut self.connect()?;
        users::table
            .find(id)
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(classify)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = &mut self.connect()?;
        users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(classify)
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = &mut self.connect()?;
        insert_into(users::table)
            .values(user)
            .execute(conn)
            .map_err(classify)?;
        Ok(())
    }

    fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        let conn = &mut self.connect()?;
        restaurants::table
            .select(Restaurant::as_select())
            .order((restaurants::created_at.desc(), restaurants::id.desc()))
            .load(conn)
            .map_err(classify)
    }

    fn find_restaurant(&self, id: i64) -> Result<Option<Restaurant>, StoreError> {
        let conn = &mut self.connect()?;
        restaurants::table
            .find(id)
            .select(Restaurant::as_select())
            .first(conn)
            .optional()
            .map_err(classify)
    }

    fn insert_restaurant(&self, restaurant: &NewRestaurant) -> Result<Restaurant, StoreError> {
        let conn = &mut self.connect()?;
        insert_into(restaurants::table)
            .values(restaurant)
            .returning(Restaurant::as_returning())
            .get_result(conn)
            .map_err(classify)
    }

    fn update_restaurant(
        &self,
        id: i64,
        changes: &RestaurantChanges,
    ) -> Result<Restaurant, StoreError> {
        let conn = &mut self.connect()?;
        diesel::update(restaurants::table.find(id))
            .set(changes)
            .returning(Restaurant::as_returning())
            .get_result(conn)
            .map_err(classify)
    }

    fn delete_restaurant(&self, id: i64) -> Result<(), StoreError> {
        let conn = &mut self.connect()?;
        // Children first, in one transaction.
        let deleted = conn
            .transaction::<_, DieselError, _>(|conn| {
                diesel::delete(menu_items::table.filter(menu_items::restaurant_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(restaurants::table.find(id)).execute(conn)
            })
            .map_err(classify)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn list_menu_items(&self, restaurant_id: i64) -> Result<Vec<MenuItem>, StoreError> {
        let conn = &mut self.connect()?;
        menu_items::table
            .filter(menu_items::restaurant_id.eq(restaurant_id))
            .select(MenuItem::as_select())
            .order((menu_items::created_at.desc(), menu_items::id.desc()))
            .load(conn)
            .map_err(classify)
    }

    fn find_menu_item(&self, id: i64) -> Result<Option<MenuItem>, StoreError> {
        let conn = &mut self.connect()?;
        menu_items::table
            .find(id)
            .select(MenuItem::as_select())
            .first(conn)
            .optional()
            .map_err(classify)
    }

    fn insert_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, StoreError> {
        let conn = &mut self.connect()?;
        insert_into(menu_items::table)
            .values(item)
            .returning(MenuItem::as_returning())
            .get_result(conn)
            .map_err(classify)
    }

    fn update_menu_item(
        &self,
        id: i64,
        changes: &MenuItemChanges,
    ) -> Result<MenuItem, StoreError> {
        let conn = &mut self.connect()?;
        diesel::update(menu_items::table.find(id))
            .set(changes)
            .returning(MenuItem::as_returning())
            .get_result(conn)
            .map_err(classify)
    }

    fn delete_menu_item(&self, id: i64) -> Result<(), StoreError> {
        let conn = &mut self.connect()?;
        let deleted = diesel::delete(menu_items::table.find(id))
            .execute(conn)
            .map_err(classify)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
