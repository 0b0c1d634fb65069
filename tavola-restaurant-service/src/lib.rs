use std::env;

use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use dotenvy::dotenv;

pub mod accounts;
pub mod error;
pub mod forms;
pub mod models;
pub mod ownership;
pub mod schema;
pub mod service;
pub mod store;

pub use error::FlowError;
pub use service::RestaurantService;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub fn database_url() -> Result<String, env::VarError> {
    dotenv().ok();

    env::var("DATABASE_URL")
}
