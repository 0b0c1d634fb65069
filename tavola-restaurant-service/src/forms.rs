//! Submitted field sets and their validation.
//!
//! Raw forms keep every value as text so a failed submission can be rendered
//! back exactly as typed. Ownership fields are not part of either form; any
//! such key in a submission is ignored during deserialization.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::models::{MenuItem, Restaurant};

const REQUIRED: &str = "This field is required.";

/// One message per offending field, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    max_chars: Option<usize>,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if let Some(max) = max_chars {
        let count = value.chars().count();
        if count > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {count})."),
            );
        }
    }
    value.to_string()
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RestaurantForm {
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub operating_hours: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RestaurantFields {
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub operating_hours: String,
}

impl RestaurantForm {
    pub fn from_restaurant(restaurant: &Restaurant) -> Self {
        Self {
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            cuisine_type: restaurant.cuisine_type.clone(),
            operating_hours: restaurant.operating_hours.clone(),
        }
    }

    pub fn validate(&self) -> Result<RestaurantFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let fields = RestaurantFields {
            name: required(&mut errors, "name", &self.name, Some(200)),
            address: required(&mut errors, "address", &self.address, None),
            cuisine_type: required(&mut errors, "cuisine_type", &self.cuisine_type, Some(100)),
            operating_hours: required(
                &mut errors,
                "operating_hours",
                &self.operating_hours,
                Some(200),
            ),
        };
        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MenuItemForm {
    pub name: String,
    pub description: String,
    pub price: String,
    /// Checkbox: absent when unticked.
    pub dine_in_only: Option<String>,
    pub photo_path: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuItemFields {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub dine_in_only: bool,
    pub photo_path: Option<String>,
}

impl MenuItemForm {
    pub fn from_menu_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.with_scale(2).to_string(),
            dine_in_only: item.dine_in_only.then(|| "on".to_string()),
            photo_path: item.photo_path.clone().unwrap_or_default(),
        }
    }

    pub fn is_dine_in_only(&self) -> bool {
        matches!(self.dine_in_only.as_deref(), Some("on" | "true" | "1"))
    }

    pub fn validate(&self) -> Result<MenuItemFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", &self.name, Some(200));
        let description = required(&mut errors, "description", &self.description, None);
        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(message) => {
                errors.add("price", message);
                None
            }
        };

        let photo_path = self.photo_path.trim();
        let count = photo_path.chars().count();
        if count > 500 {
            errors.add(
                "photo_path",
                format!("Ensure this value has at most 500 characters (it has {count})."),
            );
        }

        match price {
            Some(price) if errors.is_empty() => Ok(MenuItemFields {
                name,
                description,
                price,
                dine_in_only: self.is_dine_in_only(),
                photo_path: (!photo_path.is_empty()).then(|| photo_path.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

/// Non-negative, at most two significant fraction digits and eight integer
/// digits. The result is always at scale 2.
pub fn parse_price(raw: &str) -> Result<BigDecimal, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let value = BigDecimal::from_str(raw).map_err(|_| "Enter a number.".to_string())?;
    if value < BigDecimal::from(0) {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    if scale > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }
    if value >= BigDecimal::from(100_000_000) {
        return Err(
            "Ensure that there are no more than 8 digits before the decimal point.".to_string(),
        );
    }
    Ok(value.with_scale(2))
}
