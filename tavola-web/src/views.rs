//! HTML pages. Every interpolated value goes through [`escape`].

use std::fmt::Write;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use tavola_restaurant_service::accounts::Session;
use tavola_restaurant_service::forms::{FieldErrors, MenuItemForm, RestaurantForm};
use tavola_restaurant_service::models::{MenuItem, Restaurant};
use tavola_restaurant_service::service::{MenuItemPage, RestaurantPage};

use crate::flash::Flash;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn price(value: &BigDecimal) -> String {
    value.with_scale(2).to_string()
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Per-request parts of the surrounding layout.
pub struct Chrome<'a> {
    pub session: Option<&'a Session>,
    pub flash: Option<&'a Flash>,
}

pub fn layout(chrome: &Chrome<'_>, title: &str, body: &str) -> String {
    let account = match chrome.session {
        Some(session) => format!(
            r#"<span class="navbar-text">{}</span>
<form method="post" action="/accounts/logout/" class="d-inline"><button type="submit" class="btn btn-link">Log out</button></form>"#,
            escape(&session.username)
        ),
        None => r#"<a class="nav-link" href="/accounts/login/">Log in</a>"#.to_string(),
    };
    let flash = chrome
        .flash
        .map(|f| {
            format!(
                r#"<div class="alert alert-{}" role="alert">{}</div>"#,
                f.level.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Restaurant System</title>
</head>
<body>
<nav class="navbar"><a class="navbar-brand" href="/">Restaurant System</a> <a class="nav-link" href="/restaurants/">Restaurants</a> {account}</nav>
<main class="container">
{flash}
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn home() -> String {
    r#"<h1>Restaurant System</h1>
<p>Browse restaurants and their menus. Sign in to list your own restaurant.</p>
<a class="btn btn-primary" href="/restaurants/">See restaurants</a>"#
        .to_string()
}

pub fn not_found() -> String {
    "<h1>Not found</h1>\n<p>The page you requested does not exist.</p>".to_string()
}

pub fn server_error() -> String {
    "<h1>Server error</h1>\n<p>Something went wrong. Please try again later.</p>".to_string()
}

pub fn restaurant_list(restaurants: &[Restaurant], signed_in: bool) -> String {
    let mut body = String::from("<h1>Restaurants</h1>\n");
    if signed_in {
        body.push_str(r#"<a class="btn btn-primary" href="/restaurants/create/">New restaurant</a>"#);
        body.push('\n');
    }
    if restaurants.is_empty() {
        body.push_str("<p>No restaurants registered yet.</p>");
        return body;
    }
    body.push_str("<ul class=\"restaurants\">\n");
    for r in restaurants {
        let _ = writeln!(
            body,
            r#"<li><a href="/restaurants/{}/">{}</a> <span class="cuisine">{}</span> <span class="hours">{}</span></li>"#,
            r.id,
            escape(&r.name),
            escape(&r.cuisine_type),
            escape(&r.operating_hours),
        );
    }
    body.push_str("</ul>");
    body
}

fn menu_rows(items: &[MenuItem]) -> String {
    if items.is_empty() {
        return "<p>No menu items yet.</p>".to_string();
    }
    let mut rows = String::from("<ul class=\"menu\">\n");
    for item in items {
        let _ = writeln!(
            rows,
            r#"<li><a href="/menu-items/{}/">{}</a> <span class="price">{}</span>{}</li>"#,
            item.id,
            escape(&item.name),
            price(&item.price),
            if item.dine_in_only {
                r#" <span class="badge">Dine-in only</span>"#
            } else {
                ""
            },
        );
    }
    rows.push_str("</ul>");
    rows
}

pub fn restaurant_detail(page: &RestaurantPage, is_owner: bool) -> String {
    let r = &page.restaurant;
    let mut body = format!(
        r#"<h1>{name}</h1>
<dl>
<dt>Address</dt><dd>{address}</dd>
<dt>Cuisine</dt><dd>{cuisine}</dd>
<dt>Opening hours</dt><dd>{hours}</dd>
<dt>Owner</dt><dd>{owner}</dd>
<dt>Listed</dt><dd>{created}</dd>
</dl>
"#,
        name = escape(&r.name),
        address = escape(&r.address),
        cuisine = escape(&r.cuisine_type),
        hours = escape(&r.operating_hours),
        owner = escape(page.owner_name.as_deref().unwrap_or("-")),
        created = timestamp(&r.created_at),
    );
    if is_owner {
        let _ = writeln!(
            body,
            r#"<a class="btn btn-secondary" href="/restaurants/{id}/update/">Edit</a> <a class="btn btn-danger" href="/restaurants/{id}/delete/">Delete</a> <a class="btn btn-primary" href="/restaurants/{id}/menu/create/">Add menu item</a>"#,
            id = r.id
        );
    }
    let _ = write!(
        body,
        "<h2><a href=\"/restaurants/{}/menu/\">Menu</a></h2>\n{}",
        r.id,
        menu_rows(&page.menu_items)
    );
    body
}

pub fn menu_item_list(page: &RestaurantPage, is_owner: bool) -> String {
    let r = &page.restaurant;
    let mut body = format!(
        "<h1>Menu of <a href=\"/restaurants/{}/\">{}</a></h1>\n",
        r.id,
        escape(&r.name)
    );
    if is_owner {
        let _ = writeln!(
            body,
            r#"<a class="btn btn-primary" href="/restaurants/{}/menu/create/">Add menu item</a>"#,
            r.id
        );
    }
    body.push_str(&menu_rows(&page.menu_items));
    body
}

pub fn menu_item_detail(page: &MenuItemPage, is_owner: bool) -> String {
    let item = &page.menu_item;
    let mut body = format!(
        r#"<h1>{label}</h1>
<p>{description}</p>
<dl>
<dt>Price</dt><dd>{price}</dd>
<dt>Availability</dt><dd>{availability}</dd>
<dt>Restaurant</dt><dd><a href="/restaurants/{restaurant_id}/">{restaurant}</a></dd>
</dl>
"#,
        label = escape(&item.label(&page.restaurant)),
        description = escape(&item.description),
        price = price(&item.price),
        availability = if item.dine_in_only {
            "Dine-in only"
        } else {
            "Dine-in and delivery"
        },
        restaurant_id = page.restaurant.id,
        restaurant = escape(&page.restaurant.name),
    );
    if let Some(photo) = &item.photo_path {
        let _ = writeln!(
            body,
            r#"<img class="photo" src="{0}" alt="{1}">"#,
            escape(photo),
            escape(&item.name)
        );
    }
    if is_owner {
        let _ = writeln!(
            body,
            r#"<a class="btn btn-secondary" href="/menu-items/{id}/update/">Edit</a> <a class="btn btn-danger" href="/menu-items/{id}/delete/">Delete</a>"#,
            id = item.id
        );
    }
    body
}

fn field_error(errors: Option<&FieldErrors>, field: &str) -> String {
    errors
        .and_then(|e| e.get(field))
        .map(|message| format!(r#"<div class="invalid-feedback">{}</div>"#, escape(message)))
        .unwrap_or_default()
}

fn text_input(
    errors: Option<&FieldErrors>,
    field: &str,
    label: &str,
    value: &str,
    placeholder: &str,
) -> String {
    format!(
        r#"<div class="mb-3"><label for="id_{field}">{label}</label><input type="text" class="form-control" id="id_{field}" name="{field}" value="{value}" placeholder="{placeholder}">{error}</div>
"#,
        value = escape(value),
        placeholder = escape(placeholder),
        error = field_error(errors, field),
    )
}

fn textarea(
    errors: Option<&FieldErrors>,
    field: &str,
    label: &str,
    value: &str,
    placeholder: &str,
) -> String {
    format!(
        r#"<div class="mb-3"><label for="id_{field}">{label}</label><textarea class="form-control" rows="3" id="id_{field}" name="{field}" placeholder="{placeholder}">{value}</textarea>{error}</div>
"#,
        value = escape(value),
        placeholder = escape(placeholder),
        error = field_error(errors, field),
    )
}

pub fn restaurant_form(
    action: &str,
    post_to: &str,
    form: &RestaurantForm,
    errors: Option<&FieldErrors>,
) -> String {
    let mut body = format!(
        "<h1>{} restaurant</h1>\n<form method=\"post\" action=\"{}\">\n",
        escape(action),
        escape(post_to)
    );
    body.push_str(&text_input(errors, "name", "Name", &form.name, "Restaurant name"));
    body.push_str(&textarea(errors, "address", "Address", &form.address, "Full address"));
    body.push_str(&text_input(
        errors,
        "cuisine_type",
        "Cuisine",
        &form.cuisine_type,
        "E.g. Italian, Japanese, Brazilian",
    ));
    body.push_str(&text_input(
        errors,
        "operating_hours",
        "Opening hours",
        &form.operating_hours,
        "E.g. Mon-Fri 10am-10pm, Sat-Sun 11am-11pm",
    ));
    let _ = write!(
        body,
        "<button type=\"submit\" class=\"btn btn-primary\">{}</button>\n</form>",
        escape(action)
    );
    body
}

pub fn menu_item_form(
    action: &str,
    post_to: &str,
    restaurant: &Restaurant,
    form: &MenuItemForm,
    errors: Option<&FieldErrors>,
) -> String {
    let mut body = format!(
        "<h1>{} menu item</h1>\n<p>Restaurant: <a href=\"/restaurants/{}/\">{}</a></p>\n<form method=\"post\" action=\"{}\">\n",
        escape(action),
        restaurant.id,
        escape(&restaurant.name),
        escape(post_to)
    );
    body.push_str(&text_input(errors, "name", "Name", &form.name, "Dish name"));
    body.push_str(&textarea(
        errors,
        "description",
        "Description",
        &form.description,
        "Dish description",
    ));
    let _ = writeln!(
        body,
        r#"<div class="mb-3"><label for="id_price">Price</label><input type="number" step="0.01" min="0" class="form-control" id="id_price" name="price" value="{}" placeholder="0.00">{}</div>"#,
        escape(&form.price),
        field_error(errors, "price"),
    );
    let _ = writeln!(
        body,
        r#"<div class="form-check"><input type="checkbox" class="form-check-input" id="id_dine_in_only" name="dine_in_only"{}><label for="id_dine_in_only">Available only at the restaurant</label></div>"#,
        if form.is_dine_in_only() { " checked" } else { "" },
    );
    body.push_str(&text_input(
        errors,
        "photo_path",
        "Photo path",
        &form.photo_path,
        "/media/photos/dish.jpg",
    ));
    let _ = write!(
        body,
        "<button type=\"submit\" class=\"btn btn-primary\">{}</button>\n</form>",
        escape(action)
    );
    body
}

pub fn restaurant_confirm_delete(restaurant: &Restaurant) -> String {
    format!(
        r#"<h1>Delete restaurant</h1>
<p>Are you sure you want to delete "{name}"? All of its menu items will be deleted too.</p>
<form method="post" action="/restaurants/{id}/delete/">
<button type="submit" class="btn btn-danger">Delete</button>
<a class="btn btn-secondary" href="/restaurants/{id}/">Cancel</a>
</form>"#,
        name = escape(&restaurant.name),
        id = restaurant.id,
    )
}

pub fn menu_item_confirm_delete(page: &MenuItemPage) -> String {
    format!(
        r#"<h1>Delete menu item</h1>
<p>Are you sure you want to delete "{label}"?</p>
<form method="post" action="/menu-items/{id}/delete/">
<button type="submit" class="btn btn-danger">Delete</button>
<a class="btn btn-secondary" href="/menu-items/{id}/">Cancel</a>
</form>"#,
        label = escape(&page.menu_item.label(&page.restaurant)),
        id = page.menu_item.id,
    )
}

pub fn login_form(username: &str, next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<div class="alert alert-danger">{}</div>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<h1>Log in</h1>
{error}
<form method="post" action="/accounts/login/">
<input type="hidden" name="next" value="{next}">
<div class="mb-3"><label for="id_username">Username</label><input type="text" class="form-control" id="id_username" name="username" value="{username}"></div>
<div class="mb-3"><label for="id_password">Password</label><input type="password" class="form-control" id="id_password" name="password"></div>
<button type="submit" class="btn btn-primary">Log in</button>
</form>"#,
        next = escape(next),
        username = escape(username),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("Açaí"), "Açaí");
    }

    #[test]
    fn test_form_marks_field_errors() {
        let mut errors = FieldErrors::default();
        errors.add("name", "This field is required.");
        let html = restaurant_form("Create", "/restaurants/create/", &RestaurantForm::default(), Some(&errors));
        assert!(html.contains(r#"<div class="invalid-feedback">This field is required.</div>"#));
        assert_eq!(html.matches("invalid-feedback").count(), 1);
    }
}
