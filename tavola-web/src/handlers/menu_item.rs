use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use tavola_restaurant_service::{FlowError, forms::MenuItemForm};
use tracing::instrument;

use crate::error::WebError;
use crate::flash::Flash;
use crate::views;

use super::restaurant::detail_path as restaurant_path;
use super::{AppState, identity, parse_id, redirect_with, render};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants/{id}/menu/", get(list_menu_items))
        .route(
            "/restaurants/{id}/menu/create/",
            get(create_form).post(create_menu_item),
        )
        .route("/menu-items/{id}/", get(get_menu_item))
        .route(
            "/menu-items/{id}/update/",
            get(update_form).post(update_menu_item),
        )
        .route(
            "/menu-items/{id}/delete/",
            get(confirm_delete).post(delete_menu_item),
        )
}

fn detail_path(id: i64) -> String {
    format!("/menu-items/{id}/")
}

const ADD_DENIED: &str = "You do not have permission to add items to this restaurant.";
const EDIT_DENIED: &str = "You do not have permission to edit this item.";
const DELETE_DENIED: &str = "You do not have permission to delete this item.";

#[instrument(skip_all, fields(restaurant_id = %id))]
pub async fn list_menu_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let page = state.service.restaurant_page(id)?;
    let is_owner = session
        .as_ref()
        .is_some_and(|s| s.user_id == page.restaurant.owner());
    let title = format!("Menu - {}", page.restaurant);
    Ok(render(
        &headers,
        session.as_ref(),
        &title,
        views::menu_item_list(&page, is_owner),
    ))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let page = state.service.menu_item_page(id)?;
    let is_owner = session
        .as_ref()
        .is_some_and(|s| s.user_id == page.restaurant.owner());
    let title = page.menu_item.label(&page.restaurant);
    Ok(render(
        &headers,
        session.as_ref(),
        &title,
        views::menu_item_detail(&page, is_owner),
    ))
}

#[instrument(skip_all, fields(restaurant_id = %id))]
pub async fn create_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let restaurant = state
        .service
        .authorize_create_menu_item(identity(session.as_ref()), id)
        .map_err(|err| WebError::from_flow(err, &uri, restaurant_path(id), ADD_DENIED))?;
    let body = views::menu_item_form(
        "Create",
        uri.path(),
        &restaurant,
        &MenuItemForm::default(),
        None,
    );
    Ok(render(&headers, session.as_ref(), "New menu item", body))
}

#[instrument(skip_all, fields(restaurant_id = %id))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<MenuItemForm>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            state
                .service
                .authorize_create_menu_item(identity(session.as_ref()), id)
                .map_err(|err| WebError::from_flow(err, &uri, restaurant_path(id), ADD_DENIED))?;
            return Ok(rejection.into_response());
        }
    };
    match state
        .service
        .create_menu_item(identity(session.as_ref()), id, &form)
    {
        Ok(menu_item) => Ok(redirect_with(
            &detail_path(menu_item.id),
            Flash::success("Menu item created successfully!"),
        )),
        Err(FlowError::ValidationFailed(errors)) => {
            let restaurant = state.service.restaurant_page(id)?.restaurant;
            let body = views::menu_item_form("Create", uri.path(), &restaurant, &form, Some(&errors));
            Ok(render(&headers, session.as_ref(), "New menu item", body))
        }
        Err(err) => Err(WebError::from_flow(err, &uri, restaurant_path(id), ADD_DENIED)),
    }
}

#[instrument(skip_all, fields(id = %id))]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let page = state
        .service
        .authorize_menu_item(identity(session.as_ref()), id)
        .map_err(|err| WebError::from_flow(err, &uri, detail_path(id), EDIT_DENIED))?;
    let body = views::menu_item_form(
        "Update",
        uri.path(),
        &page.restaurant,
        &MenuItemForm::from_menu_item(&page.menu_item),
        None,
    );
    Ok(render(&headers, session.as_ref(), "Edit menu item", body))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<MenuItemForm>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            state
                .service
                .authorize_menu_item(identity(session.as_ref()), id)
                .map_err(|err| WebError::from_flow(err, &uri, detail_path(id), EDIT_DENIED))?;
            return Ok(rejection.into_response());
        }
    };
    match state
        .service
        .update_menu_item(identity(session.as_ref()), id, &form)
    {
        Ok(menu_item) => Ok(redirect_with(
            &detail_path(menu_item.id),
            Flash::success("Menu item updated successfully!"),
        )),
        Err(FlowError::ValidationFailed(errors)) => {
            let restaurant = state.service.menu_item_page(id)?.restaurant;
            let body = views::menu_item_form("Update", uri.path(), &restaurant, &form, Some(&errors));
            Ok(render(&headers, session.as_ref(), "Edit menu item", body))
        }
        Err(err) => Err(WebError::from_flow(err, &uri, detail_path(id), EDIT_DENIED)),
    }
}

#[instrument(skip_all, fields(id = %id))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let page = state
        .service
        .authorize_menu_item(identity(session.as_ref()), id)
        .map_err(|err| WebError::from_flow(err, &uri, detail_path(id), DELETE_DENIED))?;
    Ok(render(
        &headers,
        session.as_ref(),
        "Delete menu item",
        views::menu_item_confirm_delete(&page),
    ))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let menu_item = state
        .service
        .delete_menu_item(identity(session.as_ref()), id)
        .map_err(|err| WebError::from_flow(err, &uri, detail_path(id), DELETE_DENIED))?;
    Ok(redirect_with(
        &restaurant_path(menu_item.restaurant_id),
        Flash::success("Menu item deleted successfully!"),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{TestApp, flash_cookie, location};
    use axum::http::StatusCode;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const PIZZA: &str = "name=Pizza&description=Delicious+pizza&price=25.90&dine_in_only=on";

    #[tokio::test]
    async fn test_owner_adds_menu_item() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let path = format!("/restaurants/{}/menu/create/", restaurant.id);

        let (status, _, body) = app.get(&path, Some(&app.alice)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Trattoria"));

        let (status, headers, _) = app.post(&path, Some(&app.alice), PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(flash_cookie(&headers).contains("Menu+item+created+successfully"));

        let items = app.store().list_menu_items(restaurant.id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(location(&headers), format!("/menu-items/{}/", items[0].id));
        assert_eq!(items[0].price, BigDecimal::from_str("25.90").unwrap());
        assert!(items[0].dine_in_only);
        assert_eq!(items[0].photo_path, None);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_add_menu_item() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let path = format!("/restaurants/{}/menu/create/", restaurant.id);

        let (status, headers, _) = app.post(&path, Some(&app.bob), PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/restaurants/{}/", restaurant.id));
        assert!(flash_cookie(&headers).contains("add+items+to+this+restaurant"));
        assert!(app.store().list_menu_items(restaurant.id).unwrap().is_empty());

        let (status, headers, _) = app.get(&path, None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/accounts/login/?next="));
    }

    #[tokio::test]
    async fn test_negative_price_rerenders_form() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let path = format!("/restaurants/{}/menu/create/", restaurant.id);

        let (status, _, body) = app
            .post(
                &path,
                Some(&app.alice),
                "name=Pizza&description=Delicious+pizza&price=-1.00",
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("invalid-feedback"));
        assert!(body.contains(r#"value="-1.00""#));
        assert!(app.store().list_menu_items(restaurant.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_menu_lists_and_detail() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        app.menu_item(&app.alice, restaurant.id, "Pizza");
        let pasta = app.menu_item(&app.alice, restaurant.id, "Pasta");

        let (status, _, body) = app
            .get(&format!("/restaurants/{}/menu/", restaurant.id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.find("Pasta").unwrap() < body.find("Pizza").unwrap());

        let (status, _, body) = app.get(&format!("/menu-items/{}/", pasta.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Pasta - Trattoria"));
        assert!(body.contains("25.90"));

        let (status, _, _) = app.get("/menu-items/pasta/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = app.get("/restaurants/42/menu/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_checks_parent_owner() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let item = app.menu_item(&app.alice, restaurant.id, "Pizza");
        let path = format!("/menu-items/{}/update/", item.id);
        let form = "name=Calzone&description=Folded&price=30&photo_path=";

        let (status, headers, _) = app.post(&path, Some(&app.bob), form).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/menu-items/{}/", item.id));
        let unchanged = app.store().find_menu_item(item.id).unwrap().unwrap();
        assert_eq!(unchanged.name, "Pizza");

        let (status, headers, _) = app.post(&path, Some(&app.alice), form).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(flash_cookie(&headers).contains("Menu+item+updated+successfully"));
        let updated = app.store().find_menu_item(item.id).unwrap().unwrap();
        assert_eq!(updated.name, "Calzone");
        assert_eq!(updated.price, BigDecimal::from(30));
        assert_eq!(updated.restaurant_id, restaurant.id);
    }

    #[tokio::test]
    async fn test_invalid_update_rerenders_form() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let item = app.menu_item(&app.alice, restaurant.id, "Pizza");
        let (status, _, body) = app
            .post(
                &format!("/menu-items/{}/update/", item.id),
                Some(&app.alice),
                "name=Pizza&description=Delicious+pizza&price=-1.00",
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("invalid-feedback"));
        assert!(body.contains(r#"value="-1.00""#));
        assert!(body.contains("Trattoria"));
        let stored = app.store().find_menu_item(item.id).unwrap();
        assert_eq!(stored, Some(item));
    }

    #[tokio::test]
    async fn test_edit_and_delete_pages_are_gated() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let item = app.menu_item(&app.alice, restaurant.id, "Pizza");
        let detail = format!("/menu-items/{}/", item.id);

        for (action, message) in [("update", "edit+this+item"), ("delete", "delete+this+item")] {
            let path = format!("/menu-items/{}/{action}/", item.id);

            let (status, headers, _) = app.get(&path, Some(&app.bob)).await;
            assert_eq!(status, StatusCode::SEE_OTHER);
            assert_eq!(location(&headers), detail);
            let flash = flash_cookie(&headers);
            assert!(flash.starts_with("flash=level=warning"));
            assert!(flash.contains(message));

            let (status, headers, _) = app.get(&path, None).await;
            assert_eq!(status, StatusCode::SEE_OTHER);
            assert!(location(&headers).starts_with("/accounts/login/?next="));

            let (status, _, _) = app.get(&path, Some(&app.alice)).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_gates_run_before_body_is_parsed() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let item = app.menu_item(&app.alice, restaurant.id, "Pizza");
        let create = format!("/restaurants/{}/menu/create/", restaurant.id);
        let update = format!("/menu-items/{}/update/", item.id);

        let (status, headers, _) = app.post_as(&create, None, Some("text/plain"), PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/accounts/login/?next="));

        let (status, headers, _) = app.post_as(&create, Some(&app.bob), None, PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/restaurants/{}/", restaurant.id));

        let (status, headers, _) = app.post_as(&update, Some(&app.bob), None, PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/menu-items/{}/", item.id));
        assert!(flash_cookie(&headers).contains("edit+this+item"));

        let (status, headers, _) = app.post_as(&update, None, Some("text/plain"), PIZZA).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/accounts/login/?next="));

        let (status, _, _) = app
            .post_as(&update, Some(&app.alice), Some("application/json"), "{}")
            .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(app.store().find_menu_item(item.id).unwrap(), Some(item));
        assert_eq!(app.store().list_menu_items(restaurant.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_to_restaurant() {
        let app = TestApp::new();
        let restaurant = app.restaurant(&app.alice, "Trattoria");
        let item = app.menu_item(&app.alice, restaurant.id, "Pizza");
        let path = format!("/menu-items/{}/delete/", item.id);

        let (status, headers, _) = app.post(&path, Some(&app.bob), "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/menu-items/{}/", item.id));
        assert!(app.store().find_menu_item(item.id).unwrap().is_some());

        let (status, _, body) = app.get(&path, Some(&app.alice)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Pizza - Trattoria"));

        let (status, headers, _) = app.post(&path, Some(&app.alice), "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), format!("/restaurants/{}/", restaurant.id));
        assert!(app.store().find_menu_item(item.id).unwrap().is_none());
    }
}
