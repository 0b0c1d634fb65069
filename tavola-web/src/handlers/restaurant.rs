use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use tavola_restaurant_service::{FlowError, forms::RestaurantForm};
use tracing::instrument;

use crate::error::WebError;
use crate::flash::Flash;
use crate::views;

use super::{AppState, identity, parse_id, redirect_with, render};

const LIST_PATH: &str = "/restaurants/";
const CREATE_PATH: &str = "/restaurants/create/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(list_restaurants))
        .route(CREATE_PATH, get(create_form).post(create_restaurant))
        .route("/restaurants/{id}/", get(get_restaurant))
        .route(
            "/restaurants/{id}/update/",
            get(update_form).post(update_restaurant),
        )
        .route(
            "/restaurants/{id}/delete/",
            get(confirm_delete).post(delete_restaurant),
        )
}

pub fn detail_path(id: i64) -> String {
    format!("/restaurants/{id}/")
}

#[instrument(skip_all)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let session = state.session(&headers);
    let restaurants = state.service.list_restaurants()?;
    let body = views::restaurant_list(&restaurants, session.is_some());
    Ok(render(&headers, session.as_ref(), "Restaurants", body))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn get_restaurant(
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
    let title = page.restaurant.to_string();
    Ok(render(
        &headers,
        session.as_ref(),
        &title,
        views::restaurant_detail(&page, is_owner),
    ))
}

#[instrument(skip_all)]
pub async fn create_form(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let session = state.session(&headers);
    state
        .service
        .authorize_create_restaurant(identity(session.as_ref()))
        .map_err(|err| {
            WebError::from_flow(err, &uri, LIST_PATH, "You cannot add restaurants.")
        })?;
    let body = views::restaurant_form("Create", CREATE_PATH, &RestaurantForm::default(), None);
    Ok(render(&headers, session.as_ref(), "New restaurant", body))
}

#[instrument(skip_all)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<RestaurantForm>, FormRejection>,
) -> Result<Response, WebError> {
    let session = state.session(&headers);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            state
                .service
                .authorize_create_restaurant(identity(session.as_ref()))
                .map_err(|err| {
                    WebError::from_flow(err, &uri, LIST_PATH, "You cannot add restaurants.")
                })?;
            return Ok(rejection.into_response());
        }
    };
    match state
        .service
        .create_restaurant(identity(session.as_ref()), &form)
    {
        Ok(restaurant) => Ok(redirect_with(
            &detail_path(restaurant.id),
            Flash::success("Restaurant created successfully!"),
        )),
        Err(FlowError::ValidationFailed(errors)) => {
            let body = views::restaurant_form("Create", CREATE_PATH, &form, Some(&errors));
            Ok(render(&headers, session.as_ref(), "New restaurant", body))
        }
        Err(err) => Err(WebError::from_flow(
            err,
            &uri,
            LIST_PATH,
            "You cannot add restaurants.",
        )),
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
    let restaurant = state
        .service
        .authorize_restaurant(identity(session.as_ref()), id)
        .map_err(|err| {
            WebError::from_flow(
                err,
                &uri,
                detail_path(id),
                "You do not have permission to edit this restaurant.",
            )
        })?;
    let body = views::restaurant_form(
        "Update",
        uri.path(),
        &RestaurantForm::from_restaurant(&restaurant),
        None,
    );
    Ok(render(&headers, session.as_ref(), "Edit restaurant", body))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<RestaurantForm>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            state
                .service
                .authorize_restaurant(identity(session.as_ref()), id)
                .map_err(|err| {
                    WebError::from_flow(
                        err,
                        &uri,
                        detail_path(id),
                        "You do not have permission to edit this restaurant.",
                    )
                })?;
            return Ok(rejection.into_response());
        }
    };
    match state
        .service
        .update_restaurant(identity(session.as_ref()), id, &form)
    {
        Ok(restaurant) => Ok(redirect_with(
            &detail_path(restaurant.id),
            Flash::success("Restaurant updated successfully!"),
        )),
        Err(FlowError::ValidationFailed(errors)) => {
            let body = views::restaurant_form("Update", uri.path(), &form, Some(&errors));
            Ok(render(&headers, session.as_ref(), "Edit restaurant", body))
        }
        Err(err) => Err(WebError::from_flow(
            err,
            &uri,
            detail_path(id),
            "You do not have permission to edit this restaurant.",
        )),
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
    let restaurant = state
        .service
        .authorize_restaurant(identity(session.as_ref()), id)
        .map_err(|err| {
            WebError::from_flow(
                err,
                &uri,
                detail_path(id),
                "You do not have permission to delete this restaurant.",
            )
        })?;
    Ok(render(
        &headers,
        session.as_ref(),
        "Delete restaurant",
        views::restaurant_confirm_delete(&restaurant),
    ))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let session = state.session(&headers);
    state
        .service
        .delete_restaurant(identity(session.as_ref()), id)
        .map_err(|err| {
            WebError::from_flow(
                err,
                &uri,
                detail_path(id),
                "You do not have permission to delete this restaurant.",
            )
        })?;
    Ok(redirect_with(
        LIST_PATH,
        Flash::success("Restaurant deleted successfully!"),
    ))
}
