pub mod auth;
pub mod home;
pub mod menu_item;
pub mod restaurant;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tavola_restaurant_service::{
    RestaurantService,
    accounts::{Session, TokenKeys},
    models::UserId,
};
use tower_http::trace::TraceLayer;

use crate::error::WebError;
use crate::flash::Flash;
use crate::session::current_session;
use crate::views::{self, Chrome};

#[derive(Clone)]
pub struct AppState {
    pub service: RestaurantService,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn session(&self, headers: &HeaderMap) -> Option<Session> {
        current_session(headers, &self.tokens, self.service.store())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .merge(auth::router())
        .merge(restaurant::router())
        .merge(menu_item::router())
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> WebError {
    WebError::NotFound
}

fn identity(session: Option<&Session>) -> Option<UserId> {
    session.map(|s| s.user_id)
}

/// Path ids that are not integers name no record.
fn parse_id(raw: &str) -> Result<i64, WebError> {
    raw.parse().map_err(|_| WebError::NotFound)
}

/// Wraps `body` in the layout, showing and clearing any pending flash.
fn render(headers: &HeaderMap, session: Option<&Session>, title: &str, body: String) -> Response {
    let flash = Flash::take(headers);
    let chrome = Chrome {
        session,
        flash: flash.as_ref(),
    };
    let page = Html(views::layout(&chrome, title, &body));
    match flash {
        Some(_) => (AppendHeaders([(SET_COOKIE, Flash::clear_cookie())]), page).into_response(),
        None => page.into_response(),
    }
}

fn redirect_with(to: &str, flash: Flash) -> Response {
    (
        AppendHeaders([(SET_COOKIE, flash.set_cookie())]),
        Redirect::to(to),
    )
        .into_response()
}
