use axum::{
    Form, Router,
    extract::{Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tavola_restaurant_service::accounts::{AccountError, authenticate};
use tracing::{info, instrument};
use url::Url;

use crate::error::{LOGIN_PATH, WebError};
use crate::session::{login_cookie, logout_cookie};
use crate::views;

use super::{AppState, render};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login))
        .route("/accounts/logout/", post(logout))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub next: String,
}

const LOCAL_HOST: &str = "tavola.invalid";

/// `next` if it is a path on this site, otherwise the home page.
///
/// Browsers read `\` as `/` and drop tabs and newlines, so those are refused
/// outright; what is left must resolve against a fixed origin without leaving it.
fn safe_next(next: &str) -> &str {
    let plain_path = next.starts_with('/')
        && !matches!(next.as_bytes().get(1), Some(b'/' | b'\\'))
        && !next.chars().any(|c| c == '\\' || c.is_control());
    let same_origin = Url::parse(&format!("http://{LOCAL_HOST}/"))
        .and_then(|base| base.join(next))
        .is_ok_and(|url| url.host_str() == Some(LOCAL_HOST));
    if plain_path && same_origin { next } else { "/" }
}

#[instrument(skip_all)]
pub async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    headers: HeaderMap,
) -> Response {
    let session = state.session(&headers);
    render(
        &headers,
        session.as_ref(),
        "Log in",
        views::login_form("", &query.next, None),
    )
}

#[instrument(skip_all, fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, WebError> {
    let user = match authenticate(state.service.store(), &payload.username, &payload.password) {
        Ok(user) => user,
        Err(AccountError::InvalidCredentials) => {
            info!("login rejected");
            let body = views::login_form(
                &payload.username,
                &payload.next,
                Some("Please enter a correct username and password."),
            );
            return Ok(render(&headers, None, "Log in", body));
        }
        Err(err) => return Err(WebError::Internal(err.to_string())),
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| WebError::Internal(e.to_string()))?;
    info!(user_id = %user.id, "logged in");
    Ok((
        AppendHeaders([(
            SET_COOKIE,
            login_cookie(&token, state.tokens.access_token_expires),
        )]),
        Redirect::to(safe_next(&payload.next)),
    )
        .into_response())
}

#[instrument(skip_all)]
pub async fn logout() -> Response {
    (
        AppendHeaders([(SET_COOKIE, logout_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{TestApp, location};
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next("/restaurants/create/"), "/restaurants/create/");
        assert_eq!(safe_next(""), "/");
        assert_eq!(safe_next("//evil.example/"), "/");
        assert_eq!(safe_next("https://evil.example/"), "/");
        assert_eq!(safe_next("/\\evil.example"), "/");
        assert_eq!(safe_next("/\t/evil.example"), "/");
        assert_eq!(safe_next("/menu-items/3/?tab=photo"), "/menu-items/3/?tab=photo");
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie_and_follows_next() {
        let app = TestApp::new();
        let (status, _, body) = app
            .get("/accounts/login/?next=%2Frestaurants%2Fcreate%2F", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"name="next" value="/restaurants/create/""#));

        let (status, headers, _) = app
            .post(
                "/accounts/login/",
                None,
                "username=alice&password=testpass123&next=%2Frestaurants%2Fcreate%2F",
            )
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/restaurants/create/");
        let cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));

        let session = cookie.split(';').next().unwrap();
        let (status, _, _) = app.get("/restaurants/create/", Some(session)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_ignores_backslash_next() {
        let app = TestApp::new();
        let (status, headers, _) = app
            .post(
                "/accounts/login/",
                None,
                "username=alice&password=testpass123&next=%2F%5Cevil.example",
            )
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/");
    }

    #[tokio::test]
    async fn test_wrong_password_rerenders_form() {
        let app = TestApp::new();
        let (status, headers, body) = app
            .post(
                "/accounts/login/",
                None,
                "username=alice&password=wrong&next=%2F%2Fevil.example",
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(body.contains("Please enter a correct username and password."));
        assert!(body.contains(r#"value="alice""#));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = TestApp::new();
        let (status, headers, _) = app.post("/accounts/logout/", Some(&app.alice), "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/");
        let cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session=;") && cookie.contains("Max-Age=0"));
    }
}
