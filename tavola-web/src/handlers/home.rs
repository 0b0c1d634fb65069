use axum::{extract::State, http::HeaderMap, response::Response};
use tracing::instrument;

use crate::views;

use super::{AppState, render};

#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);
    render(&headers, session.as_ref(), "Home", views::home())
}

#[cfg(test)]
mod tests {
    use super::super::tests::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_home_shows_title_and_login_link() {
        let app = TestApp::new();
        let (status, _, body) = app.get("/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Restaurant System</h1>"));
        assert!(body.contains(r#"href="/accounts/login/""#));

        let (_, _, body) = app.get("/", Some(&app.alice)).await;
        assert!(body.contains("Log out"));
    }
}
