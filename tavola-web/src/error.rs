use axum::{
    http::{StatusCode, Uri, header::SET_COOKIE},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use tavola_restaurant_service::FlowError;
use tracing::error;
use url::form_urlencoded;

use crate::flash::Flash;
use crate::views::{self, Chrome};

pub const LOGIN_PATH: &str = "/accounts/login/";

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("login required for {next}")]
    LoginRequired { next: String },
    #[error("not found")]
    NotFound,
    #[error("denied: {message}")]
    Denied {
        redirect_to: String,
        message: &'static str,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// Maps a failed flow to its response. `redirect_to` is where a denied
    /// user is sent, with `message` as a warning.
    pub fn from_flow(
        err: FlowError,
        uri: &Uri,
        redirect_to: impl Into<String>,
        message: &'static str,
    ) -> Self {
        match err {
            FlowError::NotAuthenticated => WebError::LoginRequired {
                next: uri.path().to_string(),
            },
            FlowError::RecordNotFound => WebError::NotFound,
            FlowError::NotAuthorized => WebError::Denied {
                redirect_to: redirect_to.into(),
                message,
            },
            FlowError::ValidationFailed(errors) => {
                WebError::Internal(format!("unhandled validation failure on {} field(s)", errors.len()))
            }
            FlowError::Store(err) => WebError::Internal(err.to_string()),
        }
    }
}

/// Error for flows that cannot be denied, only fail.
impl From<FlowError> for WebError {
    fn from(err: FlowError) -> Self {
        WebError::from_flow(err, &Uri::from_static("/"), "/", "")
    }
}

pub fn login_url(next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

fn page(status: StatusCode, title: &str, body: String) -> Response {
    let chrome = Chrome {
        session: None,
        flash: None,
    };
    (status, Html(views::layout(&chrome, title, &body))).into_response()
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            WebError::NotFound => page(StatusCode::NOT_FOUND, "Not found", views::not_found()),
            WebError::Denied {
                redirect_to,
                message,
            } => (
                AppendHeaders([(SET_COOKIE, Flash::warning(message).set_cookie())]),
                Redirect::to(&redirect_to),
            )
                .into_response(),
            WebError::Internal(reason) => {
                error!(%reason, "request failed");
                page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    views::server_error(),
                )
            }
        }
    }
}
