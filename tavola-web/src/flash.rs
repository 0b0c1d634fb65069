//! One-shot user messages carried across a redirect in a cookie.

use axum::http::HeaderMap;
use url::form_urlencoded;

use crate::session::cookie;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Warning => "warning",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    /// Reads the pending message, if any. The caller clears it with
    /// [`Flash::clear_cookie`] once it has been shown.
    pub fn take(headers: &HeaderMap) -> Option<Self> {
        let raw = cookie(headers, FLASH_COOKIE)?;
        let mut level = None;
        let mut message = None;
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "level" => {
                    level = match value.as_ref() {
                        "success" => Some(Level::Success),
                        "warning" => Some(Level::Warning),
                        _ => None,
                    }
                }
                "message" => message = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            level: level?,
            message: message.filter(|m| !m.is_empty())?,
        })
    }

    pub fn set_cookie(&self) -> String {
        let value = form_urlencoded::Serializer::new(String::new())
            .append_pair("level", self.level.as_str())
            .append_pair("message", &self.message)
            .finish();
        format!("{FLASH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
    }

    pub fn clear_cookie() -> String {
        format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}
