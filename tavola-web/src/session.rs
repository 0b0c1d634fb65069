use axum::http::{HeaderMap, header};
use chrono::TimeDelta;
use tavola_restaurant_service::accounts::{Session, TokenKeys};
use tavola_restaurant_service::store::Store;
use tracing::warn;

pub const SESSION_COOKIE: &str = "session";

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The signed-in user, if the request carries a valid token for a user that
/// still exists. Anything else is an anonymous request.
pub fn current_session(
    headers: &HeaderMap,
    tokens: &TokenKeys,
    store: &dyn Store,
) -> Option<Session> {
    let token = bearer_token(headers).or_else(|| cookie(headers, SESSION_COOKIE))?;
    let session = tokens.verify(token).ok()?;
    match store.find_user(session.user_id.0) {
        Ok(Some(_)) => Some(session),
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "cannot resolve session user");
            None
        }
    }
}

pub fn login_cookie(token: &str, expires: TimeDelta) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        expires.num_seconds()
    )
}

pub fn logout_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tavola_restaurant_service::accounts::register;
    use tavola_restaurant_service::store::MemoryStore;

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; flash=x"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=abc"));
        assert_eq!(cookie(&headers, "a"), Some("1"));
        assert_eq!(cookie(&headers, "flash"), Some("x"));
        assert_eq!(cookie(&headers, "session"), Some("abc"));
        assert_eq!(cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_current_session_from_cookie_or_bearer() {
        let store = MemoryStore::new();
        let user = register(&store, "alice", "secret").unwrap();
        let tokens = TokenKeys::new("test-secret", TimeDelta::hours(1));
        let token = tokens.issue(&user).unwrap();

        let mut by_cookie = HeaderMap::new();
        by_cookie.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("session={token}")).unwrap(),
        );
        let session = current_session(&by_cookie, &tokens, &store).unwrap();
        assert_eq!(session.user_id, user.user_id());

        let mut by_bearer = HeaderMap::new();
        by_bearer.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(current_session(&by_bearer, &tokens, &store).is_some());
    }

    #[test]
    fn test_unknown_user_is_anonymous() {
        let issuing_store = MemoryStore::new();
        let user = register(&issuing_store, "ghost", "secret").unwrap();
        let tokens = TokenKeys::new("test-secret", TimeDelta::hours(1));
        let token = tokens.issue(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("session={token}")).unwrap(),
        );
        assert!(current_session(&headers, &tokens, &MemoryStore::new()).is_none());
        assert!(current_session(&HeaderMap::new(), &tokens, &issuing_store).is_none());
    }
}
