//! Cookie helpers for the session token and one-shot flash messages.

use axum::http::{header, HeaderMap, HeaderValue};

use super::AuthConfig;

/// Cookie carrying a one-shot flash message for the next page view
pub const FLASH_COOKIE: &str = "inventario_flash";

/// Finds the value of cookie `name` across every `Cookie` header
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
        .filter(|value| !value.is_empty())
}

fn cookie_header(
    name: &str,
    value: &str,
    max_age: Option<u64>,
    secure: bool,
) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/");
    if let Some(secs) = max_age {
        cookie.push_str(&format!("; Max-Age={secs}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that stores the session token
pub fn session_cookie(config: &AuthConfig, token: &str) -> Option<HeaderValue> {
    cookie_header(
        &config.cookie_name,
        token,
        Some(config.session_ttl.as_secs()),
        config.cookie_secure,
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(config: &AuthConfig) -> Option<HeaderValue> {
    cookie_header(&config.cookie_name, "deleted", Some(0), config.cookie_secure)
}

/// `Set-Cookie` value carrying `message` to the next page view.
///
/// Cookie values cannot hold spaces or non-ASCII text, so the message is
/// hex encoded.
pub fn flash_cookie(message: &str) -> Option<HeaderValue> {
    cookie_header(FLASH_COOKIE, &hex::encode(message), None, false)
}

pub fn clear_flash_cookie() -> Option<HeaderValue> {
    cookie_header(FLASH_COOKIE, "deleted", Some(0), false)
}

/// Reads and decodes the pending flash message, if any
pub fn read_flash(headers: &HeaderMap) -> Option<String> {
    let raw = parse_cookie(headers, FLASH_COOKIE)?;
    let bytes = hex::decode(raw).ok()?;
    String::from_utf8(bytes).ok()
}
