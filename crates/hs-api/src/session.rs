//! # Session cookie
//!
//! The server keeps no sessions. After login the user object is handed back
//! to the browser in the `hostel_current_user` cookie (base64url JSON) and read
//! back on every page request by the [`CurrentUser`] extractor.

use std::future::{ready, Ready};

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hs_core::models::SessionUser;
use hs_core::AppError;
use tracing::debug;

pub const SESSION_COOKIE: &str = "hostel_current_user";

pub fn encode(user: &SessionUser) -> serde_json::Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(user)?))
}

/// Anything that does not decode is treated as no user at all.
pub fn decode(raw: &str) -> Option<SessionUser> {
    let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn session_cookie(user: &SessionUser) -> serde_json::Result<Cookie<'static>> {
    Ok(Cookie::build(SESSION_COOKIE, encode(user)?)
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true)
        .finish())
}

/// Cookie handed out after a successful login, by the JSON API and the form alike.
pub fn login_cookie(user: &SessionUser) -> Result<Cookie<'static>, AppError> {
    session_cookie(user).map_err(|e| AppError::Internal(format!("encoding session: {e}")))
}

pub fn clear_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .max_age(Duration::ZERO)
        .finish()
}

/// The user presented by the request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
    pub fn get(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.cookie(SESSION_COOKIE).and_then(|cookie| {
            let user = decode(cookie.value());
            if user.is_none() {
                debug!("ignoring malformed session cookie");
            }
            user
        });
        ready(Ok(CurrentUser(user)))
    }
}
