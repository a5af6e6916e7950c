//! Refresh-token cookie transport.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use galaxy_core::config::AppConfig;

/// Path the refresh cookie is scoped to.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Builds, reads and clears the refresh cookie.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    name: String,
    secure: bool,
}

impl RefreshCookie {
    /// Cookie settings from configuration. `Secure` is set in production.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.auth.refresh_cookie_name.clone(),
            secure: config.is_production(),
        }
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the cookie to `token`, living until `expires_at`.
    pub fn set(&self, jar: CookieJar, token: String, expires_at: DateTime<Utc>) -> CookieJar {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        let cookie = Cookie::build((self.name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path(REFRESH_COOKIE_PATH)
            .max_age(time::Duration::seconds(max_age))
            .build();
        jar.add(cookie)
    }

    /// The presented refresh token, if any.
    pub fn get(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Expires the cookie on the client.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(
            Cookie::build((self.name.clone(), ""))
                .path(REFRESH_COOKIE_PATH)
                .build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cookie_attributes() {
        let cookie = RefreshCookie {
            name: "refresh_token".into(),
            secure: true,
        };
        let jar = cookie.set(
            CookieJar::new(),
            "abc".into(),
            Utc::now() + Duration::days(30),
        );
        let c = jar.get("refresh_token").unwrap();
        assert_eq!(c.value(), "abc");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Strict));
        assert_eq!(c.path(), Some(REFRESH_COOKIE_PATH));
        let max_age = c.max_age().unwrap().whole_seconds();
        assert!(max_age > 29 * 86_400 && max_age <= 30 * 86_400);
        assert_eq!(cookie.get(&jar).as_deref(), Some("abc"));
    }
}
