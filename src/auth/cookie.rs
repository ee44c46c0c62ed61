use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::Config;

pub const SESSION_COOKIE: &str = "token";

/// HttpOnly session cookie carrying the JWT. Cross-site (SameSite=None)
/// requires Secure, so insecure dev setups fall back to Lax.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    let same_site = if config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site)
        .max_age(time::Duration::seconds(config.jwt_ttl_secs))
        .build()
}

/// Removal cookie; path must match the one used when setting it.
pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = Config::for_tests();
        config.cookie_secure = true;
        let cookie = session_cookie("jwt".into(), &config);

        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "jwt");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(config.jwt_ttl_secs))
        );
    }

    #[test]
    fn test_insecure_cookie_uses_lax() {
        let config = Config::for_tests();
        let cookie = session_cookie("jwt".into(), &config);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
    }
}
