use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Generate a cryptographically secure random session token.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Session lifetime, configured in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDuration {
    hours: u64,
}

impl SessionDuration {
    #[must_use]
    pub const fn from_hours(hours: u64) -> Self {
        Self { hours }
    }

    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        (self.hours * 3600) as i64
    }

    /// Expiry timestamp (RFC 3339) for a session created now.
    #[must_use]
    pub fn expires_at(&self) -> String {
        (Utc::now() + Duration::seconds(self.as_seconds())).to_rfc3339()
    }
}

/// `Set-Cookie` value carrying a fresh session token.
#[must_use]
pub fn session_cookie(token: &str, duration: SessionDuration, secure: bool) -> String {
    let max_age = duration.as_seconds();
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
}

/// `Set-Cookie` value that clears the session.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure}")
}

/// Pull the session token out of a `Cookie` header value.
#[must_use]
pub fn session_token_from_cookies(cookies: &str) -> Option<&str> {
    cookies.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        assert_eq!(token1.len(), 64);
        assert_eq!(token2.len(), 64);
        assert_ne!(token1, token2);
        assert!(token1.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_session_duration() {
        assert_eq!(SessionDuration::from_hours(1).as_seconds(), 3600);
        assert_eq!(SessionDuration::from_hours(720).as_seconds(), 2_592_000);
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("abc", SessionDuration::from_hours(1), true);
        assert_eq!(
            cookie,
            "session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600; Secure"
        );
        let cookie = session_cookie("abc", SessionDuration::from_hours(1), false);
        assert!(!cookie.contains("Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_from_cookies() {
        assert_eq!(session_token_from_cookies("theme=dark; session=tok123"), Some("tok123"));
        assert_eq!(session_token_from_cookies("sessionx=nope"), None);
        assert_eq!(session_token_from_cookies("session="), None);
    }
}
