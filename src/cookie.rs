//! `Set-Cookie` directive builder.
//!
//! Defaults are the safe ones: `Secure`, `HttpOnly`, `SameSite=lax`, `Path=/`
//! and a one-week lifetime.

use std::fmt;

/// Lifetime used when neither `max_age` nor `expires` is given: one week.
pub const DEFAULT_MAX_AGE: u64 = 604_800;

/// A cookie to send with the response.
///
/// ```rust
/// use lamina::Cookie;
///
/// let c = Cookie::new("foo", "bar");
/// assert_eq!(c.to_string(), "foo=bar;Secure;HttpOnly;Max-Age=604800;SameSite=lax;Path=/;");
///
/// let c = Cookie::new("theme", "dark").http_only(false).max_age(60);
/// assert_eq!(c.to_string(), "theme=dark;Secure;Max-Age=60;SameSite=lax;Path=/;");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Cookie {
    key: String,
    value: String,
    max_age: Option<u64>,
    expires: Option<String>,
    secure: bool,
    http_only: bool,
    domain: Option<String>,
    same_site: String,
    path: String,
}

impl Cookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            secure: true,
            http_only: true,
            domain: None,
            same_site: "lax".to_owned(),
            path: "/".to_owned(),
        }
    }

    /// Lifetime in seconds. Takes precedence over [`expires`](Self::expires).
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// An HTTP date, e.g. `"Wed, 21 Oct 2026 07:28:00 GMT"`.
    pub fn expires(mut self, date: impl Into<String>) -> Self {
        self.expires = Some(date.into());
        self
    }

    pub fn secure(mut self, on: bool) -> Self {
        self.secure = on;
        self
    }

    pub fn http_only(mut self, on: bool) -> Self {
        self.http_only = on;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = same_site.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn value(&self) -> &str { &self.value }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={};", self.key, self.value)?;
        if self.secure {
            f.write_str("Secure;")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "Domain={domain};")?;
        }
        if self.http_only {
            f.write_str("HttpOnly;")?;
        }
        match (self.max_age, &self.expires) {
            (Some(age), _)     => write!(f, "Max-Age={age};")?,
            (None, Some(date)) => write!(f, "Expires={date};")?,
            (None, None)       => write!(f, "Max-Age={DEFAULT_MAX_AGE};")?,
        }
        write!(f, "SameSite={};Path={};", self.same_site, self.path)
    }
}
