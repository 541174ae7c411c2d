//! Outgoing response accumulator and the platform [`Reply`] it turns into.
//!
//! A [`Response`] is handed to the handler as `&mut`. The handler sets what it
//! needs; the dispatcher calls [`Response::done`] once at the end. `done`
//! takes `self`, so a response cannot be touched after it has been sent.

use std::time::Duration;

use http::StatusCode;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio::time::Instant;

use crate::cookie::Cookie;
use crate::csp::Csp;
use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for [`Response::set_content_type`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Csv,          // text/csv
    Html,         // text/html
    Javascript,   // text/javascript
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Svg,          // image/svg+xml
    Text,         // text/plain
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Csv         => "text/csv",
            Self::Html        => "text/html",
            Self::Javascript  => "text/javascript",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain",
            Self::Xml         => "application/xml",
        }
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self { ct.as_str().to_owned() }
}

// ── Timers ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Timer {
    name: String,
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

// ── Response ──────────────────────────────────────────────────────────────────

/// The response being built for one invocation.
///
/// ```rust
/// use lamina::{Cookie, Response};
/// use http::StatusCode;
///
/// let mut res = Response::new();
/// res.set_status(StatusCode::OK)
///    .set_body(r#"{"ok":true}"#)
///    .cookie(Cookie::new("session", "abc"));
///
/// let reply = res.done();
/// assert_eq!(reply.status_code, 200);
/// assert_eq!(reply.header("content-type"), Some("application/json"));
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    body: Option<String>,
    content_type: String,
    location: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    timers: Vec<Timer>,
    cache_max_age: Option<u64>,
    base64: bool,
    csp: Option<Csp>,
}

impl Response {
    /// A fresh response: status 500 until a handler says otherwise,
    /// content type `application/json`.
    pub fn new() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
            content_type: ContentType::Json.into(),
            location: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            timers: Vec::new(),
            cache_max_age: None,
            base64: false,
            csp: None,
        }
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode { self.status }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn body(&self) -> Option<&str> { self.body.as_deref() }

    /// Serializes `value` as the body.
    pub fn json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, Error> {
        self.body = Some(serde_json::to_string(value)?);
        Ok(self)
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = content_type.into();
        self
    }

    pub fn content_type(&self) -> &str { &self.content_type }

    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.location = Some(location.into());
        self
    }

    pub fn location(&self) -> Option<&str> { self.location.as_deref() }

    // ── Cookies ───────────────────────────────────────────────────────────────

    /// Adds a `Set-Cookie`. Any number may be set; each is sent on its own.
    pub fn cookie(&mut self, cookie: Cookie) -> &mut Self {
        self.cookies.push(cookie.to_string());
        self
    }

    /// Rendered `Set-Cookie` values, in the order they were added.
    pub fn cookies(&self) -> &[String] { &self.cookies }

    /// Sets the `csrf` cookie used by the double-submit check.
    pub fn csrf(&mut self, token: impl Into<String>) -> &mut Self {
        self.cookie(Cookie::new("csrf", token).same_site("Strict"))
    }

    // ── Headers ───────────────────────────────────────────────────────────────

    /// Sets a header, replacing any with the same name (case-insensitive).
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Adds a header without touching existing ones.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    pub fn set_cache_header(&mut self, max_age: u64) -> &mut Self {
        self.cache_max_age = Some(max_age);
        self
    }

    pub fn cache_header(&self) -> Option<u64> { self.cache_max_age }

    pub fn set_base64_encoded(&mut self, on: bool) -> &mut Self {
        self.base64 = on;
        self
    }

    pub fn is_base64_encoded(&self) -> bool { self.base64 }

    pub fn set_csp(&mut self, csp: impl Into<Csp>) -> &mut Self {
        self.csp = Some(csp.into());
        self
    }

    pub fn csp(&self) -> Option<&Csp> { self.csp.as_ref() }

    // ── Timing ────────────────────────────────────────────────────────────────

    /// Starts (or restarts) a named timer for the `server-timing` header.
    pub fn start_timer(&mut self, name: impl Into<String>) -> &mut Self {
        let timer = self.timer_slot(name.into());
        timer.started = Some(Instant::now());
        timer.elapsed = None;
        self
    }

    /// Stops a running timer. Unknown or never-started names are ignored.
    pub fn end_timer(&mut self, name: &str) -> &mut Self {
        if let Some(timer) = self.timers.iter_mut().find(|t| t.name == name) {
            if let Some(started) = timer.started {
                timer.elapsed = Some(started.elapsed());
            }
        }
        self
    }

    /// Records an externally measured duration.
    pub fn timer(&mut self, name: impl Into<String>, elapsed: Duration) -> &mut Self {
        let timer = self.timer_slot(name.into());
        timer.started = None;
        timer.elapsed = Some(elapsed);
        self
    }

    /// Finished timers as `(name, elapsed)`, in the order first started.
    pub fn timings(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.timers.iter().filter_map(|t| Some((t.name.as_str(), t.elapsed?)))
    }

    fn timer_slot(&mut self, name: String) -> &mut Timer {
        let idx = match self.timers.iter().position(|t| t.name == name) {
            Some(idx) => idx,
            None => {
                self.timers.push(Timer { name, started: None, elapsed: None });
                self.timers.len() - 1
            }
        };
        &mut self.timers[idx]
    }

    fn server_timing(&self) -> String {
        self.timings()
            .enumerate()
            .map(|(i, (name, elapsed))| format!("a{i};dur={};desc=\"{name}\",", elapsed.as_millis()))
            .collect()
    }

    // ── Finish ────────────────────────────────────────────────────────────────

    /// Assembles the final reply.
    pub fn done(self) -> Reply {
        let mut headers = Vec::with_capacity(self.headers.len() + self.cookies.len() + 5);

        if !self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            headers.push(("Content-Type".to_owned(), self.content_type.clone()));
        }
        let server_timing = self.server_timing();

        headers.extend(self.headers);
        if let Some(location) = self.location {
            replace_header(&mut headers, "Location", location);
        }
        if let Some(age) = self.cache_max_age {
            replace_header(&mut headers, "Cache-Control", format!("max-age={age}"));
        }
        for cookie in self.cookies {
            headers.push(("Set-Cookie".to_owned(), cookie));
        }
        if !server_timing.is_empty() {
            headers.push(("server-timing".to_owned(), server_timing));
        }
        if let Some(csp) = self.csp.filter(|c| !c.is_empty()) {
            headers.push(("Content-Security-Policy".to_owned(), csp.to_string()));
        }

        Reply {
            status_code: self.status.as_u16(),
            body: self.body,
            headers,
            is_base64_encoded: self.base64,
        }
    }
}

/// Computed headers override user-set ones of the same name.
fn replace_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_owned(), value));
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What goes back to the platform.
///
/// Headers are an ordered multi-map; each cookie is its own `Set-Cookie`
/// entry. Serialized, it takes the HTTP API shape: single-valued `headers`
/// plus a `cookies` array.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status_code: u16,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub is_base64_encoded: bool,
}

impl Reply {
    /// First header with this name, case-insensitive.
    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> impl Iterator<Item = &str> {
        self.header_values("set-cookie")
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("statusCode", &self.status_code)?;
        if let Some(body) = &self.body {
            map.serialize_entry("body", body)?;
        }
        map.serialize_entry("headers", &HeaderObject(&self.headers))?;
        let cookies: Vec<&str> = self.cookies().collect();
        if !cookies.is_empty() {
            map.serialize_entry("cookies", &cookies)?;
        }
        if self.is_base64_encoded {
            map.serialize_entry("isBase64Encoded", &true)?;
        }
        map.end()
    }
}

/// Headers as a JSON object. Repeated names are comma-joined; `Set-Cookie`
/// is left out since it travels in `cookies`.
struct HeaderObject<'a>(&'a [(String, String)]);

impl Serialize for HeaderObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut merged: Vec<(&str, String)> = Vec::new();
        for (name, value) in self.0 {
            if name.eq_ignore_ascii_case("set-cookie") {
                continue;
            }
            match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, joined)) => {
                    joined.push_str(", ");
                    joined.push_str(value);
                }
                None => merged.push((name, value.clone())),
            }
        }
        let mut map = serializer.serialize_map(Some(merged.len()))?;
        for (name, value) in &merged {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
