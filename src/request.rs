//! Incoming request type: a read-only view over one platform event.
//!
//! Everything here is derived on demand from the [`Event`], so asking twice
//! gives the same answer. The one derived value the rest of the framework
//! cares about is [`Request::target_path`], the key the
//! [`Router`](crate::Router) looks handlers up by.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Namespaces;
use crate::error::Error;
use crate::event::{Event, Record};
use crate::method::Method;

/// Extensions recognised at the end of a path. Anything else after a dot is
/// treated as part of the value.
pub const FILE_EXTENSIONS: &[&str] = &[
    "js", "json", "html", "xml", "rss",
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "tiff",
    "css",
    "woff", "woff2", "ttf", "otf", "eot",
    "mp3", "wav", "ogg", "aac", "flac",
    "mp4", "webm", "mov", "avi",
    "pdf", "csv", "txt", "md", "doc", "docx", "xls", "xlsx",
    "zip", "tar", "gz", "rar", "7z",
    "exe", "apk", "dmg", "app", "deb", "rpm",
    "php", "asp", "aspx", "jsp", "cgi", "pl", "py",
    "map", "wasm", "manifest", "appcache", "htaccess",
    "yaml", "yml", "toml", "ini",
];

/// Value of `source` on scheduled EventBridge events.
const SCHEDULED_SOURCE: &str = "aws.events";

static TABLE_FROM_ARN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":table/([-\w]+)/stream/").expect("static regex"));

/// What kind of platform event a request wraps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EventType {
    ApiGateway,
    Storage,
    AuthTrigger,
    Scheduled,
    ChangeStream,
    Email,
    /// A record source lamina has no dedicated namespace for.
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ApiGateway   => "aws:apigateway",
            Self::Storage      => "aws:s3",
            Self::AuthTrigger  => "aws:cognito",
            Self::Scheduled    => "aws:cloudwatch:events",
            Self::ChangeStream => "aws:dynamodb",
            Self::Email        => "aws:ses",
            Self::Other(s)     => s,
        }
    }

    fn from_source(source: &str) -> Self {
        match source {
            "aws:s3"       => Self::Storage,
            "aws:dynamodb" => Self::ChangeStream,
            "aws:ses"      => Self::Email,
            "aws:cognito"  => Self::AuthTrigger,
            other          => Self::Other(other.to_owned()),
        }
    }
}

/// A decoded request body.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

/// An incoming event, classified and ready for routing.
#[derive(Clone, Debug)]
pub struct Request {
    event: Event,
    namespaces: Namespaces,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub fn new(event: Event) -> Self {
        Self::with_namespaces(event, Namespaces::default())
    }

    pub fn with_namespaces(event: Event, namespaces: Namespaces) -> Self {
        Self { event, namespaces, params: HashMap::new() }
    }

    pub fn event(&self) -> &Event { &self.event }
    pub fn records(&self) -> &[Record] { &self.event.records }
    pub fn is_base64_encoded(&self) -> bool { self.event.is_base64_encoded }

    fn first_record(&self) -> Option<&Record> {
        self.event.records.first()
    }

    // ── Classification ────────────────────────────────────────────────────────

    /// Classifies the event. First match wins: a record source, a Cognito
    /// user pool, the scheduled-event marker, then API Gateway.
    pub fn event_type(&self) -> EventType {
        if let Some(source) = self.first_record().and_then(|r| r.event_source.as_deref()) {
            return EventType::from_source(source);
        }
        if self.event.user_pool_id.is_some() {
            return EventType::AuthTrigger;
        }
        if self.event.source.as_deref() == Some(SCHEDULED_SOURCE) {
            return EventType::Scheduled;
        }
        EventType::ApiGateway
    }

    // ── HTTP API ──────────────────────────────────────────────────────────────

    /// The raw verb string, e.g. `"GET"`.
    pub fn method_str(&self) -> Option<&str> {
        self.event.request_context.as_ref()?.http.as_ref()?.method.as_deref()
    }

    pub fn method(&self) -> Option<Method> {
        self.method_str()?.parse().ok()
    }

    /// The route key with a bare `/` rewritten to `/index`. A missing route
    /// key is treated as `$default`.
    pub fn route_key(&self) -> Cow<'_, str> {
        let Some(key) = self.event.route_key.as_deref() else {
            return Cow::Borrowed("$default");
        };
        match key.split_once(' ') {
            Some((verb, "/")) => Cow::Owned(format!("{verb} /index")),
            _ => Cow::Borrowed(key),
        }
    }

    /// The path half of the route key, untouched: `"/user/{userid}"`.
    pub fn route_key_no_method(&self) -> Option<String> {
        self.route_key().split_once(' ').map(|(_, path)| path.to_owned())
    }

    /// The route with path-parameter braces stripped and segments joined by
    /// `_`, minus any trailing extension: `"GET /user/{userid}"` gives
    /// `"user_userid"`.
    pub fn api_gateway_route_key(&self) -> String {
        let key = self.route_key();
        let path = key.split_once(' ').map_or(&*key, |(_, p)| p);

        let joined = path
            .split('/')
            .skip(1)
            .map(|part| {
                let part = part.replace('<', "{").replace('>', "}");
                if part.len() > 2 && part.starts_with('{') && part.ends_with('}') {
                    part[1..part.len() - 1].to_owned()
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join("_");

        match joined.rfind('.') {
            Some(dot) if dot > 0 => joined[..dot].to_owned(),
            _ => joined,
        }
    }

    pub fn stage(&self) -> Option<&str> {
        self.event.request_context.as_ref()?.stage.as_deref()
    }

    pub fn raw_path(&self) -> Option<&str> {
        self.event.raw_path.as_deref()
    }

    /// The raw path with the first `/{stage}` removed: `"/dev/page"` gives `"/page"`.
    pub fn raw_path_no_stage(&self) -> Option<String> {
        let raw = self.raw_path()?;
        Some(match self.stage() {
            Some(stage) => raw.replacen(&format!("/{stage}"), "", 1),
            None => raw.to_owned(),
        })
    }

    // ── Routing ───────────────────────────────────────────────────────────────

    /// The handler lookup key for this event, always lower-case.
    ///
    /// | Event | Target |
    /// |---|---|
    /// | `GET /users/{id}` | `apigateway/users_id` |
    /// | `$default` route | `$default` |
    /// | S3 | `s3/{bucket}` |
    /// | Cognito | `cognito/{triggerSource}` |
    /// | Scheduled | `crons/{cronFileName}` |
    /// | DynamoDB stream | `streams/{table}` |
    /// | SES | `ses/incoming` |
    pub fn target_path(&self) -> String {
        let ns = &self.namespaces;
        let path = match self.event_type() {
            EventType::ApiGateway => {
                if self.route_key() == "$default" {
                    "$default".to_owned()
                } else {
                    format!("{}/{}", ns.api_gateway, self.api_gateway_route_key())
                }
            }
            EventType::Storage => {
                let bucket = self
                    .first_record()
                    .and_then(|r| r.s3.as_ref())
                    .map_or("", |s3| s3.bucket.name.as_str());
                format!("{}/{bucket}", ns.storage)
            }
            EventType::AuthTrigger => {
                format!("{}/{}", ns.auth_trigger, self.event.trigger_source.as_deref().unwrap_or_default())
            }
            EventType::Scheduled => {
                format!("{}/{}", ns.scheduled, self.event.cron_file_name.as_deref().unwrap_or_default())
            }
            EventType::ChangeStream => format!("{}/{}", ns.change_stream, self.stream_table()),
            EventType::Email => format!("{}/incoming", ns.email),
            EventType::Other(source) => {
                format!("{}/{}", ns.other, source.trim_start_matches("aws:"))
            }
        };
        path.to_lowercase()
    }

    /// Table name from the first record's stream ARN, empty when it has none.
    pub fn stream_table(&self) -> &str {
        self.first_record()
            .and_then(|r| r.event_source_arn.as_deref())
            .and_then(|arn| TABLE_FROM_ARN.captures(arn))
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str())
    }

    /// Final `_`-separated piece of the target path, namespace removed.
    fn last_target_segment(&self) -> String {
        let target = self.target_path();
        let last = target.rsplit('_').next().unwrap_or_default();
        let prefix = format!("{}/", self.namespaces.api_gateway.to_lowercase());
        last.strip_prefix(&prefix).unwrap_or(last).to_owned()
    }

    /// Named capture from a pattern route such as `s3/{bucket}`.
    pub fn route_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    // ── Parameters ────────────────────────────────────────────────────────────

    /// Path parameters. When the parameter in the last path segment ends in a
    /// recognised file extension, the extension is dropped:
    /// `{"id": "42.json"}` gives `{"id": "42"}`, `{"id": "4.2"}` stays.
    pub fn path_parameters(&self) -> HashMap<String, String> {
        let Some(params) = &self.event.path_parameters else {
            return HashMap::new();
        };
        let last = self.last_target_segment();
        params
            .iter()
            .map(|(name, value)| {
                let value = match value.rsplit_once('.') {
                    Some((stem, ext)) if name.eq_ignore_ascii_case(&last) && is_file_extension(ext) => stem,
                    _ => value.as_str(),
                };
                (name.clone(), value.to_owned())
            })
            .collect()
    }

    pub fn path_parameter(&self, name: &str) -> Option<String> {
        self.path_parameters().remove(name)
    }

    pub fn query_parameters(&self) -> HashMap<String, String> {
        self.event.query_string_parameters.clone().unwrap_or_default()
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.event.query_string_parameters.as_ref()?.get(name).map(String::as_str)
    }

    /// The trailing extension of the raw path, when it is a recognised one:
    /// `"/page/foo.json"` gives `Some("json")`.
    pub fn file_extension(&self) -> Option<&str> {
        let (_, ext) = self.raw_path()?.rsplit_once('.')?;
        is_file_extension(ext).then_some(ext)
    }

    // ── Headers & cookies ─────────────────────────────────────────────────────

    /// All headers, names forced to lower case.
    pub fn headers(&self) -> HashMap<String, String> {
        self.event
            .headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.event
            .headers
            .as_ref()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookies sent with the request. Entries without `=` are ignored.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.event
            .cookies
            .iter()
            .flatten()
            .filter_map(|c| c.split_once('='))
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    /// A single cookie. When the name repeats, the last value wins, as in
    /// [`Request::cookies`].
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.event
            .cookies
            .as_ref()?
            .iter()
            .filter_map(|c| c.split_once('='))
            .filter(|(k, _)| *k == name)
            .last()
            .map(|(_, v)| v)
    }

    /// Double-submit check: the `csrf` cookie and the `x-csrf` header are
    /// both present, non-empty and identical.
    pub fn is_valid_csrf(&self) -> bool {
        match (self.cookie("csrf"), self.header("x-csrf")) {
            (Some(cookie), Some(header)) => !cookie.is_empty() && cookie == header,
            _ => false,
        }
    }

    // ── Body ──────────────────────────────────────────────────────────────────

    /// The request body. `None` when absent or empty. Parsed as JSON only
    /// when `content-type` is exactly `application/json`; a body that fails
    /// to parse is a validation error.
    pub fn body(&self) -> Result<Option<Body>, Error> {
        let Some(raw) = self.event.body.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(None);
        };
        if self.header("content-type") == Some("application/json") {
            let value = serde_json::from_str(raw)
                .map_err(|e| Error::validation(format!("Request body must be valid JSON: {e}.")))?;
            return Ok(Some(Body::Json(value)));
        }
        Ok(Some(Body::Text(raw.to_owned())))
    }

    /// The body deserialized into `T`, whatever the content type says.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        let Some(raw) = self.event.body.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| Error::validation(format!("Request body must be valid JSON: {e}.")))
    }
}

fn is_file_extension(ext: &str) -> bool {
    FILE_EXTENSIONS.contains(&ext)
}
