//! Input validation.
//!
//! Every check takes any `Serialize` value and inspects it as JSON, so a
//! field can be validated straight off a deserialized body without knowing
//! its Rust type. `None` and `null` count as absent.
//!
//! Failures are [`ErrorKind::Validation`](crate::ErrorKind::Validation)
//! errors whose message reads `"{subject} {name} {reason}"`:
//!
//! ```rust
//! use lamina::validation::{NumberOptions, Validator};
//!
//! let err = Validator::new().number(&5, &NumberOptions::new().min_value(10.0)).unwrap_err();
//! assert_eq!(err.to_string(), "validateNumber variable must not be less than 10.");
//!
//! let err = Validator::with_subject("UserModel").string(&None::<String>, &Default::default()).unwrap_err();
//! assert_eq!(err.to_string(), "UserModel variable is required.");
//! ```

use std::any::{Any, type_name};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::Error;

/// Largest integer an `f64` holds exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
pub const MIN_SAFE_INTEGER: f64 = -MAX_SAFE_INTEGER;

const DEFAULT_NAME: &str = "variable";
const DEFAULT_MAX_LENGTH: usize = 100_000;
const EMAIL_MAX_LENGTH: usize = 254;
const EMAIL_LOCAL_MAX_LENGTH: usize = 64;
const EMAIL_LABEL_MAX_LENGTH: usize = 63;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-!#$%&'*+/0-9=?A-Z^_a-z{|}~](\.?[-!#$%&'*+/0-9=?A-Z^_a-z`{|}~])*@[a-zA-Z0-9](-*\.?[a-zA-Z0-9])*\.[a-zA-Z](-?[a-zA-Z0-9])+$",
    )
    .expect("static regex")
});

// ── Options ───────────────────────────────────────────────────────────────────

/// Options shared by every check.
#[derive(Clone, Debug)]
pub struct Options {
    pub required: bool,
    pub name: String,
}

impl Options {
    pub fn new() -> Self { Self::default() }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self { required: true, name: DEFAULT_NAME.to_owned() }
    }
}

#[derive(Clone, Debug)]
pub struct StringOptions {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: usize,
    pub name: String,
}

impl StringOptions {
    pub fn new() -> Self { Self::default() }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = n;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            required: true,
            min_length: None,
            max_length: DEFAULT_MAX_LENGTH,
            name: DEFAULT_NAME.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NumberOptions {
    pub required: bool,
    pub min_value: f64,
    pub max_value: f64,
    pub name: String,
}

impl NumberOptions {
    pub fn new() -> Self { Self::default() }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = min;
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = max;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            required: true,
            min_value: MIN_SAFE_INTEGER,
            max_value: MAX_SAFE_INTEGER,
            name: DEFAULT_NAME.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UrlOptions {
    pub required: bool,
    /// Allowed schemes with their trailing colon, e.g. `"https:"`.
    pub protocols: Vec<String>,
    pub name: String,
}

impl UrlOptions {
    pub fn new() -> Self { Self::default() }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            required: true,
            protocols: vec!["http:".to_owned(), "https:".to_owned()],
            name: DEFAULT_NAME.to_owned(),
        }
    }
}

// ── Validator ─────────────────────────────────────────────────────────────────

/// Runs checks on behalf of a subject, usually a model name.
#[derive(Clone, Copy, Debug, Default)]
pub struct Validator<'a> {
    subject: Option<&'a str>,
}

impl<'a> Validator<'a> {
    /// Messages start with the name of the check, e.g. `validateString`.
    pub fn new() -> Self {
        Self { subject: None }
    }

    /// Messages start with `subject`.
    pub fn with_subject(subject: &'a str) -> Self {
        Self { subject: Some(subject) }
    }

    fn fail(&self, check: &str, name: &str, reason: impl AsRef<str>) -> Error {
        let subject = self.subject.unwrap_or(check);
        Error::validation(format!("{subject} {name} {}", reason.as_ref()))
    }

    pub fn string<T: Serialize + ?Sized>(&self, value: &T, opts: &StringOptions) -> Result<(), Error> {
        const CHECK: &str = "validateString";
        let fail = |reason: String| self.fail(CHECK, &opts.name, reason);

        let s = match inspect(value) {
            Value::Null if opts.required => return Err(fail("is required.".into())),
            Value::Null => return Ok(()),
            Value::String(s) => s,
            _ => return Err(fail("must be a string.".into())),
        };
        if opts.required && s.trim().is_empty() {
            return Err(fail("is required.".into()));
        }
        let len = s.chars().count();
        if let Some(min) = opts.min_length {
            if len < min {
                return Err(fail(format!("must be greater than {min} characters.")));
            }
        }
        if len > opts.max_length {
            return Err(fail(format!("must not exceed {} characters.", opts.max_length)));
        }
        Ok(())
    }

    pub fn number<T: Serialize + ?Sized>(&self, value: &T, opts: &NumberOptions) -> Result<(), Error> {
        const CHECK: &str = "validateNumber";
        let fail = |reason: String| self.fail(CHECK, &opts.name, reason);

        let n = match inspect(value) {
            Value::Null if opts.required => return Err(fail("is required.".into())),
            Value::Null => return Ok(()),
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            _ => return Err(fail("must be a number.".into())),
        };
        if n < opts.min_value {
            return Err(fail(format!("must not be less than {}.", number_text(opts.min_value))));
        }
        if n > opts.max_value {
            return Err(fail(format!("must not be greater than {}.", number_text(opts.max_value))));
        }
        Ok(())
    }

    pub fn url<T: Serialize + ?Sized>(&self, value: &T, opts: &UrlOptions) -> Result<(), Error> {
        const CHECK: &str = "validateUrl";
        let fail = |reason: String| self.fail(CHECK, &opts.name, reason);

        let s = match inspect(value) {
            Value::Null if opts.required => return Err(fail("is required.".into())),
            Value::Null => return Ok(()),
            Value::String(s) => s,
            _ => return Err(fail("must be a url.".into())),
        };
        let url = Url::parse(&s).map_err(|_| fail("must be a url.".into()))?;
        let protocol = format!("{}:", url.scheme());
        if !opts.protocols.iter().any(|p| *p == protocol) {
            return Err(fail(format!("protocol must be {}.", opts.protocols.join(","))));
        }
        Ok(())
    }

    pub fn email<T: Serialize + ?Sized>(&self, value: &T, opts: &Options) -> Result<(), Error> {
        const CHECK: &str = "validateEmail";
        let fail = |reason: &str| self.fail(CHECK, &opts.name, reason);

        let email = match inspect(value) {
            Value::Null if opts.required => return Err(fail("is required.")),
            Value::Null => return Ok(()),
            Value::String(s) => s,
            _ => return Err(fail("must be a valid email address.")),
        };
        if email.chars().count() > EMAIL_MAX_LENGTH {
            return Err(fail("must be a valid email address (less than 254 chars)."));
        }
        if !EMAIL.is_match(&email) {
            return Err(fail("must be a valid email address."));
        }
        let (local, domain) = email.split_once('@').unwrap_or((email.as_str(), ""));
        if local.len() > EMAIL_LOCAL_MAX_LENGTH {
            return Err(fail("must be a valid email address (first part less than 65 chars)."));
        }
        if domain.split('.').any(|label| label.len() > EMAIL_LABEL_MAX_LENGTH) {
            return Err(fail("must be a valid email address (domain part less than 64 chars)."));
        }
        Ok(())
    }

    pub fn boolean<T: Serialize + ?Sized>(&self, value: &T, opts: &Options) -> Result<(), Error> {
        const CHECK: &str = "validateBoolean";
        match inspect(value) {
            Value::Null if opts.required => Err(self.fail(CHECK, &opts.name, "is required.")),
            Value::Null | Value::Bool(_) => Ok(()),
            _ => Err(self.fail(CHECK, &opts.name, "must be a boolean.")),
        }
    }

    /// Checks that `value` holds a `T`.
    pub fn instance_of<T: Any>(&self, value: Option<&dyn Any>, opts: &Options) -> Result<(), Error> {
        const CHECK: &str = "validateInstanceOf";
        match value {
            None if opts.required => Err(self.fail(CHECK, &opts.name, "is required.")),
            None => Ok(()),
            Some(v) if v.is::<T>() => Ok(()),
            Some(_) => Err(self.fail(
                CHECK,
                &opts.name,
                format!("must be an instanceof {}.", short_type_name::<T>()),
            )),
        }
    }
}

/// The value as JSON; anything that refuses to serialize reads as a non-match.
fn inspect<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::Array(Vec::new()))
}

/// Integers print without a fractional part: `10`, not `10.0`.
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// `my_crate::models::User<T>` → `User`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
