//! Content-Security-Policy value.

use std::fmt;

/// Source expressions that must be single-quoted on the wire.
const KEYWORDS: &[&str] = &[
    "none",
    "self",
    "strict-dynamic",
    "report-sample",
    "unsafe-inline",
    "unsafe-eval",
    "unsafe-hashes",
    "unsafe-allow-redirects",
];

/// A policy, either taken verbatim or built directive by directive.
///
/// ```rust
/// use lamina::Csp;
///
/// let csp = Csp::new()
///     .directive("default-src", ["self"])
///     .directive("img-src", ["self", "https://cdn.example.com"]);
/// assert_eq!(csp.to_string(), "default-src 'self'; img-src 'self' https://cdn.example.com");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Csp {
    Literal(String),
    Directives(Vec<(String, Vec<String>)>),
}

impl Csp {
    pub fn new() -> Self {
        Self::Directives(Vec::new())
    }

    /// Appends a directive. Replaces the sources of an existing one with the
    /// same name, keeping its position. Turns a literal policy into a
    /// directive list.
    pub fn directive<I, S>(self, name: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut directives = match self {
            Self::Directives(d) => d,
            Self::Literal(_) => Vec::new(),
        };
        let name = name.into();
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        match directives.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = sources,
            None => directives.push((name, sources)),
        }
        Self::Directives(directives)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Literal(s) => s.is_empty(),
            Self::Directives(d) => d.is_empty(),
        }
    }
}

impl Default for Csp {
    fn default() -> Self { Self::new() }
}

impl From<&str> for Csp {
    fn from(s: &str) -> Self { Self::Literal(s.to_owned()) }
}

impl From<String> for Csp {
    fn from(s: String) -> Self { Self::Literal(s) }
}

impl fmt::Display for Csp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let directives = match self {
            Self::Literal(s) => return f.write_str(s),
            Self::Directives(d) => d,
        };
        for (i, (name, sources)) in directives.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(name)?;
            for source in sources {
                if KEYWORDS.contains(&source.as_str()) {
                    write!(f, " '{source}'")?;
                } else {
                    write!(f, " {source}")?;
                }
            }
        }
        Ok(())
    }
}
