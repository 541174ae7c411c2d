//! The verbs a [`Page`](crate::Page) answers.
//!
//! API Gateway hands the verb over as an uppercase string in
//! `requestContext.http.method`. Anything outside these seven (`TRACE`,
//! `CONNECT`, WebDAV verbs, lower-case spellings) does not parse, and the page
//! falls back to its 404.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Every verb, in the order [`Page`](crate::Page) declares them.
    pub const ALL: [Method; 7] = [
        Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete, Self::Head, Self::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get     => "GET",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Patch   => "PATCH",
            Self::Delete  => "DELETE",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
