//! Unified error type.
//!
//! Handler code raises the five HTTP-flavoured kinds ([`ErrorKind`]); the
//! dispatcher turns any of them into a status code and a small JSON body.
//! Everything else is infrastructure: serialization failures, a factory that
//! could not build its handler, or a verb a page never implemented.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::method::Method;

/// The category of an application-level failure.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Validation,     // 400
    Authentication, // 401
    Permission,     // 403
    NotFound,       // 404
    BadGateway,     // 502
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation     => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Permission     => StatusCode::FORBIDDEN,
            Self::NotFound       => StatusCode::NOT_FOUND,
            Self::BadGateway     => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message used when the caller does not supply one.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Validation     => "Validation Error",
            Self::Authentication => "Authentication Error",
            Self::Permission     => "Permission Error",
            Self::NotFound       => "Not Found",
            Self::BadGateway     => "Bad Gateway Error",
        }
    }
}

/// Which side of the exchange is to blame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    Client,
    Server,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}

/// The error type returned by lamina's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A typed application failure carrying its HTTP status.
    #[error("{message}")]
    Http {
        kind: ErrorKind,
        message: String,
        fault: Option<Fault>,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised by the provided [`Page`](crate::Page) verb methods. The page
    /// adapter turns it into the "Page not found" response.
    #[error("no handler for {0}")]
    MethodNotImplemented(Method),

    /// A factory could not build its handler.
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Http { kind, message: message.into(), fault: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attributes the failure to one side. No-op on non-HTTP errors.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        if let Self::Http { fault: slot, .. } = &mut self {
            *slot = Some(fault);
        }
        self
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Http { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Http { fault, .. } => *fault,
            _ => None,
        }
    }

    /// The status the dispatcher answers with, if this error has one.
    ///
    /// Infrastructure errors return `None`: the response keeps whatever
    /// status the handler set before failing, 500 by default.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Http { kind, .. } => Some(kind.status()),
            Self::MethodNotImplemented(_) => Some(StatusCode::NOT_FOUND),
            Self::Json(_) | Self::Internal(_) => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(Error::validation("x").status_code(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(Error::authentication("x").status_code(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(Error::permission("x").status_code(), Some(StatusCode::FORBIDDEN));
        assert_eq!(Error::not_found("x").status_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(Error::bad_gateway("x").status_code(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(Error::internal("x").status_code(), None);
    }

    #[test]
    fn default_messages_come_from_the_kind() {
        let err = Error::from(ErrorKind::Permission);
        assert_eq!(err.to_string(), "Permission Error");
        assert_eq!(err.kind(), Some(ErrorKind::Permission));
    }

    #[test]
    fn fault_is_attached_to_http_errors_only() {
        let err = Error::bad_gateway("upstream down").with_fault(Fault::Server);
        assert_eq!(err.fault(), Some(Fault::Server));
        assert_eq!(err.to_string(), "upstream down");

        let err = Error::internal("boom").with_fault(Fault::Client);
        assert_eq!(err.fault(), None);
    }
}
