//! Target-path router.
//!
//! Every event is reduced to a target path such as `apigateway/users_userid`
//! or `s3/uploads` (see [`Request::target_path`](crate::Request::target_path)).
//! The router maps those paths to handler factories. Lookup goes through a
//! radix tree, so patterns may capture: `s3/{bucket}` answers every bucket,
//! `crons/{*job}` every scheduled rule.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::handler::{BoxedFactory, Factory};
use crate::page::{HtmlHandler, Page, PageHandler};
use crate::request::Request;
use crate::stream::{Stream, StreamHandler};

/// The route table. Build it once at startup and hand it to [`App`](crate::App).
///
/// ```rust
/// # use lamina::{Page, Request, Router};
/// # struct Users;
/// # #[async_trait::async_trait]
/// # impl Page for Users {}
/// # struct Uploads;
/// # #[async_trait::async_trait]
/// # impl lamina::Stream for Uploads {}
/// let router = Router::new()
///     .page("apigateway/users_userid", |_req: &Request| Ok(Users))
///     .stream("streams/uploads", |_req: &Request| Ok(Uploads));
/// assert!(router.has_route("apigateway/users_userid"));
/// ```
pub struct Router {
    routes: MatchitRouter<BoxedFactory>,
    patterns: Vec<String>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: MatchitRouter::new(), patterns: Vec::new() }
    }

    /// Registers a factory for a target-path pattern. Returns `self` for chaining.
    ///
    /// Literal segments are matched case-insensitively, since target paths
    /// are always lower-case. Captures keep the case they are written in.
    ///
    /// # Panics
    ///
    /// On a malformed or conflicting pattern. Routes are registered at
    /// startup, so this fails the deploy instead of an invocation.
    pub fn on(mut self, pattern: &str, factory: impl Factory) -> Self {
        let path = normalize(pattern);
        self.routes
            .insert(path.clone(), factory.into_boxed_factory())
            .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));
        self.patterns.push(path);
        self
    }

    /// Registers a [`Page`]; the request method picks the verb.
    pub fn page<F, P>(self, pattern: &str, factory: F) -> Self
    where
        F: Fn(&Request) -> Result<P, Error> + Send + Sync + 'static,
        P: Page,
    {
        self.on(pattern, move |req: &Request| factory(req).map(PageHandler::new))
    }

    /// Registers a [`Page`] that answers `text/html`.
    pub fn html<F, P>(self, pattern: &str, factory: F) -> Self
    where
        F: Fn(&Request) -> Result<P, Error> + Send + Sync + 'static,
        P: Page,
    {
        self.on(pattern, move |req: &Request| factory(req).map(HtmlHandler::new))
    }

    /// Registers a change-stream consumer.
    pub fn stream<F, S>(self, pattern: &str, factory: F) -> Self
    where
        F: Fn(&Request) -> Result<S, Error> + Send + Sync + 'static,
        S: Stream,
    {
        self.on(pattern, move |req: &Request| factory(req).map(StreamHandler::new))
    }

    pub fn has_route(&self, target: &str) -> bool {
        self.routes.at(&format!("/{target}")).is_ok()
    }

    /// Registered patterns, lower-cased, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| &p[1..])
    }

    pub(crate) fn lookup(&self, target: &str) -> Option<(BoxedFactory, HashMap<String, String>)> {
        let path = format!("/{target}");
        let matched = self.routes.at(&path).ok()?;
        let factory = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((factory, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Lower-cases everything outside `{…}` and roots the pattern at `/`.
fn normalize(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 1);
    out.push('/');
    let mut depth = 0usize;
    for c in pattern.trim_start_matches('/').chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::handler::Handler;
    use crate::response::Response;

    struct Noop;

    #[async_trait]
    impl Handler for Noop {
        async fn handle(&self, _: &Request, _: &mut Response) -> Result<(), Error> { Ok(()) }
    }

    fn noop(_: &Request) -> Result<Noop, Error> { Ok(Noop) }

    #[test]
    fn literal_routes_ignore_case() {
        let router = Router::new().on("ApiGateway/Users_UserId", noop);
        assert!(router.has_route("apigateway/users_userid"));
        assert!(!router.has_route("apigateway/users"));
        assert_eq!(router.patterns().collect::<Vec<_>>(), ["apigateway/users_userid"]);
    }

    #[test]
    fn captures_keep_their_name() {
        let router = Router::new().on("s3/{bucketName}", noop);
        let (_, params) = router.lookup("s3/uploads").unwrap();
        assert_eq!(params["bucketName"], "uploads");
    }

    #[test]
    fn static_routes_win_over_captures() {
        let router = Router::new()
            .on("s3/{bucket}", noop)
            .on("s3/logs", noop);
        let (_, params) = router.lookup("s3/logs").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn default_route_is_addressable() {
        let router = Router::new().on("$default", noop);
        assert!(router.has_route("$default"));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn duplicate_routes_panic() {
        let _ = Router::new().on("crons/nightly", noop).on("crons/nightly", noop);
    }
}
