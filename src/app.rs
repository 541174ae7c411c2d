//! The dispatcher: one event in, one reply out.
//!
//! ```text
//! Event ──► Request ──► target path ──► Router ──► factory ──► handler
//!                                                               │
//!                                      Reply ◄── done() ◄── Response
//! ```
//!
//! `dispatch` never fails. Whatever goes wrong (no route, a factory error, a
//! handler error or panic) is logged and turned into a reply.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use http::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::Error;
use crate::event::Event;
use crate::request::Request;
use crate::response::{Reply, Response};
use crate::router::Router;

/// A router plus the settings it routes with.
///
/// Build it once per cold start and reuse it for every invocation.
///
/// ```rust
/// # use lamina::{App, Router};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let app = App::new(Router::new());
/// let event = serde_json::from_value(serde_json::json!({ "routeKey": "GET /nope" })).unwrap();
///
/// let reply = app.dispatch(event).await;
/// assert_eq!(reply.status_code, 404);
/// # }
/// ```
pub struct App {
    router: Router,
    config: Config,
}

impl App {
    pub fn new(router: Router) -> Self {
        Self::with_config(router, Config::default())
    }

    pub fn with_config(router: Router, config: Config) -> Self {
        Self { router, config }
    }

    pub fn router(&self) -> &Router { &self.router }
    pub fn config(&self) -> &Config { &self.config }

    /// Decodes a raw JSON event and dispatches it. Only a payload that is
    /// not an event at all fails.
    pub async fn dispatch_value(&self, event: Value) -> Result<Reply, Error> {
        let event: Event = serde_json::from_value(event)?;
        Ok(self.dispatch(event).await)
    }

    pub async fn dispatch(&self, event: Event) -> Reply {
        let mut req = Request::with_namespaces(event, self.config.namespaces.clone());
        let mut res = Response::new();
        let target = req.target_path();

        let Some((factory, params)) = self.router.lookup(&target) else {
            warn!(%target, event_type = req.event_type().as_str(), "no route");
            res.set_status(StatusCode::NOT_FOUND);
            return res.done();
        };
        req.params = params;
        debug!(%target, method = ?req.method_str(), "dispatching");

        let handler = match std::panic::catch_unwind(AssertUnwindSafe(|| factory.build(&req))) {
            Ok(Ok(handler)) => handler,
            Ok(Err(e)) => {
                error!(%target, "handler construction failed: {e}");
                return res.done();
            }
            Err(panic) => {
                error!(%target, "handler construction panicked: {}", panic_message(&*panic));
                return res.done();
            }
        };

        match AssertUnwindSafe(handler.handle(&req, &mut res)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                match e.status_code() {
                    Some(status) if status.is_client_error() => {
                        warn!(%target, status = status.as_u16(), "{e}");
                    }
                    _ => error!(%target, "handler failed: {e}"),
                }
                if let Some(status) = e.status_code() {
                    res.set_status(status);
                    if let Err(e) = res.json(&json!({ "status": e.to_string() })) {
                        error!(%target, "could not encode error body: {e}");
                    }
                }
            }
            Err(panic) => {
                error!(%target, "handler panicked: {}", panic_message(&*panic));
            }
        }

        res.done()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
