//! # lamina
//!
//! A minimal serverless framework. Cloud events in, routed handlers,
//! platform replies out.
//!
//! ## The contract
//!
//! The platform owns delivery: invoking the function, retries, scaling,
//! TLS, the HTTP edge. lamina owns the part that changes between
//! applications:
//!
//! - **Routing**: every event, HTTP or not, becomes a *target path*
//!   (`apigateway/users_userid`, `s3/uploads`, `streams/orders`) looked up
//!   in a radix tree via [`matchit`]
//! - **Requests**: typed access to route keys, parameters, headers, cookies
//!   and bodies, with the platform's quirks smoothed over
//! - **Responses**: status, body, cookies, CSP and server timing collected
//!   on a [`Response`], assembled once into a [`Reply`]
//! - **Helpers**: [`Page`] verb dispatch, [`Stream`] record fan-out, HTML
//!   [`Document`]s, [`Model`]s and [`validation`]
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use lamina::{App, Error, Page, Request, Response, Router};
//!
//! struct User { id: String }
//!
//! #[async_trait]
//! impl Page for User {
//!     async fn get(&self, _req: &Request, res: &mut Response) -> Result<(), Error> {
//!         res.set_status(StatusCode::OK)
//!            .json(&serde_json::json!({ "id": self.id }))?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = App::new(
//!         Router::new().page("apigateway/users_userid", |req: &Request| {
//!             let id = req.path_parameter("userId").ok_or(Error::not_found("no user"))?;
//!             Ok(User { id })
//!         }),
//!     );
//!
//!     let event = serde_json::json!({
//!         "routeKey": "GET /users/{userId}",
//!         "pathParameters": { "userId": "42" },
//!         "requestContext": { "http": { "method": "GET" } },
//!     });
//!     let reply = app.dispatch_value(event).await?;
//!     println!("{}", serde_json::to_string(&reply)?);
//!     Ok(())
//! }
//! ```

mod app;
mod cookie;
mod csp;
mod error;
mod handler;
mod html;
mod method;
mod page;
mod request;
mod response;
mod router;
mod stream;

pub mod config;
pub mod event;
pub mod logging;
pub mod model;
pub mod validation;

pub use app::App;
pub use config::{Config, ConfigError, Namespaces};
pub use cookie::Cookie;
pub use csp::Csp;
pub use error::{Error, ErrorKind, Fault};
pub use event::{Event, Record};
pub use handler::{BoxedHandler, Factory, Handler};
pub use html::Document;
pub use method::Method;
pub use model::{Collection, Model};
pub use page::{HtmlHandler, Page, PageHandler};
pub use request::{Body, EventType, Request};
pub use response::{ContentType, Reply, Response};
pub use router::Router;
pub use stream::{Stream, StreamHandler};
pub use validation::Validator;
