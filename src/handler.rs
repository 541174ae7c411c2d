//! Handler trait, handler factories, and type erasure.
//!
//! # Two phases
//!
//! A route does not store a handler, it stores a *factory*: a function from
//! the incoming [`Request`] to a fresh handler. The dispatcher builds the
//! handler first, then calls it. A factory failure is therefore distinct
//! from a handler failure, and each gets its own log line.
//!
//! ```text
//! |req: &Request| Ok(UserPage::new(req))       ← user writes this
//!        ↓ router.on("apigateway/users_id", …)
//! factory.into_boxed_factory()                  ← Factory blanket impl
//!        ↓  stored as BoxedFactory = Arc<dyn ErasedFactory>
//! factory.build(&req)  at dispatch time         → Box<dyn Handler>
//!        ↓
//! handler.handle(&req, &mut res).await
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Something that can answer one event.
///
/// Implement this directly for full control, or implement
/// [`Page`](crate::Page) / [`Stream`](crate::Stream) and let their adapters
/// do the method dispatch.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, req: &Request, res: &mut Response) -> Result<(), Error>;
}

/// A handler built for a single invocation.
pub type BoxedHandler = Box<dyn Handler>;

// ── Erased factory ────────────────────────────────────────────────────────────

/// Internal build interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of
/// [`Factory::into_boxed_factory`].
#[doc(hidden)]
pub trait ErasedFactory {
    fn build(&self, req: &Request) -> Result<BoxedHandler, Error>;
}

/// A registered factory, shared by every invocation that hits its route.
#[doc(hidden)]
pub type BoxedFactory = Arc<dyn ErasedFactory + Send + Sync + 'static>;

// ── Public Factory trait ──────────────────────────────────────────────────────

/// Implemented for every valid route factory.
///
/// You never implement this yourself. Any function or closure with the
/// signature below qualifies:
///
/// ```text
/// Fn(&Request) -> Result<impl Handler, Error>
/// ```
pub trait Factory: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_factory(self) -> BoxedFactory;
}

mod private {
    pub trait Sealed {}
}

impl<F, H> private::Sealed for F
where
    F: Fn(&Request) -> Result<H, Error> + Send + Sync + 'static,
    H: Handler,
{
}

impl<F, H> Factory for F
where
    F: Fn(&Request) -> Result<H, Error> + Send + Sync + 'static,
    H: Handler,
{
    fn into_boxed_factory(self) -> BoxedFactory {
        Arc::new(FnFactory(self, PhantomData))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete factory `F` and boxes whatever handler it builds.
struct FnFactory<F, H>(F, PhantomData<fn() -> H>);

impl<F, H> ErasedFactory for FnFactory<F, H>
where
    F: Fn(&Request) -> Result<H, Error>,
    H: Handler,
{
    fn build(&self, req: &Request) -> Result<BoxedHandler, Error> {
        let handler = (self.0)(req)?;
        Ok(Box::new(handler))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;

    struct Echo(String);

    #[async_trait]
    impl Handler for Echo {
        async fn handle(&self, _req: &Request, res: &mut Response) -> Result<(), Error> {
            res.set_status(StatusCode::OK).set_body(self.0.clone());
            Ok(())
        }
    }

    fn request() -> Request {
        Request::new(serde_json::from_value(json!({ "routeKey": "GET /echo" })).unwrap())
    }

    #[tokio::test]
    async fn factory_builds_a_fresh_handler() {
        let factory = (|req: &Request| -> Result<Echo, Error> { Ok(Echo(req.target_path())) }).into_boxed_factory();
        let req = request();
        let handler = factory.build(&req).unwrap();

        let mut res = Response::new();
        handler.handle(&req, &mut res).await.unwrap();
        assert_eq!(res.body(), Some("apigateway/echo"));
    }

    #[test]
    fn factory_errors_pass_through() {
        let factory = (|_: &Request| -> Result<Echo, Error> { Err(Error::internal("no db")) }).into_boxed_factory();
        assert!(matches!(factory.build(&request()), Err(Error::Internal(_))));
    }
}
