//! Verb-dispatched pages.
//!
//! A [`Page`] implements only the verbs it answers. The adapters pick the
//! method from the request; a verb the page never implemented answers
//! `404 {"status":"Page not found"}`.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::handler::Handler;
use crate::method::Method;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// An HTTP API page. Every verb defaults to "not implemented".
///
/// ```rust
/// use async_trait::async_trait;
/// use http::StatusCode;
/// use lamina::{Error, Page, Request, Response};
///
/// struct Hello;
///
/// #[async_trait]
/// impl Page for Hello {
///     async fn get(&self, _req: &Request, res: &mut Response) -> Result<(), Error> {
///         res.set_status(StatusCode::OK).json(&serde_json::json!({ "hello": "world" }))?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Page: Send + Sync + 'static {
    async fn get(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Get))
    }

    async fn post(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Post))
    }

    async fn put(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Put))
    }

    async fn patch(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Patch))
    }

    async fn delete(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Delete))
    }

    async fn head(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Head))
    }

    async fn options(&self, _req: &Request, _res: &mut Response) -> Result<(), Error> {
        Err(Error::MethodNotImplemented(Method::Options))
    }
}

/// Runs the page method matching the request verb.
async fn dispatch<P: Page>(page: &P, req: &Request, res: &mut Response) -> Result<(), Error> {
    let result = match req.method() {
        Some(Method::Get)     => page.get(req, res).await,
        Some(Method::Post)    => page.post(req, res).await,
        Some(Method::Put)     => page.put(req, res).await,
        Some(Method::Patch)   => page.patch(req, res).await,
        Some(Method::Delete)  => page.delete(req, res).await,
        Some(Method::Head)    => page.head(req, res).await,
        Some(Method::Options) => page.options(req, res).await,
        None => {
            debug!(method = ?req.method_str(), "unrecognised method");
            return page_not_found(res);
        }
    };
    match result {
        Err(Error::MethodNotImplemented(method)) => {
            debug!(%method, target = %req.target_path(), "page has no method");
            page_not_found(res)
        }
        other => other,
    }
}

fn page_not_found(res: &mut Response) -> Result<(), Error> {
    res.set_status(StatusCode::NOT_FOUND)
        .json(&json!({ "status": "Page not found" }))?;
    Ok(())
}

/// Adapts a [`Page`] to [`Handler`].
pub struct PageHandler<P>(P);

impl<P: Page> PageHandler<P> {
    pub fn new(page: P) -> Self { Self(page) }
}

#[async_trait]
impl<P: Page> Handler for PageHandler<P> {
    async fn handle(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        dispatch(&self.0, req, res).await
    }
}

/// Like [`PageHandler`], but the response defaults to `text/html`.
pub struct HtmlHandler<P>(P);

impl<P: Page> HtmlHandler<P> {
    pub fn new(page: P) -> Self { Self(page) }
}

#[async_trait]
impl<P: Page> Handler for HtmlHandler<P> {
    async fn handle(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        res.set_content_type(ContentType::Html);
        dispatch(&self.0, req, res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnlyPost;

    #[async_trait]
    impl Page for OnlyPost {
        async fn post(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
            res.set_status(StatusCode::CREATED).set_body(req.target_path());
            Ok(())
        }
    }

    fn request(method: &str) -> Request {
        let event = serde_json::from_value(json!({
            "routeKey": format!("{method} /things"),
            "requestContext": { "http": { "method": method } },
        }))
        .unwrap();
        Request::new(event)
    }

    #[tokio::test]
    async fn implemented_verb_runs() {
        let mut res = Response::new();
        PageHandler::new(OnlyPost).handle(&request("POST"), &mut res).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.body(), Some("apigateway/things"));
    }

    #[tokio::test]
    async fn missing_verb_is_page_not_found() {
        for method in ["GET", "DELETE", "TRACE", "PURGE"] {
            let mut res = Response::new();
            PageHandler::new(OnlyPost).handle(&request(method), &mut res).await.unwrap();
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{method}");
            assert_eq!(res.body(), Some(r#"{"status":"Page not found"}"#));
        }
    }

    #[tokio::test]
    async fn html_pages_switch_content_type() {
        let mut res = Response::new();
        HtmlHandler::new(OnlyPost).handle(&request("POST"), &mut res).await.unwrap();
        assert_eq!(res.content_type(), "text/html");
    }
}
