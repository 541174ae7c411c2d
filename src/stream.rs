//! Change-stream consumers.
//!
//! A DynamoDB stream batch carries one record per row change, each tagged
//! `INSERT`, `MODIFY` or `REMOVE`. [`StreamHandler`] calls the matching
//! [`Stream`] method for every record and waits for all of them.

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use http::StatusCode;
use tracing::{debug, error};

use crate::error::Error;
use crate::event::Record;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// Per-record callbacks. Each defaults to doing nothing.
#[async_trait]
pub trait Stream: Send + Sync + 'static {
    async fn insert(&self, _record: &Record) -> Result<(), Error> { Ok(()) }
    async fn modify(&self, _record: &Record) -> Result<(), Error> { Ok(()) }
    async fn remove(&self, _record: &Record) -> Result<(), Error> { Ok(()) }
}

/// Adapts a [`Stream`] to [`Handler`].
///
/// Calls are issued in record order and awaited together. The response is
/// 200 when every call succeeds, 500 otherwise. Records with an event name
/// other than the three above are skipped.
pub struct StreamHandler<S>(S);

impl<S: Stream> StreamHandler<S> {
    pub fn new(stream: S) -> Self { Self(stream) }
}

#[async_trait]
impl<S: Stream> Handler for StreamHandler<S> {
    async fn handle(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        let stream = &self.0;
        let calls: Vec<BoxFuture<'_, Result<(), Error>>> = req
            .records()
            .iter()
            .filter_map(|record| {
                let name = record.event_name.as_deref()?.to_lowercase();
                match name.as_str() {
                    "insert" => Some(stream.insert(record)),
                    "modify" => Some(stream.modify(record)),
                    "remove" => Some(stream.remove(record)),
                    _ => {
                        debug!(event_name = %name, "skipping stream record");
                        None
                    }
                }
            })
            .collect();

        let total = calls.len();
        let failures: Vec<Error> = join_all(calls)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if failures.is_empty() {
            res.set_status(StatusCode::OK);
        } else {
            for e in &failures {
                error!(target_path = %req.target_path(), "stream record failed: {e}");
            }
            error!(failed = failures.len(), total, "stream batch failed");
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn record(&self, op: &str, record: &Record) -> Result<(), Error> {
            let id = record.event_id.clone().unwrap_or_default();
            self.calls.lock().unwrap().push((op.to_owned(), id));
            if self.fail_on == Some(op) {
                return Err(Error::internal(format!("{op} failed")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Stream for Recorder {
        async fn insert(&self, record: &Record) -> Result<(), Error> { self.record("insert", record) }
        async fn modify(&self, record: &Record) -> Result<(), Error> { self.record("modify", record) }
        async fn remove(&self, record: &Record) -> Result<(), Error> { self.record("remove", record) }
    }

    fn batch(names: &[&str]) -> Request {
        let records: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({
                "eventID": i.to_string(),
                "eventName": name,
                "eventSource": "aws:dynamodb",
                "eventSourceARN": "arn:aws:dynamodb:us-east-1:1:table/things/stream/x",
            }))
            .collect();
        Request::new(serde_json::from_value(json!({ "Records": records })).unwrap())
    }

    #[tokio::test]
    async fn every_record_is_dispatched_once_in_order() {
        let handler = StreamHandler::new(Recorder::default());
        let mut res = Response::new();
        handler.handle(&batch(&["INSERT", "MODIFY", "REMOVE", "TRUNCATE"]), &mut res).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let calls = handler.0.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            [
                ("insert".to_owned(), "0".to_owned()),
                ("modify".to_owned(), "1".to_owned()),
                ("remove".to_owned(), "2".to_owned()),
            ],
        );
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let handler = StreamHandler::new(Recorder { fail_on: Some("modify"), ..Recorder::default() });
        let mut res = Response::new();
        handler.handle(&batch(&["INSERT", "MODIFY", "REMOVE"]), &mut res).await.unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(handler.0.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn default_callbacks_succeed() {
        struct Quiet;
        #[async_trait]
        impl Stream for Quiet {}

        let mut res = Response::new();
        StreamHandler::new(Quiet).handle(&batch(&["insert"]), &mut res).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
