//! End-to-end dispatch: raw events through the router to serialized replies.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Value, json};

use lamina::{App, Body, Cookie, Error, Page, Record, Request, Response, Router, Stream};

fn http_event(method: &str, route_key: &str, extra: Value) -> Value {
    let mut event = json!({
        "routeKey": route_key,
        "rawPath": route_key.split_once(' ').map(|(_, p)| p).unwrap_or("/"),
        "requestContext": { "http": { "method": method }, "stage": "$default" },
    });
    if let (Some(map), Value::Object(extra)) = (event.as_object_mut(), extra) {
        map.extend(extra);
    }
    event
}

// ── Pages ─────────────────────────────────────────────────────────────────────

struct Things;

#[async_trait]
impl Page for Things {
    async fn get(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        let id = req.path_parameter("id").unwrap_or_default();
        res.set_status(StatusCode::OK)
            .json(&json!({ "id": id }))?
            .cookie(Cookie::new("seen", "1"))
            .cookie(Cookie::new("theme", "dark").http_only(false));
        Ok(())
    }

    async fn post(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        if !req.is_valid_csrf() {
            return Err(Error::permission("Invalid CSRF token."));
        }
        match req.body()? {
            Some(Body::Json(body)) => {
                res.set_status(StatusCode::CREATED).json(&body)?;
                Ok(())
            }
            _ => Err(Error::validation("Body required.")),
        }
    }
}

fn app() -> App {
    App::new(Router::new().page("apigateway/things_id", |_: &Request| Ok(Things)))
}

#[tokio::test]
async fn unrouted_request_is_a_bare_404() {
    let reply = app().dispatch_value(http_event("GET", "GET /foo", json!({}))).await.unwrap();
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({ "statusCode": 404, "headers": { "Content-Type": "application/json" } }),
    );
}

#[tokio::test]
async fn page_get_answers_with_json_and_cookies() {
    let event = http_event("GET", "GET /things/{id}", json!({ "pathParameters": { "id": "7.json" } }));
    let reply = app().dispatch_value(event).await.unwrap();

    assert_eq!(reply.status_code, 200);
    assert_eq!(reply.body.as_deref(), Some(r#"{"id":"7"}"#));

    let wire = serde_json::to_value(&reply).unwrap();
    assert_eq!(
        wire["cookies"],
        json!([
            "seen=1;Secure;HttpOnly;Max-Age=604800;SameSite=lax;Path=/;",
            "theme=dark;Secure;Max-Age=604800;SameSite=lax;Path=/;",
        ]),
    );
    assert!(wire["headers"].get("Set-Cookie").is_none());
}

#[tokio::test]
async fn page_post_checks_csrf_then_echoes_json() {
    let event = http_event(
        "POST",
        "POST /things/{id}",
        json!({
            "pathParameters": { "id": "7" },
            "headers": { "Content-Type": "application/json", "X-CSRF": "tok" },
            "cookies": ["csrf=tok"],
            "body": "{\"name\":\"widget\"}",
        }),
    );
    let reply = app().dispatch_value(event).await.unwrap();
    assert_eq!(reply.status_code, 201);
    assert_eq!(reply.body.as_deref(), Some(r#"{"name":"widget"}"#));
}

#[tokio::test]
async fn typed_errors_become_status_and_message() {
    let forged = http_event(
        "POST",
        "POST /things/{id}",
        json!({ "headers": { "x-csrf": "a" }, "cookies": ["csrf=b"], "body": "{}" }),
    );
    let reply = app().dispatch_value(forged).await.unwrap();
    assert_eq!(reply.status_code, 403);
    assert_eq!(reply.body.as_deref(), Some(r#"{"status":"Invalid CSRF token."}"#));

    let malformed = http_event(
        "POST",
        "POST /things/{id}",
        json!({
            "headers": { "content-type": "application/json", "x-csrf": "a" },
            "cookies": ["csrf=a"],
            "body": "{not json",
        }),
    );
    let reply = app().dispatch_value(malformed).await.unwrap();
    assert_eq!(reply.status_code, 400);
}

#[tokio::test]
async fn unimplemented_verb_is_page_not_found() {
    let reply = app()
        .dispatch_value(http_event("DELETE", "DELETE /things/{id}", json!({})))
        .await
        .unwrap();
    assert_eq!(reply.status_code, 404);
    assert_eq!(reply.body.as_deref(), Some(r#"{"status":"Page not found"}"#));
}

#[tokio::test]
async fn root_and_index_share_a_handler() {
    let app = App::new(Router::new().html("apigateway/index", |_: &Request| Ok(Things)));
    for key in ["GET /", "GET /index"] {
        let reply = app.dispatch_value(http_event("GET", key, json!({}))).await.unwrap();
        assert_eq!(reply.status_code, 200, "{key}");
        assert_eq!(reply.header("content-type"), Some("text/html"));
    }
}

#[tokio::test]
async fn malformed_fields_still_get_a_reply() {
    let event = json!({
        "routeKey": "GET /things/{id}",
        "pathParameters": { "id": "7" },
        "requestContext": { "http": {} },
        "isBase64Encoded": null,
        "body": 42,
    });
    let reply = app().dispatch_value(event).await.unwrap();
    assert_eq!(reply.status_code, 404);
    assert_eq!(reply.body.as_deref(), Some(r#"{"status":"Page not found"}"#));
}

// ── Streams ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Ledger {
    seen: Arc<Mutex<Vec<String>>>,
    fail_remove: bool,
}

#[async_trait]
impl Stream for Ledger {
    async fn insert(&self, record: &Record) -> Result<(), Error> {
        self.note("insert", record);
        Ok(())
    }

    async fn modify(&self, record: &Record) -> Result<(), Error> {
        self.note("modify", record);
        Ok(())
    }

    async fn remove(&self, record: &Record) -> Result<(), Error> {
        self.note("remove", record);
        if self.fail_remove {
            return Err(Error::bad_gateway("downstream unavailable"));
        }
        Ok(())
    }
}

impl Ledger {
    fn note(&self, op: &str, record: &Record) {
        let keys = &record.get("dynamodb").unwrap()["Keys"]["Id"]["N"];
        self.seen.lock().unwrap().push(format!("{op}:{}", keys.as_str().unwrap()));
    }
}

fn stream_event() -> Value {
    let arn = "arn:aws:dynamodb:us-east-1:123456789012:table/ExampleTableWithStream/stream/2015-06-27T00:48:05.899";
    let record = |id: &str, name: &str| {
        json!({
            "eventID": id,
            "eventName": name,
            "eventSource": "aws:dynamodb",
            "eventSourceARN": arn,
            "dynamodb": { "Keys": { "Id": { "N": id } } },
        })
    };
    json!({ "Records": [record("101", "INSERT"), record("102", "MODIFY"), record("103", "REMOVE")] })
}

#[tokio::test]
async fn stream_batch_calls_each_method_once() {
    let ledger = Ledger::default();
    let factory_ledger = ledger.clone();
    let app = App::new(
        Router::new().stream("streams/exampletablewithstream", move |_: &Request| Ok(factory_ledger.clone())),
    );

    let reply = app.dispatch_value(stream_event()).await.unwrap();
    assert_eq!(reply.status_code, 200);
    assert_eq!(*ledger.seen.lock().unwrap(), ["insert:101", "modify:102", "remove:103"]);
}

#[tokio::test]
async fn odd_record_does_not_hide_the_rest_of_the_batch() {
    let ledger = Ledger::default();
    let factory_ledger = ledger.clone();
    let app = App::new(
        Router::new().stream("streams/exampletablewithstream", move |_: &Request| Ok(factory_ledger.clone())),
    );

    let mut event = stream_event();
    event["Records"][1]["eventID"] = json!(7);
    let reply = app.dispatch_value(event).await.unwrap();
    assert_eq!(reply.status_code, 200);
    assert_eq!(*ledger.seen.lock().unwrap(), ["insert:101", "modify:102", "remove:103"]);
}

#[tokio::test]
async fn stream_failure_is_a_500() {
    let ledger = Ledger { fail_remove: true, ..Ledger::default() };
    let factory_ledger = ledger.clone();
    let app = App::new(
        Router::new().stream("streams/{table}", move |_: &Request| Ok(factory_ledger.clone())),
    );

    let reply = app.dispatch_value(stream_event()).await.unwrap();
    assert_eq!(reply.status_code, 500);
    assert_eq!(ledger.seen.lock().unwrap().len(), 3);
}

// ── Other event sources ───────────────────────────────────────────────────────

struct Ok200;

#[async_trait]
impl lamina::Handler for Ok200 {
    async fn handle(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        res.set_status(StatusCode::OK).set_body(req.target_path());
        Ok(())
    }
}

#[tokio::test]
async fn non_http_events_route_by_namespace() {
    let app = App::new(
        Router::new()
            .on("cognito/{trigger}", |_: &Request| -> Result<Ok200, Error> { Ok(Ok200) })
            .on("crons/{job}", |_: &Request| -> Result<Ok200, Error> { Ok(Ok200) })
            .on("ses/incoming", |_: &Request| -> Result<Ok200, Error> { Ok(Ok200) }),
    );

    let cases = [
        (json!({ "userPoolId": "pool", "triggerSource": "PostConfirmation_ConfirmSignUp" }), "cognito/postconfirmation_confirmsignup"),
        (json!({ "source": "aws.events", "cronFileName": "Nightly" }), "crons/nightly"),
        (json!({ "Records": [{ "eventSource": "aws:ses" }] }), "ses/incoming"),
    ];
    for (event, target) in cases {
        let reply = app.dispatch_value(event).await.unwrap();
        assert_eq!(reply.status_code, 200, "{target}");
        assert_eq!(reply.body.as_deref(), Some(target));
    }
}
