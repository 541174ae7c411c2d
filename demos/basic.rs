//! Minimal lamina example: a JSON page, an HTML page and a stream consumer,
//! fed a few sample events.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use lamina::validation::StringOptions;
use lamina::{App, Body, Config, Document, Error, Model, Page, Record, Request, Response, Router, Stream, logging};

#[derive(Debug, Deserialize, Serialize)]
struct User {
    id: String,
    name: String,
}

impl Model for User {}

// apigateway/users_userid
struct UserPage {
    id: String,
}

#[async_trait]
impl Page for UserPage {
    async fn get(&self, _req: &Request, res: &mut Response) -> Result<(), Error> {
        res.start_timer("lookup");
        let user = User { id: self.id.clone(), name: "alice".into() };
        res.end_timer("lookup");
        res.set_status(StatusCode::OK).json(&user)?;
        Ok(())
    }

    async fn put(&self, req: &Request, res: &mut Response) -> Result<(), Error> {
        let Some(Body::Json(data)) = req.body()? else {
            return Err(Error::validation("expected a JSON body"));
        };
        User::validator().string(&data["name"], &StringOptions::new().name("name").max_length(64))?;
        let mut user = User { id: self.id.clone(), name: String::new() };
        if let Some(fields) = data.as_object() {
            user.assign(fields)?;
        }
        res.set_status(StatusCode::OK).json(&user)?;
        Ok(())
    }
}

// apigateway/index
struct Home;

#[async_trait]
impl Page for Home {
    async fn get(&self, _req: &Request, res: &mut Response) -> Result<(), Error> {
        Document::new()
            .title("lamina")
            .description("A tiny serverless page")
            .css("/static/app.css")
            .csrf(true)
            .body("<h1>Hello</h1>")
            .write_to(res);
        res.set_status(StatusCode::OK).set_cache_header(60);
        Ok(())
    }
}

// streams/users
struct UserStream;

#[async_trait]
impl Stream for UserStream {
    async fn insert(&self, record: &Record) -> Result<(), Error> {
        tracing::info!(id = ?record.event_id, "user created");
        Ok(())
    }

    async fn remove(&self, record: &Record) -> Result<(), Error> {
        tracing::info!(id = ?record.event_id, "user deleted");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::default();
    logging::init(&config.log)?;

    let router = Router::new()
        .page("apigateway/users_userid", |req: &Request| {
            let id = req.path_parameter("userId").ok_or_else(|| Error::not_found("missing user id"))?;
            Ok(UserPage { id })
        })
        .html("apigateway/index", |_: &Request| Ok(Home))
        .stream("streams/users", |_: &Request| Ok(UserStream));
    let app = App::with_config(router, config);

    let events = [
        json!({
            "routeKey": "GET /users/{userId}",
            "pathParameters": { "userId": "42.json" },
            "requestContext": { "http": { "method": "GET" } },
        }),
        json!({
            "routeKey": "PUT /users/{userId}",
            "pathParameters": { "userId": "42" },
            "headers": { "content-type": "application/json" },
            "body": "{\"name\":\"bob\"}",
            "requestContext": { "http": { "method": "PUT" } },
        }),
        json!({
            "routeKey": "DELETE /users/{userId}",
            "pathParameters": { "userId": "42" },
            "requestContext": { "http": { "method": "DELETE" } },
        }),
        json!({
            "routeKey": "GET /",
            "requestContext": { "http": { "method": "GET" } },
        }),
        json!({
            "Records": [
                { "eventID": "1", "eventName": "INSERT", "eventSource": "aws:dynamodb",
                  "eventSourceARN": "arn:aws:dynamodb:us-east-1:1:table/users/stream/2026" },
                { "eventID": "2", "eventName": "REMOVE", "eventSource": "aws:dynamodb",
                  "eventSourceARN": "arn:aws:dynamodb:us-east-1:1:table/users/stream/2026" },
            ]
        }),
        json!({ "routeKey": "GET /missing", "requestContext": { "http": { "method": "GET" } } }),
    ];

    for event in events {
        let reply = app.dispatch_value(event).await?;
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }
    Ok(())
}
