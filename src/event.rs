//! The inbound platform event, as serde sees it.
//!
//! One struct covers every shape lamina routes: HTTP API (payload v2),
//! S3 notifications, Cognito triggers, scheduled EventBridge rules, DynamoDB
//! streams and SES. Fields a given shape does not carry are simply absent.
//!
//! The platform is not always tidy. API Gateway sends `null` for empty
//! parameter maps, and hand-built test events put odd things in `cookies`.
//! Every field is therefore read leniently: a value of the wrong shape is
//! treated as missing instead of failing the whole event.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A raw cloud function event.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "Records", default, deserialize_with = "lenient_records", skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,

    // ── HTTP API ──────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub route_key: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub request_context: Option<RequestContext>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub is_base64_encoded: bool,

    // ── Cognito ───────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<String>,

    // ── Scheduled (EventBridge) ───────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cron_file_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpContext>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpContext {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

/// One entry of an event's `Records` list.
///
/// Only the fields lamina routes on are typed. Everything else (the
/// `dynamodb` images, SES mail, ...) is kept in [`Record::extra`] for the
/// handler to read.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Record {
    #[serde(rename = "eventSource", alias = "EventSource", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(rename = "eventName", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(rename = "eventID", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(rename = "eventSourceARN", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Entity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// An untyped field of the record, e.g. `record.get("dynamodb")`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct S3Bucket {
    pub name: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Records are read one by one, so a single odd entry does not cost the
/// rest of the batch. Entries that are not objects are skipped.
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<Record>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<Value> = lenient_or_default(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_an_http_api_event() {
        let event: Event = serde_json::from_value(json!({
            "routeKey": "GET /users/{id}",
            "rawPath": "/dev/users/42",
            "requestContext": { "http": { "method": "GET" }, "stage": "dev" },
            "pathParameters": { "id": "42" },
            "queryStringParameters": null,
            "cookies": ["a=b"],
        }))
        .unwrap();

        assert_eq!(event.route_key.as_deref(), Some("GET /users/{id}"));
        assert_eq!(event.request_context.unwrap().http.unwrap().method.as_deref(), Some("GET"));
        assert_eq!(event.path_parameters.unwrap()["id"], "42");
        assert!(event.query_string_parameters.is_none());
        assert_eq!(event.cookies.unwrap(), vec!["a=b"]);
    }

    #[test]
    fn malformed_cookies_are_treated_as_absent() {
        let event: Event = serde_json::from_value(json!({
            "routeKey": "GET /page",
            "cookies": "not-a-list",
        }))
        .unwrap();
        assert!(event.cookies.is_none());
    }

    #[test]
    fn records_keep_untyped_fields() {
        let event: Event = serde_json::from_value(json!({
            "Records": [{
                "eventID": "1",
                "eventName": "INSERT",
                "eventSource": "aws:dynamodb",
                "eventSourceARN": "arn:aws:dynamodb:us-east-1:1:table/t/stream/x",
                "dynamodb": { "Keys": { "Id": { "N": "101" } } },
            }]
        }))
        .unwrap();

        let record = &event.records[0];
        assert_eq!(record.event_id.as_deref(), Some("1"));
        assert_eq!(record.get("dynamodb").unwrap()["Keys"]["Id"]["N"], "101");
    }

    #[test]
    fn one_odd_record_does_not_drop_the_batch() {
        let arn = "arn:aws:dynamodb:us-east-1:1:table/t/stream/x";
        let event: Event = serde_json::from_value(json!({
            "Records": [
                { "eventID": "1", "eventName": "INSERT", "eventSource": "aws:dynamodb", "eventSourceARN": arn },
                { "eventID": 7, "eventName": "MODIFY", "eventSource": "aws:dynamodb", "eventSourceARN": arn },
                "garbage",
            ]
        }))
        .unwrap();

        assert_eq!(event.records.len(), 2);
        assert_eq!(event.records[1].event_id, None);
        assert_eq!(event.records[1].event_name.as_deref(), Some("MODIFY"));
    }

    #[test]
    fn malformed_scalars_are_treated_as_absent() {
        let event: Event = serde_json::from_value(json!({
            "routeKey": "GET /x",
            "requestContext": { "http": {} },
            "body": { "not": "a string" },
            "isBase64Encoded": null,
        }))
        .unwrap();

        assert_eq!(event.route_key.as_deref(), Some("GET /x"));
        assert_eq!(event.request_context.unwrap().http.unwrap().method, None);
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);
    }
}
