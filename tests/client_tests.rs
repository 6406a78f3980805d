use datahub::{
    BlobRecord, Config, ConnectorType, Credential, CursorType, Datahub, DatahubError, FieldType,
    FieldValue, RawResponse, Record, RecordSchema, RequestDescription, ShardOffset,
    SubscriptionState, TopicOptions, Transport, TupleRecord, TypedRecord, ValidationError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

/// A request as the server would have seen it
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    url: String,
    authorization: String,
    body: Value,
}

/// Transport replaying scripted replies in order
#[derive(Clone, Default)]
struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<RawResponse>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl ScriptedTransport {
    fn reply(&self, status: u16, status_text: &str, body: Value) -> &Self {
        let body = if body.is_null() {
            Vec::new()
        } else {
            serde_json::to_vec(&body).unwrap()
        };
        self.replies.lock().unwrap().push_back(RawResponse {
            status,
            status_text: status_text.to_string(),
            request_id: Some("req-id".to_string()),
            body,
        });
        self
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("no request sent")
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, url: &Url, request: &RequestDescription) -> datahub::Result<RawResponse> {
        self.seen.lock().unwrap().push(Seen {
            method: request.method.to_string(),
            url: url.path().to_string(),
            authorization: request.header_str("Authorization").to_string(),
            body: request.body.clone().unwrap_or(Value::Null),
        });
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request"))
    }
}

fn client() -> (Datahub, ScriptedTransport) {
    let _ = env_logger::builder().is_test(true).try_init();

    let transport = ScriptedTransport::default();
    let config = Config::new("https://dh-cn-shanghai.aliyuncs.com").unwrap();
    let dh = Datahub::with_transport(
        config,
        Credential::new("test_id", "test_secret"),
        transport.clone(),
    );
    (dh, transport)
}

fn schema() -> RecordSchema {
    RecordSchema::default()
        .with_field("field_string", FieldType::String, true)
        .and_then(|s| s.with_field("field_integer", FieldType::Integer, true))
        .and_then(|s| s.with_field("field_boolean", FieldType::Boolean, true))
        .and_then(|s| s.with_field("field_timestamp", FieldType::Timestamp, true))
        .unwrap()
}

#[test]
fn test_project_lifecycle() {
    let (dh, transport) = client();

    transport.reply(201, "Created", Value::Null);
    let response = dh.create_project("my_project", "my project").unwrap();
    assert_eq!(response.status_text, "Created");
    assert_eq!(response.request_id.as_deref(), Some("req-id"));
    let seen = transport.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/projects/my_project");
    assert_eq!(seen.body, json!({"Comment": "my project"}));
    assert!(seen.authorization.starts_with("DATAHUB test_id:"));

    transport.reply(200, "OK", json!({"Comment": "my project", "CreateTime": 1}));
    let response = dh.get_project("my_project").unwrap();
    assert_eq!(response.get_string("Comment"), Some("my project".to_string()));
    assert_eq!(transport.last().body, Value::Null);

    transport.reply(200, "OK", Value::Null);
    dh.update_project("my_project", "new comment").unwrap();
    assert_eq!(transport.last().method, "PUT");

    transport.reply(200, "OK", json!({"ProjectNames": ["my_project"]}));
    let response = dh.list_projects().unwrap();
    assert_eq!(response.get_string("ProjectNames/0"), Some("my_project".to_string()));
    assert_eq!(transport.last().url, "/projects");

    transport.reply(200, "OK", Value::Null);
    dh.delete_project("my_project").unwrap();
    assert_eq!(transport.last().method, "DELETE");
}

#[test]
fn test_create_tuple_topic_sends_schema_string() {
    let (dh, transport) = client();
    transport.reply(201, "Created", Value::Null);

    let options = TopicOptions::tuple(schema())
        .with_comment("my topic")
        .with_shard_count(2);
    dh.create_topic("my_project", "my_topic", &options).unwrap();

    let seen = transport.last();
    assert_eq!(seen.url, "/projects/my_project/topics/my_topic");
    assert_eq!(seen.body["Action"], "create");
    assert_eq!(seen.body["ShardCount"], 2);
    assert_eq!(seen.body["Lifecycle"], 3);
    assert_eq!(seen.body["RecordType"], "TUPLE");
    let schema_str = seen.body["RecordSchema"].as_str().expect("schema is a string");
    let parsed: RecordSchema = serde_json::from_str(schema_str).unwrap();
    assert_eq!(parsed, schema());
}

#[test]
fn test_create_blob_topic_has_no_schema() {
    let (dh, transport) = client();
    transport.reply(201, "Created", Value::Null);

    dh.create_topic("my_project", "my_blob", &TopicOptions::blob())
        .unwrap();
    let seen = transport.last();
    assert_eq!(seen.body["RecordType"], "BLOB");
    assert!(seen.body.get("RecordSchema").is_none());
}

#[test]
fn test_tuple_topic_without_schema_is_rejected() {
    let (dh, transport) = client();
    let mut options = TopicOptions::tuple(schema());
    options.schema = None;

    assert!(matches!(
        dh.create_topic("p", "t", &options),
        Err(DatahubError::Validation(ValidationError::InvalidRecordData(_)))
    ));
    assert!(transport.seen.lock().unwrap().is_empty());
}

#[test]
fn test_get_topic_parses_schema() {
    let (dh, transport) = client();
    let schema_str = schema().to_json_string().unwrap();
    transport.reply(
        200,
        "OK",
        json!({"ShardCount": 1, "RecordType": "TUPLE", "RecordSchema": schema_str}),
    );

    let response = dh.get_topic("my_project", "my_topic").unwrap();
    assert!(response.data["RecordSchema"].is_object());
    assert_eq!(response.record_schema().unwrap(), Some(schema()));
}

#[test]
fn test_shard_actions() {
    let (dh, transport) = client();

    transport.reply(200, "OK", json!({"Shards": []}));
    dh.list_shards("p", "t").unwrap();
    assert_eq!(transport.last().url, "/projects/p/topics/t/shards");

    transport.reply(200, "OK", Value::Null);
    dh.split_shard("p", "t", "0", "7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF")
        .unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "split", "ShardId": "0", "SplitKey": "7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"})
    );

    transport.reply(200, "OK", Value::Null);
    dh.merge_shard("p", "t", "0", "1").unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "merge", "ShardId": "0", "AdjacentShardId": "1"})
    );
}

#[test]
fn test_get_cursor_bodies() {
    let (dh, transport) = client();

    transport.reply(200, "OK", json!({"Cursor": "c1"}));
    let response = dh.get_cursor("p", "t", "0", CursorType::Oldest).unwrap();
    assert_eq!(response.get_string("Cursor"), Some("c1".to_string()));
    let seen = transport.last();
    assert_eq!(seen.url, "/projects/p/topics/t/shards/0");
    assert_eq!(
        seen.body,
        json!({"Action": "cursor", "Type": "OLDEST", "Sequence": null, "SystemTime": null})
    );

    transport.reply(200, "OK", json!({"Cursor": "c2"}));
    dh.get_cursor("p", "t", "1", CursorType::Sequence(5)).unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "cursor", "Type": "SEQUENCE", "Sequence": 5, "SystemTime": null})
    );

    transport.reply(200, "OK", json!({"Cursor": "c3"}));
    dh.get_cursor("p", "t", "1", CursorType::SystemTime(1_599_143_251_526))
        .unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "cursor", "Type": "SYSTEM_TIME", "Sequence": null, "SystemTime": 1_599_143_251_526_i64})
    );
}

#[test]
fn test_put_records() {
    let (dh, transport) = client();
    transport.reply(200, "OK", json!({"FailedRecordCount": 0, "FailedRecords": []}));

    let mut values = TypedRecord::new();
    values.insert("field_string".into(), "abc".into());
    values.insert("field_integer".into(), FieldValue::Integer(1));
    values.insert("field_boolean".into(), false.into());
    values.insert("field_timestamp".into(), FieldValue::Integer(1_598_796_215_000));

    let records: Vec<Record> = vec![
        TupleRecord::new(&values, &schema()).unwrap().into(),
        BlobRecord::new("test").with_shard_id("1").into(),
    ];
    dh.put_records("p", "t", &records).unwrap();

    let seen = transport.last();
    assert_eq!(seen.url, "/projects/p/topics/t/shards");
    assert_eq!(
        seen.body,
        json!({
            "Action": "pub",
            "Records": [
                {"ShardId": "0", "Attributes": null, "Data": ["abc", "1", "false", "1598796215000000"]},
                {"ShardId": "1", "Attributes": null, "Data": "dGVzdA=="}
            ]
        })
    );
}

#[test]
fn test_pull_records_decodes_with_schema() {
    let (dh, transport) = client();
    let reply = json!({
        "NextCursor": "next",
        "RecordCount": 2,
        "Records": [
            {"Sequence": 0, "SystemTime": 1, "Data": ["abc", "1", "TRUE", "1598796215123456"]},
            {"Sequence": 1, "SystemTime": 2, "Data": ["def", "-2", "false", "1598796215000000"]}
        ]
    });
    transport.reply(200, "OK", reply.clone());

    let pulled = dh
        .pull_records("p", "t", "0", "cursor", 10, Some(&schema()))
        .unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "sub", "Cursor": "cursor", "Limit": 10})
    );
    assert_eq!(pulled.next_cursor(), Some("next".to_string()));

    let records = pulled.records.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["field_boolean"], FieldValue::Boolean(true));
    assert_eq!(records[1]["field_integer"], FieldValue::Integer(-2));
    assert_eq!(
        records[0]["field_timestamp"].as_time().unwrap().unix_milli(),
        1_598_796_215_123
    );

    // without a schema the raw reply is left alone
    transport.reply(200, "OK", reply.clone());
    let pulled = dh.pull_records("p", "t", "0", "cursor", 10, None).unwrap();
    assert!(pulled.records.is_none());
    assert_eq!(pulled.response.data, reply);
}

#[test]
fn test_pull_records_invalid_value() {
    let (dh, transport) = client();
    transport.reply(
        200,
        "OK",
        json!({"Records": [{"Data": ["abc", "1", "yes", "1"]}]}),
    );

    match dh.pull_records("p", "t", "0", "cursor", 10, Some(&schema())) {
        Err(DatahubError::Validation(ValidationError::InvalidBooleanValue { field, value })) => {
            assert_eq!(field, "field_boolean");
            assert_eq!(value, "yes");
        }
        other => panic!("expected InvalidBooleanValue, got {:?}", other),
    }
}

#[test]
fn test_connectors() {
    let (dh, transport) = client();

    transport.reply(200, "OK", Value::Null);
    dh.create_connector(
        "p",
        "t",
        ConnectorType::SinkOdps,
        &["field1", "field2"],
        json!({"Project": "odpsProject", "TimeRange": 60}),
    )
    .unwrap();
    let seen = transport.last();
    assert_eq!(seen.url, "/projects/p/topics/t/connectors/sink_odps");
    assert_eq!(
        seen.body,
        json!({
            "Type": "sink_odps",
            "ColumnFields": ["field1", "field2"],
            "Config": {"Project": "odpsProject", "TimeRange": 60}
        })
    );

    transport.reply(200, "OK", json!({"Connectors": ["sink_odps"]}));
    dh.list_connectors("p", "t").unwrap();
    assert_eq!(transport.last().url, "/projects/p/topics/t/connectors");

    transport.reply(200, "OK", Value::Null);
    dh.reload_connector("p", "t", ConnectorType::SinkOdps).unwrap();
    assert_eq!(transport.last().body, json!({"Action": "reload"}));

    transport.reply(200, "OK", json!({"State": "CONTEXT_EXECUTING"}));
    dh.get_connector_status("p", "t", ConnectorType::SinkOdps, "0")
        .unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "status", "ShardId": "0"})
    );

    transport.reply(200, "OK", Value::Null);
    dh.append_connector_field("p", "t", ConnectorType::SinkOdps, "new_field")
        .unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "appendfield", "FieldName": "new_field"})
    );

    transport.reply(200, "OK", Value::Null);
    dh.delete_connector("p", "t", ConnectorType::SinkOdps).unwrap();
    assert_eq!(transport.last().method, "DELETE");
}

#[test]
fn test_subscriptions_and_offsets() {
    let (dh, transport) = client();
    let sub = "1598602034559OYGWN";

    transport.reply(201, "Created", json!({"SubId": sub}));
    let response = dh.create_subscription("p", "t", "my subscription").unwrap();
    assert_eq!(response.get_string("SubId"), Some(sub.to_string()));
    assert_eq!(transport.last().url, "/projects/p/topics/t/subscriptions");

    transport.reply(200, "OK", json!({"TotalCount": 1, "Subscriptions": []}));
    dh.list_subscriptions("p", "t", 1, 10).unwrap();
    assert_eq!(
        transport.last().body,
        json!({"Action": "list", "PageIndex": 1, "PageSize": 10})
    );

    transport.reply(200, "OK", Value::Null);
    dh.update_subscription_state("p", "t", sub, SubscriptionState::Active)
        .unwrap();
    let seen = transport.last();
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.body, json!({"State": 1}));

    transport.reply(200, "OK", json!({"Offsets": {}}));
    dh.open_offset_session("p", "t", sub, &["0"]).unwrap();
    let seen = transport.last();
    assert_eq!(
        seen.url,
        format!("/projects/p/topics/t/subscriptions/{}/offsets", sub)
    );
    assert_eq!(seen.body, json!({"Action": "open", "ShardIds": ["0"]}));

    let mut offsets = BTreeMap::new();
    offsets.insert(
        "0".to_string(),
        ShardOffset {
            timestamp: 1000,
            sequence: 1,
            version: 1,
            session_id: 1,
        },
    );
    transport.reply(200, "OK", Value::Null);
    dh.commit_offsets("p", "t", sub, &offsets).unwrap();
    assert_eq!(
        transport.last().body,
        json!({
            "Action": "commit",
            "Offsets": {"0": {"Timestamp": 1000, "Sequence": 1, "Version": 1, "SessionId": 1}}
        })
    );

    transport.reply(200, "OK", Value::Null);
    dh.delete_subscription("p", "t", sub).unwrap();
    assert_eq!(transport.last().method, "DELETE");
}

#[test]
fn test_service_error_surfaces_verbatim() {
    let (dh, transport) = client();
    transport.reply(
        404,
        "Not Found",
        json!({"ErrorCode": "InvalidProjectName", "ErrorMessage": "bad name"}),
    );

    let err = dh.get_project("bad-name").unwrap_err();
    match &err {
        DatahubError::Service {
            status,
            status_text,
            error_code,
            error_message,
            request_id,
        } => {
            assert_eq!(*status, 404);
            assert_eq!(status_text, "Not Found");
            assert_eq!(error_code, "InvalidProjectName");
            assert_eq!(error_message, "bad name");
            assert_eq!(request_id.as_deref(), Some("req-id"));
        }
        other => panic!("expected service error, got {:?}", other),
    }
    assert!(err.is_not_found());
}

#[test]
fn test_every_request_is_signed_freshly() {
    let (dh, transport) = client();
    transport.reply(200, "OK", Value::Null);
    transport.reply(200, "OK", Value::Null);

    dh.get_project("a").unwrap();
    dh.get_project("b").unwrap();

    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].authorization, seen[1].authorization);
}

#[test]
fn test_names_that_would_change_the_resource_are_rejected() {
    let (dh, transport) = client();

    for name in ["p?x", "a/../b", "a b", "p#frag", "..", "", "caf\u{e9}"] {
        match dh.get_project(name) {
            Err(DatahubError::RequestBuild(_)) => {}
            other => panic!("{:?} should be rejected, got {:?}", name, other),
        }
        assert!(dh.get_topic("my_project", name).is_err());
    }
    assert!(transport.seen.lock().unwrap().is_empty());

    transport.reply(200, "OK", json!({"Comment": ""}));
    dh.get_project("my_project-1.v2").unwrap();
    assert_eq!(transport.last().url, "/projects/my_project-1.v2");
}
