//! The DataHub REST surface.
//!
//! Every operation maps its arguments onto a fixed path template and a
//! JSON body, then goes through [`RestContext::execute`]. Multi-purpose
//! endpoints are told apart by the body's `Action` field.

use crate::client::{Config, Transport};
use crate::credential::Credential;
use crate::error::{Result, ValidationError};
use crate::model::{ConnectorType, CursorType, RecordType, ShardOffset, SubscriptionState};
use crate::record::{decode, FieldType, Record, RecordSchema, TypedRecord};
use crate::response::Response;
use crate::rest::RestContext;
use log::debug;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Settings of a new topic.
#[derive(Debug, Clone)]
pub struct TopicOptions {
    pub record_type: RecordType,
    /// Required for TUPLE topics, ignored for BLOB
    pub schema: Option<RecordSchema>,
    pub shard_count: u32,
    /// Retention in days
    pub lifecycle: u32,
    pub comment: String,
}

impl TopicOptions {
    /// A TUPLE topic with one shard kept for three days
    pub fn tuple(schema: RecordSchema) -> Self {
        TopicOptions {
            record_type: RecordType::Tuple,
            schema: Some(schema),
            shard_count: 1,
            lifecycle: 3,
            comment: String::new(),
        }
    }

    /// A BLOB topic with one shard kept for three days
    pub fn blob() -> Self {
        TopicOptions {
            record_type: RecordType::Blob,
            schema: None,
            shard_count: 1,
            lifecycle: 3,
            comment: String::new(),
        }
    }

    pub fn with_shard_count(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: u32) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Result of a pull. `records` holds the typed tuples when a schema was
/// supplied; the untouched reply is always in `response`.
#[derive(Debug, Clone)]
pub struct PullResult {
    pub response: Response,
    pub records: Option<Vec<TypedRecord>>,
}

impl PullResult {
    /// Cursor to continue reading from
    pub fn next_cursor(&self) -> Option<String> {
        self.response.get_string("NextCursor")
    }
}

/// DataHub client.
///
/// ```no_run
/// use datahub::{Config, Credential, Datahub};
///
/// let config = Config::new("https://dh-cn-shanghai.aliyuncs.com")?;
/// let dh = Datahub::new(config, Credential::new("access_key_id", "access_key_secret"))?;
/// let projects = dh.list_projects()?;
/// println!("{:?}", projects.get("ProjectNames"));
/// # Ok::<(), datahub::DatahubError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Datahub {
    rest: RestContext,
}

impl Datahub {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: Config, credential: Credential) -> Result<Self> {
        Ok(Datahub {
            rest: RestContext::new(config, credential)?,
        })
    }

    /// Create a client over a custom transport
    pub fn with_transport(
        config: Config,
        credential: Credential,
        transport: impl Transport + 'static,
    ) -> Self {
        Datahub {
            rest: RestContext::with_transport(config, credential, transport),
        }
    }

    /// The underlying request dispatcher
    pub fn rest(&self) -> &RestContext {
        &self.rest
    }

    // === Projects ===

    pub fn create_project(&self, project: &str, comment: &str) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &format!("/projects/{}", project),
            Some(json!({ "Comment": comment })),
        )
    }

    pub fn get_project(&self, project: &str) -> Result<Response> {
        self.rest
            .execute(Method::GET, &format!("/projects/{}", project), None)
    }

    pub fn update_project(&self, project: &str, comment: &str) -> Result<Response> {
        self.rest.execute(
            Method::PUT,
            &format!("/projects/{}", project),
            Some(json!({ "Comment": comment })),
        )
    }

    pub fn delete_project(&self, project: &str) -> Result<Response> {
        self.rest
            .execute(Method::DELETE, &format!("/projects/{}", project), None)
    }

    pub fn list_projects(&self) -> Result<Response> {
        self.rest.execute(Method::GET, "/projects", None)
    }

    // === Topics ===

    /// Create a topic. TUPLE topics send their schema as a JSON string.
    pub fn create_topic(&self, project: &str, topic: &str, options: &TopicOptions) -> Result<Response> {
        let mut body = json!({
            "Action": "create",
            "ShardCount": options.shard_count,
            "Lifecycle": options.lifecycle,
            "RecordType": options.record_type,
            "Comment": options.comment,
        });
        if options.record_type == RecordType::Tuple {
            let schema = options.schema.as_ref().ok_or_else(|| {
                ValidationError::InvalidRecordData("a TUPLE topic needs a record schema".to_string())
            })?;
            body["RecordSchema"] = Value::String(schema.to_json_string()?);
        }

        self.rest
            .execute(Method::POST, &topic_path(project, topic), Some(body))
    }

    /// Get a topic; the `RecordSchema` string in the reply is parsed into JSON
    pub fn get_topic(&self, project: &str, topic: &str) -> Result<Response> {
        let mut response = self
            .rest
            .execute(Method::GET, &topic_path(project, topic), None)?;

        if let Some(Value::String(schema)) = response.data.get("RecordSchema") {
            let parsed: Value = serde_json::from_str(schema)?;
            response.data["RecordSchema"] = parsed;
        }
        Ok(response)
    }

    pub fn update_topic(&self, project: &str, topic: &str, comment: &str) -> Result<Response> {
        self.rest.execute(
            Method::PUT,
            &topic_path(project, topic),
            Some(json!({ "Comment": comment })),
        )
    }

    pub fn delete_topic(&self, project: &str, topic: &str) -> Result<Response> {
        self.rest
            .execute(Method::DELETE, &topic_path(project, topic), None)
    }

    pub fn list_topics(&self, project: &str) -> Result<Response> {
        self.rest
            .execute(Method::GET, &format!("/projects/{}/topics", project), None)
    }

    /// Add a column to a TUPLE topic
    pub fn append_field(
        &self,
        project: &str,
        topic: &str,
        field_name: &str,
        field_type: FieldType,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &topic_path(project, topic),
            Some(json!({
                "Action": "appendfield",
                "FieldName": field_name,
                "FieldType": field_type,
            })),
        )
    }

    // === Shards ===

    pub fn list_shards(&self, project: &str, topic: &str) -> Result<Response> {
        self.rest
            .execute(Method::GET, &shards_path(project, topic), None)
    }

    pub fn split_shard(
        &self,
        project: &str,
        topic: &str,
        shard_id: &str,
        split_key: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &shards_path(project, topic),
            Some(json!({
                "Action": "split",
                "ShardId": shard_id,
                "SplitKey": split_key,
            })),
        )
    }

    pub fn merge_shard(
        &self,
        project: &str,
        topic: &str,
        shard_id: &str,
        adjacent_shard_id: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &shards_path(project, topic),
            Some(json!({
                "Action": "merge",
                "ShardId": shard_id,
                "AdjacentShardId": adjacent_shard_id,
            })),
        )
    }

    /// Obtain a cursor into a shard
    pub fn get_cursor(
        &self,
        project: &str,
        topic: &str,
        shard_id: &str,
        cursor_type: CursorType,
    ) -> Result<Response> {
        let (sequence, system_time) = match cursor_type {
            CursorType::Sequence(seq) => (Some(seq), None),
            CursorType::SystemTime(ts) => (None, Some(ts)),
            CursorType::Oldest | CursorType::Latest => (None, None),
        };

        self.rest.execute(
            Method::POST,
            &shard_path(project, topic, shard_id),
            Some(json!({
                "Action": "cursor",
                "Type": cursor_type.as_str(),
                "Sequence": sequence,
                "SystemTime": system_time,
            })),
        )
    }

    // === Records ===

    /// Put records; each record names its own shard
    pub fn put_records(&self, project: &str, topic: &str, records: &[Record]) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &shards_path(project, topic),
            Some(json!({
                "Action": "pub",
                "Records": records,
            })),
        )
    }

    /// Read up to `limit` records from `cursor`. With a schema the
    /// `Records[].Data` string arrays are decoded into typed tuples.
    pub fn pull_records(
        &self,
        project: &str,
        topic: &str,
        shard_id: &str,
        cursor: &str,
        limit: u32,
        schema: Option<&RecordSchema>,
    ) -> Result<PullResult> {
        let response = self.rest.execute(
            Method::POST,
            &shard_path(project, topic, shard_id),
            Some(json!({
                "Action": "sub",
                "Cursor": cursor,
                "Limit": limit,
            })),
        )?;

        let records = match schema {
            Some(schema) => Some(decode_pulled(&response, schema)?),
            None => None,
        };
        if let Some(records) = &records {
            debug!("[datahub] decoded {} records from shard {}", records.len(), shard_id);
        }

        Ok(PullResult { response, records })
    }

    // === Connectors ===

    pub fn create_connector(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
        column_fields: &[&str],
        config: Value,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &connector_path(project, topic, connector_type),
            Some(json!({
                "Type": connector_type,
                "ColumnFields": column_fields,
                "Config": config,
            })),
        )
    }

    pub fn get_connector(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
    ) -> Result<Response> {
        self.rest.execute(
            Method::GET,
            &connector_path(project, topic, connector_type),
            None,
        )
    }

    pub fn list_connectors(&self, project: &str, topic: &str) -> Result<Response> {
        self.rest.execute(
            Method::GET,
            &format!("{}/connectors", topic_path(project, topic)),
            None,
        )
    }

    pub fn delete_connector(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
    ) -> Result<Response> {
        self.rest.execute(
            Method::DELETE,
            &connector_path(project, topic, connector_type),
            None,
        )
    }

    pub fn reload_connector(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &connector_path(project, topic, connector_type),
            Some(json!({ "Action": "reload" })),
        )
    }

    /// Sync status of one shard of a connector
    pub fn get_connector_status(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
        shard_id: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &connector_path(project, topic, connector_type),
            Some(json!({
                "Action": "status",
                "ShardId": shard_id,
            })),
        )
    }

    pub fn append_connector_field(
        &self,
        project: &str,
        topic: &str,
        connector_type: ConnectorType,
        field_name: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &connector_path(project, topic, connector_type),
            Some(json!({
                "Action": "appendfield",
                "FieldName": field_name,
            })),
        )
    }

    // === Subscriptions ===

    pub fn create_subscription(&self, project: &str, topic: &str, comment: &str) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &subscriptions_path(project, topic),
            Some(json!({
                "Action": "create",
                "Comment": comment,
            })),
        )
    }

    pub fn get_subscription(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::GET,
            &subscription_path(project, topic, subscription_id),
            None,
        )
    }

    /// List subscriptions, `page_index` starts at 1
    pub fn list_subscriptions(
        &self,
        project: &str,
        topic: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &subscriptions_path(project, topic),
            Some(json!({
                "Action": "list",
                "PageIndex": page_index,
                "PageSize": page_size,
            })),
        )
    }

    pub fn delete_subscription(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
    ) -> Result<Response> {
        self.rest.execute(
            Method::DELETE,
            &subscription_path(project, topic, subscription_id),
            None,
        )
    }

    pub fn update_subscription_state(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
        state: SubscriptionState,
    ) -> Result<Response> {
        self.rest.execute(
            Method::PUT,
            &subscription_path(project, topic, subscription_id),
            Some(json!({ "State": state.code() })),
        )
    }

    // === Offsets ===

    /// Open an offset session on the given shards
    pub fn open_offset_session(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
        shard_ids: &[&str],
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &offsets_path(project, topic, subscription_id),
            Some(json!({
                "Action": "open",
                "ShardIds": shard_ids,
            })),
        )
    }

    pub fn get_offsets(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
        shard_ids: &[&str],
    ) -> Result<Response> {
        self.rest.execute(
            Method::POST,
            &offsets_path(project, topic, subscription_id),
            Some(json!({
                "Action": "get",
                "ShardIds": shard_ids,
            })),
        )
    }

    /// Commit offsets keyed by shard id
    pub fn commit_offsets(
        &self,
        project: &str,
        topic: &str,
        subscription_id: &str,
        offsets: &BTreeMap<String, ShardOffset>,
    ) -> Result<Response> {
        self.rest.execute(
            Method::PUT,
            &offsets_path(project, topic, subscription_id),
            Some(json!({
                "Action": "commit",
                "Offsets": offsets,
            })),
        )
    }
}

fn decode_pulled(response: &Response, schema: &RecordSchema) -> Result<Vec<TypedRecord>> {
    let records = match response.get("Records") {
        Some(Value::Array(records)) => records,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(_) => {
            return Err(ValidationError::InvalidRecordData("Records is not an array".to_string()).into())
        }
    };

    records
        .iter()
        .map(|record| -> Result<TypedRecord> {
            let data: Vec<String> = record
                .get("Data")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .ok_or_else(|| ValidationError::InvalidRecordData("record without Data".to_string()))?;
            decode(&data, schema)
        })
        .collect()
}

fn topic_path(project: &str, topic: &str) -> String {
    format!("/projects/{}/topics/{}", project, topic)
}

fn shards_path(project: &str, topic: &str) -> String {
    format!("{}/shards", topic_path(project, topic))
}

fn shard_path(project: &str, topic: &str, shard_id: &str) -> String {
    format!("{}/{}", shards_path(project, topic), shard_id)
}

fn connector_path(project: &str, topic: &str, connector_type: ConnectorType) -> String {
    format!("{}/connectors/{}", topic_path(project, topic), connector_type.as_str())
}

fn subscriptions_path(project: &str, topic: &str) -> String {
    format!("{}/subscriptions", topic_path(project, topic))
}

fn subscription_path(project: &str, topic: &str, subscription_id: &str) -> String {
    format!("{}/{}", subscriptions_path(project, topic), subscription_id)
}

fn offsets_path(project: &str, topic: &str, subscription_id: &str) -> String {
    format!("{}/offsets", subscription_path(project, topic, subscription_id))
}
