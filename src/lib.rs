//! # datahub - client for the DataHub streaming-data REST API
//!
//! A Rust client for managing DataHub projects, topics, shards, connectors
//! and subscriptions, and for putting and pulling records.
//!
//! ## Features
//!
//! - Every request signed with HMAC-SHA1 over a canonical request string
//!   (`Authorization: DATAHUB {accessKeyId}:{signature}`)
//! - Typed record schemas with a codec between wire string arrays and
//!   typed values
//! - BLOB records with transparent base64 encoding
//! - Service errors surfaced with their HTTP status, error code and message
//! - Pluggable transport, a pooled reqwest client by default
//!
//! ## Basic Usage
//!
//! ```no_run
//! use datahub::{Config, Credential, CursorType, Datahub, FieldType, RecordSchema, TopicOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("https://dh-cn-shanghai.aliyuncs.com")?;
//!     let dh = Datahub::new(config, Credential::new("access_key_id", "access_key_secret"))?;
//!
//!     let schema = RecordSchema::default()
//!         .with_field("name", FieldType::String, true)?
//!         .with_field("age", FieldType::Integer, false)?;
//!     dh.create_topic("my_project", "my_topic", &TopicOptions::tuple(schema.clone()))?;
//!
//!     let cursor = dh.get_cursor("my_project", "my_topic", "0", CursorType::Oldest)?;
//!     let cursor = cursor.get_string("Cursor").unwrap_or_default();
//!     let pulled = dh.pull_records("my_project", "my_topic", "0", &cursor, 10, Some(&schema))?;
//!     for record in pulled.records.unwrap_or_default() {
//!         println!("{:?}", record.get("name"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Putting records
//!
//! ```no_run
//! use datahub::{BlobRecord, Config, Credential, Datahub, Record};
//!
//! let dh = Datahub::new(
//!     Config::new("https://dh-cn-shanghai.aliyuncs.com")?,
//!     Credential::new("access_key_id", "access_key_secret"),
//! )?;
//! let records: Vec<Record> = vec![BlobRecord::new(b"hello").with_shard_id("0").into()];
//! dh.put_records("my_project", "my_blob_topic", &records)?;
//! # Ok::<(), datahub::DatahubError>(())
//! ```

pub mod client;
pub mod credential;
pub mod datahub;
pub mod error;
pub mod hash;
pub mod model;
pub mod record;
pub mod request;
pub mod response;
pub mod rest;
pub mod sign;
pub mod time;

// Re-export main types for convenience
pub use client::{Config, HttpTransport, RawResponse, Transport};
pub use credential::Credential;
pub use datahub::{Datahub, PullResult, TopicOptions};
pub use error::{DatahubError, Result, ValidationError};
pub use model::{ConnectorType, CursorType, RecordType, ShardOffset, SubscriptionState};
pub use record::{
    Attributes, BlobRecord, Field, FieldType, FieldValue, Record, RecordSchema, TupleRecord,
    TypedRecord,
};
pub use request::RequestDescription;
pub use response::Response;
pub use rest::RestContext;
pub use time::Time;

// Re-export serde_json for convenience
pub use serde_json::json;
