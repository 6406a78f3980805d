use serde::{Deserialize, Serialize};

/// Kind of payload a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Tuple,
    Blob,
}

/// Where a cursor starts reading a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorType {
    Oldest,
    Latest,
    /// Record sequence number
    Sequence(i64),
    /// System time in epoch milliseconds
    SystemTime(i64),
}

impl CursorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorType::Oldest => "OLDEST",
            CursorType::Latest => "LATEST",
            CursorType::Sequence(_) => "SEQUENCE",
            CursorType::SystemTime(_) => "SYSTEM_TIME",
        }
    }
}

/// Target system of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    SinkOdps,
    SinkOss,
    SinkEs,
    SinkAds,
    SinkMysql,
    SinkFc,
    SinkOts,
    SinkDatahub,
}

impl ConnectorType {
    /// Path segment and `Type` value, e.g. `sink_odps`
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::SinkOdps => "sink_odps",
            ConnectorType::SinkOss => "sink_oss",
            ConnectorType::SinkEs => "sink_es",
            ConnectorType::SinkAds => "sink_ads",
            ConnectorType::SinkMysql => "sink_mysql",
            ConnectorType::SinkFc => "sink_fc",
            ConnectorType::SinkOts => "sink_ots",
            ConnectorType::SinkDatahub => "sink_datahub",
        }
    }
}

/// Subscription state as sent in `State`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    Inactive,
    Active,
}

impl SubscriptionState {
    pub fn code(&self) -> u8 {
        match self {
            SubscriptionState::Inactive => 0,
            SubscriptionState::Active => 1,
        }
    }
}

/// Consumption offset of one shard within a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShardOffset {
    pub timestamp: i64,
    pub sequence: i64,
    pub version: i64,
    pub session_id: i64,
}
