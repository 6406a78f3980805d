use crate::error::Result;
use crate::record::RecordSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response represents a successful DataHub reply: HTTP status line plus
/// the decoded JSON body (`Null` when the body was empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Canonical reason phrase, e.g. "OK" or "Created"
    pub status_text: String,

    /// Response body
    pub data: Value,

    /// `x-datahub-request-id` header from the HTTP response (not serialized)
    #[serde(skip)]
    pub request_id: Option<String>,
}

impl Response {
    /// Get the raw data value from the response
    pub fn raw(&self) -> &Value {
        &self.data
    }

    /// Apply unmarshals the response data into the provided type
    pub fn apply<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Get a value from the response data by a slash-separated path.
    /// For example, "Records/0/Data" would access the data of the first record.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut current = &self.data;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get a string value from the response data by a slash-separated path
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// The topic schema carried by a get-topic reply, if any
    pub fn record_schema(&self) -> Result<Option<RecordSchema>> {
        match self.get("RecordSchema") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(serde_json::from_str(s)?)),
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
        }
    }
}
