//! Record schemas and the codec between wire records and typed values.
//!
//! On the wire a tuple record is an array of strings aligned with the
//! topic schema. [`decode`] turns such an array into named, typed values
//! and [`encode`] goes the other way.
//!
//! TIMESTAMP fields are not symmetric: the service stores microseconds,
//! decoding keeps only the first 13 digits (milliseconds) and encoding
//! multiplies milliseconds by 1000. Sub-millisecond precision is lost.
//!
//! Numbers round-trip by value, not by text: integers and doubles are
//! re-rendered in canonical form, so `"007"` encodes back as `"7"` and
//! `"1.0"` as `"1"`. DECIMAL keeps its text.

use crate::error::{Result, ValidationError};
use crate::hash::{base64_decode, base64_encode};
use crate::time::Time;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Number of leading digits of a microsecond epoch that form milliseconds.
const MILLIS_DIGITS: usize = 13;

/// A decoded tuple record, keyed by field name in schema order.
pub type TypedRecord = IndexMap<String, FieldValue>;

/// Record attributes, free-form string pairs.
pub type Attributes = HashMap<String, String>;

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Boolean,
    Tinyint,
    Smallint,
    Integer,
    Bigint,
    Float,
    Double,
    Timestamp,
    Decimal,
}

impl FieldType {
    /// Lower-case type tag as used in schema JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Tinyint => "tinyint",
            FieldType::Smallint => "smallint",
            FieldType::Integer => "integer",
            FieldType::Bigint => "bigint",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Timestamp => "timestamp",
            FieldType::Decimal => "decimal",
        }
    }

    /// Inclusive value range of the integer types
    fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            FieldType::Tinyint => Some((i8::MIN as i64, i8::MAX as i64)),
            FieldType::Smallint => Some((i16::MIN as i64, i16::MAX as i64)),
            FieldType::Integer => Some((i32::MIN as i64, i32::MAX as i64)),
            FieldType::Bigint => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    /// Type tags are matched case-insensitively
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "boolean" => Ok(FieldType::Boolean),
            "tinyint" => Ok(FieldType::Tinyint),
            "smallint" => Ok(FieldType::Smallint),
            "integer" => Ok(FieldType::Integer),
            "bigint" => Ok(FieldType::Bigint),
            "float" => Ok(FieldType::Float),
            "double" => Ok(FieldType::Double),
            "timestamp" => Ok(FieldType::Timestamp),
            "decimal" => Ok(FieldType::Decimal),
            _ => Err(ValidationError::UnknownFieldType(s.to_string())),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// One column of a tuple topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub notnull: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, notnull: bool) -> Self {
        Field {
            name: name.into(),
            field_type,
            notnull,
        }
    }
}

/// Ordered field list. Position `i` lines up with `data[i]` of every
/// wire record of the topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordSchema {
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Build a schema, rejecting empty or duplicate field names
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        {
            let mut seen = HashSet::new();
            for field in &fields {
                if field.name.is_empty() {
                    return Err(ValidationError::InvalidRecordData("empty field name".to_string()).into());
                }
                if !seen.insert(field.name.as_str()) {
                    return Err(ValidationError::DuplicateField(field.name.clone()).into());
                }
            }
        }
        Ok(RecordSchema { fields })
    }

    /// Append a field, builder style
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        notnull: bool,
    ) -> Result<Self> {
        self.fields.push(Field::new(name, field_type, notnull));
        RecordSchema::new(self.fields)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON text sent as `RecordSchema` when creating a topic
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    /// tinyint, smallint, integer and bigint
    Integer(i64),
    /// float and double
    Double(f64),
    /// Validated numeric text, kept verbatim
    Decimal(String),
    Timestamp(Time),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) | FieldValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Time> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(d: f64) -> Self {
        FieldValue::Double(d)
    }
}

impl From<Time> for FieldValue {
    fn from(t: Time) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for FieldValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        FieldValue::Timestamp(Time(dt))
    }
}

fn invalid_number(field: &Field, value: &str) -> ValidationError {
    ValidationError::InvalidNumber {
        field: field.name.clone(),
        field_type: field.field_type.to_string(),
        value: value.to_string(),
    }
}

fn parse_finite(field: &Field, raw: &str) -> std::result::Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid_number(field, raw)),
    }
}

/// Convert one wire string into a typed value.
pub fn decode_value(raw: &str, field: &Field) -> std::result::Result<FieldValue, ValidationError> {
    match field.field_type {
        FieldType::Boolean => match raw.to_lowercase().as_str() {
            "true" => Ok(FieldValue::Boolean(true)),
            "false" => Ok(FieldValue::Boolean(false)),
            _ => Err(ValidationError::InvalidBooleanValue {
                field: field.name.clone(),
                value: raw.to_string(),
            }),
        },
        FieldType::Tinyint | FieldType::Smallint | FieldType::Integer | FieldType::Bigint => {
            let value: i64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid_number(field, raw))?;
            check_range(field, value, raw)?;
            Ok(FieldValue::Integer(value))
        }
        FieldType::Float | FieldType::Double => Ok(FieldValue::Double(parse_finite(field, raw)?)),
        FieldType::Decimal => {
            parse_finite(field, raw)?;
            Ok(FieldValue::Decimal(raw.to_string()))
        }
        FieldType::Timestamp => {
            let invalid = || ValidationError::InvalidTimestamp {
                field: field.name.clone(),
                value: raw.to_string(),
            };
            let millis = raw.get(..MILLIS_DIGITS).unwrap_or(raw);
            let millis: i64 = millis.parse().map_err(|_| invalid())?;
            Time::from_unix_milli(millis)
                .map(FieldValue::Timestamp)
                .ok_or_else(invalid)
        }
        FieldType::String => Ok(FieldValue::String(raw.to_string())),
    }
}

fn check_range(field: &Field, value: i64, shown: &str) -> std::result::Result<(), ValidationError> {
    if let Some((min, max)) = field.field_type.integer_range() {
        if value < min || value > max {
            return Err(invalid_number(field, shown));
        }
    }
    Ok(())
}

/// Convert one typed value into its wire string.
pub fn encode_value(value: &FieldValue, field: &Field) -> std::result::Result<String, ValidationError> {
    let mismatch = |expected: &str| ValidationError::TypeMismatch {
        field: field.name.clone(),
        expected: expected.to_string(),
    };

    match (field.field_type, value) {
        (FieldType::String, FieldValue::String(s)) => Ok(s.clone()),
        (FieldType::String, _) => Err(mismatch("a string")),

        (FieldType::Boolean, FieldValue::Boolean(b)) => Ok(b.to_string()),
        (FieldType::Boolean, _) => Err(mismatch("a boolean")),

        (FieldType::Tinyint | FieldType::Smallint | FieldType::Integer | FieldType::Bigint, FieldValue::Integer(i)) => {
            check_range(field, *i, &i.to_string())?;
            Ok(i.to_string())
        }
        (FieldType::Tinyint | FieldType::Smallint | FieldType::Integer | FieldType::Bigint, _) => {
            Err(mismatch("an integer"))
        }

        (FieldType::Float | FieldType::Double, FieldValue::Double(d)) => {
            if !d.is_finite() {
                return Err(invalid_number(field, &d.to_string()));
            }
            Ok(d.to_string())
        }
        (FieldType::Float | FieldType::Double, FieldValue::Integer(i)) => Ok(i.to_string()),
        (FieldType::Float | FieldType::Double, _) => Err(mismatch("a number")),

        (FieldType::Decimal, FieldValue::Decimal(s)) => {
            parse_finite(field, s)?;
            Ok(s.clone())
        }
        (FieldType::Decimal, FieldValue::Integer(i)) => Ok(i.to_string()),
        (FieldType::Decimal, FieldValue::Double(d)) if d.is_finite() => Ok(d.to_string()),
        (FieldType::Decimal, _) => Err(mismatch("a decimal")),

        (FieldType::Timestamp, FieldValue::Timestamp(t)) => Ok((t.unix_milli() * 1000).to_string()),
        (FieldType::Timestamp, FieldValue::Integer(ms)) => ms
            .checked_mul(1000)
            .map(|us| us.to_string())
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                field: field.name.clone(),
                value: ms.to_string(),
            }),
        (FieldType::Timestamp, _) => Err(mismatch("a timestamp")),
    }
}

/// Wire-to-typed: turn a wire data array into named typed values.
pub fn decode(raw: &[String], schema: &RecordSchema) -> Result<TypedRecord> {
    if raw.len() != schema.fields.len() {
        return Err(ValidationError::FieldCountMismatch {
            expected: schema.fields.len(),
            actual: raw.len(),
        }
        .into());
    }

    let mut record = TypedRecord::with_capacity(raw.len());
    for (value, field) in raw.iter().zip(&schema.fields) {
        record.insert(field.name.clone(), decode_value(value, field)?);
    }
    Ok(record)
}

/// Typed-to-wire: lay named values out in schema order.
pub fn encode(values: &TypedRecord, schema: &RecordSchema) -> Result<Vec<String>> {
    schema
        .fields
        .iter()
        .map(|field| -> Result<String> {
            let value = values
                .get(&field.name)
                .ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
            Ok(encode_value(value, field)?)
        })
        .collect()
}

/// A record of a TUPLE topic, ready to be put.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleRecord {
    #[serde(rename = "ShardId")]
    pub shard_id: String,
    #[serde(rename = "Attributes")]
    pub attributes: Option<Attributes>,
    #[serde(rename = "Data")]
    pub data: Vec<String>,
}

impl TupleRecord {
    /// Encode typed values against the schema, targeting shard "0"
    pub fn new(values: &TypedRecord, schema: &RecordSchema) -> Result<Self> {
        Ok(TupleRecord {
            shard_id: "0".to_string(),
            attributes: None,
            data: encode(values, schema)?,
        })
    }

    pub fn with_shard_id(mut self, shard_id: impl Into<String>) -> Self {
        self.shard_id = shard_id.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Decode the wire data back into typed values
    pub fn parse(&self, schema: &RecordSchema) -> Result<TypedRecord> {
        decode(&self.data, schema)
    }
}

/// A record of a BLOB topic; the payload travels base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(rename = "ShardId")]
    pub shard_id: String,
    #[serde(rename = "Attributes")]
    pub attributes: Option<Attributes>,
    #[serde(rename = "Data")]
    pub data: String,
}

impl BlobRecord {
    /// Encode a binary payload, targeting shard "0"
    pub fn new(payload: impl AsRef<[u8]>) -> Self {
        BlobRecord {
            shard_id: "0".to_string(),
            attributes: None,
            data: base64_encode(payload.as_ref()),
        }
    }

    pub fn with_shard_id(mut self, shard_id: impl Into<String>) -> Self {
        self.shard_id = shard_id.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// The original binary payload
    pub fn payload(&self) -> Result<Vec<u8>> {
        base64_decode(&self.data)
    }
}

/// Either kind of record accepted by a put.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Tuple(TupleRecord),
    Blob(BlobRecord),
}

impl From<TupleRecord> for Record {
    fn from(r: TupleRecord) -> Self {
        Record::Tuple(r)
    }
}

impl From<BlobRecord> for Record {
    fn from(r: BlobRecord) -> Self {
        Record::Blob(r)
    }
}
