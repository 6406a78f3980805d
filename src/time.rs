use chrono::{DateTime, TimeZone, Utc};
use std::ops::Deref;

/// RFC 1123 layout used by the `Date` request header.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Time wraps chrono::DateTime and carries the conversions the DataHub
/// wire format needs: HTTP dates for signing and epoch units for
/// TIMESTAMP fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(pub DateTime<Utc>);

impl Time {
    /// Create a new Time from a DateTime
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Time(Utc::now())
    }

    /// Create a Time from epoch milliseconds, `None` when out of range
    pub fn from_unix_milli(ms: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(ms).single().map(Time)
    }

    /// Get the timestamp in milliseconds
    pub fn unix_milli(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Get the timestamp in microseconds
    pub fn unix_micro(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// Format as an RFC 1123 GMT string, e.g. `Mon, 01 Jan 2024 00:00:00 GMT`
    pub fn http_date(&self) -> String {
        self.0.format(HTTP_DATE_FORMAT).to_string()
    }
}

impl Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(t: Time) -> Self {
        t.0
    }
}
