use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// First and only frame the client sends on a fresh connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct InitMessage {
    pub(crate) link: String,
    pub(crate) interval: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ServerMessage {
    Sample(SampleFrame),
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SampleFrame {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub(crate) ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) ok: bool,
    #[serde(default)]
    pub(crate) latency_ms: Option<f64>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sample {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) ok: bool,
    pub(crate) latency_ms: Option<f64>,
    pub(crate) error: Option<String>,
}

impl Sample {
    /// Latency is only kept for successes and the error text only for failures.
    pub(crate) fn from_frame(frame: SampleFrame, received_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: frame.ts.unwrap_or(received_at),
            ok: frame.ok,
            latency_ms: if frame.ok { frame.latency_ms } else { None },
            error: if frame.ok {
                None
            } else {
                frame.error.filter(|e| !e.is_empty())
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerRecord {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) raw_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum CheckStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckRecord {
    #[serde(deserialize_with = "utc_or_naive")]
    pub(crate) checked_at: DateTime<Utc>,
    pub(crate) status: CheckStatus,
    #[serde(default)]
    pub(crate) latency_ms: Option<f64>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

/// Epoch milliseconds or RFC 3339. Anything else yields `None` rather than an error.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => n
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
        Value::String(s) => parse_utc(&s),
        _ => None,
    })
}

fn utc_or_naive<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

// The backend stores naive UTC datetimes, so values without an offset are taken as UTC.
fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
