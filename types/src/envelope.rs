//! The remote response envelope.

use crate::entity::EntityRecord;
use serde::Deserialize;
use serde_json::Value;

/// Success flag as encoded on the wire.
///
/// Most endpoints return a boolean `status`; the instructors endpoint
/// returns the string literal `"success"`. Both are normalized here at
/// the boundary so nothing above the gateway sees the difference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusFlag {
    Flag(bool),
    Literal(String),
}

impl StatusFlag {
    pub fn is_success(&self) -> bool {
        match self {
            StatusFlag::Flag(flag) => *flag,
            StatusFlag::Literal(text) => text.eq_ignore_ascii_case("success"),
        }
    }
}

/// Raw shape of one remote response:
/// `{status: bool|"success", data?: object|array, message?: string}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: StatusFlag,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Records carried in the payload. Missing data is an empty list;
    /// a single object is one record.
    pub fn records(&self) -> Vec<EntityRecord> {
        match &self.data {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(Value::Object(_)) => self.record().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Single record payload, when the envelope carries an object.
    pub fn record(&self) -> Option<EntityRecord> {
        match &self.data {
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}
