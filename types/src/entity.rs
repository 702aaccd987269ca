//! Entity kinds and generic keyed records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The seven record types managed by the AMS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Attendance,
    Student,
    Class,
    Instructor,
    Notification,
    Parent,
    Relationship,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Attendance,
        EntityKind::Student,
        EntityKind::Class,
        EntityKind::Instructor,
        EntityKind::Notification,
        EntityKind::Parent,
        EntityKind::Relationship,
    ];

    /// Table name used by the remote endpoint for this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Attendance => "attendancerecords",
            EntityKind::Student => "students",
            EntityKind::Class => "classes",
            EntityKind::Instructor => "instructors",
            EntityKind::Notification => "notifications",
            EntityKind::Parent => "parents",
            EntityKind::Relationship => "studentparentrelationship",
        }
    }

    /// Parse a user-supplied kind name (case-insensitive, singular or
    /// plural).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "attendance" | "attendancerecord" | "attendancerecords" => {
                Some(EntityKind::Attendance)
            }
            "student" | "students" => Some(EntityKind::Student),
            "class" | "classes" => Some(EntityKind::Class),
            "instructor" | "instructors" => Some(EntityKind::Instructor),
            "notification" | "notifications" => Some(EntityKind::Notification),
            "parent" | "parents" => Some(EntityKind::Parent),
            "relationship" | "relationships" => Some(EntityKind::Relationship),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Attendance => "attendance",
            EntityKind::Student => "student",
            EntityKind::Class => "class",
            EntityKind::Instructor => "instructor",
            EntityKind::Notification => "notification",
            EntityKind::Parent => "parent",
            EntityKind::Relationship => "relationship",
        };
        f.write_str(name)
    }
}

/// A generic keyed record: an open attribute map specific to one
/// entity kind. The primary key field name varies per kind and lives
/// in the kind's [`crate::EntitySchema`].
///
/// The remote service is loose about value types (ids arrive as
/// numbers on some endpoints, strings on others), so all values are
/// normalized to strings on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct EntityRecord {
    fields: BTreeMap<String, String>,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, or the empty string when absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Primary-key value under the given field name, if present and
    /// non-empty.
    pub fn id(&self, id_field: &str) -> Option<&str> {
        match self.get(id_field) {
            "" => None,
            value => Some(value),
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl From<BTreeMap<String, Value>> for EntityRecord {
    fn from(map: BTreeMap<String, Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        Self { fields }
    }
}

impl FromIterator<(String, String)> for EntityRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
