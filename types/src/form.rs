//! Staged edit buffers.

use crate::entity::EntityRecord;
use crate::schema::EntitySchema;
use std::collections::BTreeMap;

/// The transient draft of one record bound to an open add/edit modal.
///
/// The buffer keeps the snapshot it originated from (the blank
/// template for add, the record copy for edit) so cancel can tell an
/// untouched form from one with unsaved changes. Exclusively owned by
/// the controller backing the modal; never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBuffer {
    fields: BTreeMap<String, String>,
    snapshot: BTreeMap<String, String>,
}

impl FormBuffer {
    /// Empty buffer over the schema's editable fields. Use
    /// [`EntitySchema::blank_template`] for the add modal so
    /// kind-specific defaults are applied.
    pub fn blank(schema: &EntitySchema) -> Self {
        let fields: BTreeMap<String, String> = schema
            .fields
            .iter()
            .map(|f| (f.to_string(), String::new()))
            .collect();
        Self {
            snapshot: fields.clone(),
            fields,
        }
    }

    /// Buffer staging a copy of an existing record, including its
    /// primary-key value.
    pub fn from_record(schema: &EntitySchema, record: &EntityRecord) -> Self {
        let mut fields: BTreeMap<String, String> = schema
            .fields
            .iter()
            .map(|f| (f.to_string(), record.get(f).to_string()))
            .collect();
        fields.insert(
            schema.id_field.to_string(),
            record.get(schema.id_field).to_string(),
        );
        Self {
            snapshot: fields.clone(),
            fields,
        }
    }

    /// Set a default value into both the draft and its snapshot, so
    /// the default alone never reads as an unsaved change.
    pub(crate) fn seed(&mut self, field: &str, value: String) {
        self.fields.insert(field.to_string(), value.clone());
        self.snapshot.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// Stage one field edit. Mutates the draft only.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Primary-key value staged on the buffer, if non-empty. Presence
    /// of this value is what selects update over create on submit.
    pub fn id(&self, schema: &EntitySchema) -> Option<&str> {
        match self.get(schema.id_field) {
            "" => None,
            value => Some(value),
        }
    }

    /// Whether any editable field differs from the originating
    /// snapshot.
    pub fn is_dirty(&self, schema: &EntitySchema) -> bool {
        schema
            .fields
            .iter()
            .any(|f| self.get(f) != self.snapshot.get(*f).map(String::as_str).unwrap_or(""))
    }

    /// First required field that is empty (after trimming), if any.
    pub fn missing_required(&self, schema: &EntitySchema) -> Option<&'static str> {
        schema
            .required
            .iter()
            .copied()
            .find(|f| self.get(f).trim().is_empty())
    }

    /// The staged fields, in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The staged draft as a record (used when the service echoes no
    /// payload back on create/update).
    pub fn to_record(&self) -> EntityRecord {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn students() -> &'static EntitySchema {
        EntitySchema::of(EntityKind::Student)
    }

    #[test]
    fn blank_buffer_is_clean_and_has_no_id() {
        let buffer = students().blank_template();
        assert!(!buffer.is_dirty(students()));
        assert_eq!(buffer.id(students()), None);
    }

    #[test]
    fn edits_make_the_buffer_dirty() {
        let mut buffer = students().blank_template();
        buffer.set("FirstName", "Grace");
        assert!(buffer.is_dirty(students()));
        buffer.set("FirstName", "");
        assert!(!buffer.is_dirty(students()));
    }

    #[test]
    fn record_copy_carries_the_id() {
        let mut record = EntityRecord::new();
        record.set("StudentID", "12");
        record.set("FirstName", "Grace");
        record.set("LastName", "Hopper");

        let buffer = FormBuffer::from_record(students(), &record);
        assert_eq!(buffer.id(students()), Some("12"));
        assert_eq!(buffer.get("FirstName"), "Grace");
        assert!(!buffer.is_dirty(students()));
    }

    #[test]
    fn missing_required_reports_first_empty_field() {
        let mut buffer = students().blank_template();
        buffer.set("LastName", "Doe");
        assert_eq!(buffer.missing_required(students()), Some("FirstName"));
        buffer.set("FirstName", "Jane");
        assert_eq!(buffer.missing_required(students()), None);
        // Whitespace-only counts as empty.
        buffer.set("LastName", "   ");
        assert_eq!(buffer.missing_required(students()), Some("LastName"));
    }
}
