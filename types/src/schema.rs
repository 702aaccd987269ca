//! Per-kind schema descriptors.
//!
//! One static descriptor per entity kind drives the generic screen
//! controller and the gateway: primary-key field, editable fields,
//! required fields, the request encoding for writes, and the blank
//! template backing the add modal.

use crate::entity::EntityKind;
use crate::form::FormBuffer;

/// Wire encoding used for create/update/delete requests of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEncoding {
    /// Multipart form fields.
    Form,
    /// JSON object body.
    Json,
}

/// Static descriptor for one entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Name of the primary-key field on records of this kind.
    pub id_field: &'static str,
    /// Editable fields, in display order. Does not include the id.
    pub fields: &'static [&'static str],
    /// Subset of `fields` that must be non-empty before submit.
    pub required: &'static [&'static str],
    /// Encoding for write requests.
    pub encoding: RequestEncoding,
}

static ATTENDANCE: EntitySchema = EntitySchema {
    kind: EntityKind::Attendance,
    id_field: "RecordID",
    fields: &["StudentID", "ClassID", "Date", "Status"],
    required: &["StudentID", "ClassID", "Date", "Status"],
    encoding: RequestEncoding::Form,
};

static STUDENT: EntitySchema = EntitySchema {
    kind: EntityKind::Student,
    id_field: "StudentID",
    fields: &[
        "FirstName",
        "LastName",
        "DateOfBirth",
        "ContactInformation",
        "ParentID",
    ],
    required: &["FirstName", "LastName"],
    encoding: RequestEncoding::Form,
};

static CLASS: EntitySchema = EntitySchema {
    kind: EntityKind::Class,
    id_field: "ClassID",
    fields: &["ClassName", "CourseName", "InstructorID"],
    required: &["ClassName", "CourseName", "InstructorID"],
    encoding: RequestEncoding::Form,
};

static INSTRUCTOR: EntitySchema = EntitySchema {
    kind: EntityKind::Instructor,
    id_field: "InstructorID",
    fields: &["FirstName", "LastName", "ContactInformation"],
    required: &["FirstName", "LastName"],
    encoding: RequestEncoding::Form,
};

static NOTIFICATION: EntitySchema = EntitySchema {
    kind: EntityKind::Notification,
    id_field: "NotificationID",
    fields: &[
        "StudentID",
        "ClassID",
        "Date",
        "NotificationType",
        "NotificationText",
        "status",
    ],
    required: &["StudentID", "ClassID", "NotificationType", "NotificationText"],
    encoding: RequestEncoding::Form,
};

// Parents are the one kind written as JSON; see DESIGN.md for the
// encoding choice.
static PARENT: EntitySchema = EntitySchema {
    kind: EntityKind::Parent,
    id_field: "ParentID",
    fields: &[
        "FirstName",
        "LastName",
        "RelationshipToStudent",
        "ContactInformation",
    ],
    required: &[
        "FirstName",
        "LastName",
        "RelationshipToStudent",
        "ContactInformation",
    ],
    encoding: RequestEncoding::Json,
};

static RELATIONSHIP: EntitySchema = EntitySchema {
    kind: EntityKind::Relationship,
    id_field: "RelationshipID",
    fields: &["StudentID", "ParentID"],
    required: &["StudentID", "ParentID"],
    encoding: RequestEncoding::Form,
};

impl EntitySchema {
    /// The descriptor for one entity kind.
    pub fn of(kind: EntityKind) -> &'static EntitySchema {
        match kind {
            EntityKind::Attendance => &ATTENDANCE,
            EntityKind::Student => &STUDENT,
            EntityKind::Class => &CLASS,
            EntityKind::Instructor => &INSTRUCTOR,
            EntityKind::Notification => &NOTIFICATION,
            EntityKind::Parent => &PARENT,
            EntityKind::Relationship => &RELATIONSHIP,
        }
    }

    /// Blank template backing the add modal: every field empty except
    /// kind-specific defaults (today's date for dated kinds, `present`
    /// for attendance status).
    pub fn blank_template(&self) -> FormBuffer {
        let mut buffer = FormBuffer::blank(self);
        match self.kind {
            EntityKind::Attendance => {
                buffer.seed("Date", today());
                buffer.seed("Status", "present".to_string());
            }
            EntityKind::Notification => {
                buffer.seed("Date", today());
            }
            _ => {}
        }
        buffer
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}
