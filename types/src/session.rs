//! The persisted authenticated identity.

use serde::{Deserialize, Serialize};

/// Navigation role derived from the session.
///
/// Only `student` is recognized (case-insensitively); every other
/// value, and an absent role, resolves to the staff/admin experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Staff,
    Student,
}

impl Role {
    pub fn from_label(label: Option<&str>) -> Role {
        match label {
            Some(value) if value.eq_ignore_ascii_case("student") => Role::Student,
            _ => Role::Staff,
        }
    }
}

/// The authenticated identity persisted across restarts.
///
/// Wire field names match the identity blob the mobile app stores
/// (`full_name`, `user_type`). The bearer token is persisted under a
/// separate key by the session store, so it is never serialized as
/// part of the identity blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "full_name")]
    pub display_name: String,
    #[serde(rename = "user_type", default)]
    pub role: Option<String>,
    #[serde(skip_serializing, default)]
    pub auth_token: Option<String>,
}

impl Session {
    pub fn new(display_name: impl Into<String>, role: Option<String>) -> Self {
        Self {
            display_name: display_name.into(),
            role,
            auth_token: None,
        }
    }

    pub fn role(&self) -> Role {
        Role::from_label(self.role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matching_is_case_insensitive() {
        for label in ["student", "Student", "STUDENT"] {
            assert_eq!(Role::from_label(Some(label)), Role::Student);
        }
        assert_eq!(Role::from_label(Some("admin")), Role::Staff);
        assert_eq!(Role::from_label(Some("teacher")), Role::Staff);
        assert_eq!(Role::from_label(None), Role::Staff);
    }

    #[test]
    fn identity_blob_round_trips_without_the_token() {
        let mut session = Session::new("Jane Doe", Some("Staff".into()));
        session.auth_token = Some("secret".into());

        let blob = serde_json::to_string(&session).unwrap();
        assert!(!blob.contains("secret"));

        let parsed: Session = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed.display_name, "Jane Doe");
        assert_eq!(parsed.role(), Role::Staff);
        assert_eq!(parsed.auth_token, None);
    }
}
