//! Wire shapes and application view models.
//!
//! # Design
//! Two families of types live here. The `*Row` / `*Insert` / `*Patch` /
//! `Auth*` structs mirror what actually travels over the wire: table rows
//! with string timestamps and the platform's nested user object. The `Todo`
//! and `User` view models are what the application consumes: parsed
//! timestamps, flattened metadata, defaults applied. Mapping between the
//! two is explicit (`Todo::from_row`, `User::from_auth`) so the boundary
//! stays visible. The mock platform defines its own copies of the wire
//! shapes; integration tests catch schema drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// Display name used when the platform has no `full_name` metadata.
pub const DEFAULT_FULL_NAME: &str = "Utilisateur";

/// Status column of the `todos` table. Exactly two values exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    #[default]
    #[serde(rename = "en_cours")]
    EnCours,
    #[serde(rename = "termine")]
    Termine,
}

impl TodoStatus {
    /// The other status. Toggling twice returns to the start.
    pub fn toggled(self) -> Self {
        match self {
            TodoStatus::EnCours => TodoStatus::Termine,
            TodoStatus::Termine => TodoStatus::EnCours,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::EnCours => "en_cours",
            TodoStatus::Termine => "termine",
        }
    }
}

/// A `todos` row exactly as the table API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRow {
    pub id: i64,
    pub created_at: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub user_id: String,
}

/// Insert payload for the `todos` table. The owner id is always attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoInsert {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TodoStatus,
    pub user_id: String,
}

/// Partial update for a `todos` row. Omitted fields stay unchanged on the
/// platform; `description` uses a nested `Option` so an explicit `null` can
/// be sent to clear it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
}

/// A todo as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl Todo {
    /// Map a raw table row into the view-model shape.
    pub fn from_row(row: TodoRow) -> Result<Self, AccessError> {
        let created_at = parse_timestamp(&row.created_at)?;
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            created_at,
            user_id: row.user_id,
        })
    }
}

/// Free-form metadata the platform keeps on a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// The platform's user object as returned by the identity endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Session issued by sign-up or sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    pub access_token: String,
    pub user: AuthUser,
}

/// A signed-in user as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Map the platform's user object into the view-model shape.
    ///
    /// A missing email becomes the empty string and a missing full name
    /// falls back to `fallback_name` (the submitted name during sign-up,
    /// [`DEFAULT_FULL_NAME`] everywhere else).
    pub fn from_auth(raw: AuthUser, fallback_name: &str) -> Result<Self, AccessError> {
        let created_at = parse_timestamp(&raw.created_at)?;
        Ok(Self {
            id: raw.id,
            email: raw.email.unwrap_or_default(),
            full_name: raw
                .user_metadata
                .full_name
                .unwrap_or_else(|| fallback_name.to_string()),
            avatar_url: raw.user_metadata.avatar_url,
            created_at,
        })
    }
}

/// Sign-up request body. Metadata travels under `data`, the platform's
/// convention for custom fields.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub data: UserMetadata,
}

/// Password-grant sign-in request body.
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Partial update of the signed-in user. `avatar_url` uses a nested
/// `Option` so an explicit `null` can clear the stored URL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MetadataPatch>,
}

/// Metadata part of a [`UserUpdate`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
}

/// One entry from a storage folder listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AccessError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AccessError::Deserialization(format!("horodatage invalide `{raw}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_wire_values() {
        assert_eq!(serde_json::to_string(&TodoStatus::EnCours).unwrap(), r#""en_cours""#);
        assert_eq!(serde_json::to_string(&TodoStatus::Termine).unwrap(), r#""termine""#);
    }

    #[test]
    fn status_toggles_between_the_two_values() {
        assert_eq!(TodoStatus::EnCours.toggled(), TodoStatus::Termine);
        assert_eq!(TodoStatus::Termine.toggled(), TodoStatus::EnCours);
        assert_eq!(TodoStatus::default(), TodoStatus::EnCours);
    }

    #[test]
    fn row_maps_to_view_model() {
        let row: TodoRow = serde_json::from_str(
            r#"{"id":1,"title":"A","description":null,"status":"en_cours","created_at":"2024-01-01T00:00:00Z","user_id":"u1"}"#,
        )
        .unwrap();
        let todo = Todo::from_row(row).unwrap();
        assert_eq!(todo.id, 1);
        assert_eq!(todo.title, "A");
        assert_eq!(todo.description, None);
        assert_eq!(todo.status, TodoStatus::EnCours);
        assert_eq!(todo.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(todo.user_id, "u1");
    }

    #[test]
    fn row_with_offset_timestamp_normalizes_to_utc() {
        let row = TodoRow {
            id: 7,
            created_at: "2024-06-01T14:30:00+02:00".to_string(),
            title: "Réunion".to_string(),
            description: Some("salle B".to_string()),
            status: TodoStatus::Termine,
            user_id: "u2".to_string(),
        };
        let todo = Todo::from_row(row).unwrap();
        assert_eq!(todo.created_at.to_rfc3339(), "2024-06-01T12:30:00+00:00");
    }

    #[test]
    fn row_with_bad_timestamp_is_rejected() {
        let row = TodoRow {
            id: 1,
            created_at: "hier".to_string(),
            title: "A".to_string(),
            description: None,
            status: TodoStatus::EnCours,
            user_id: "u1".to_string(),
        };
        let err = Todo::from_row(row).unwrap_err();
        assert!(matches!(err, AccessError::Deserialization(_)));
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = TodoPatch {
            status: Some(TodoStatus::Termine),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"status": "termine"}));
    }

    #[test]
    fn patch_sends_explicit_null_description() {
        let patch = TodoPatch {
            description: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"description": null}));
    }

    #[test]
    fn auth_user_defaults_apply_during_mapping() {
        let raw: AuthUser = serde_json::from_str(
            r#"{"id":"u1","created_at":"2024-01-01T00:00:00Z","user_metadata":{}}"#,
        )
        .unwrap();
        let user = User::from_auth(raw, DEFAULT_FULL_NAME).unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.full_name, "Utilisateur");
        assert_eq!(user.avatar_url, None);
    }

    #[test]
    fn auth_user_metadata_wins_over_fallback() {
        let raw: AuthUser = serde_json::from_str(
            r#"{"id":"u1","email":"marie@example.com","created_at":"2024-01-01T00:00:00Z","user_metadata":{"full_name":"Marie Dupont","avatar_url":"http://x/a.png"}}"#,
        )
        .unwrap();
        let user = User::from_auth(raw, "Autre Nom").unwrap();
        assert_eq!(user.full_name, "Marie Dupont");
        assert_eq!(user.avatar_url.as_deref(), Some("http://x/a.png"));
    }

    #[test]
    fn metadata_patch_clears_avatar_with_null() {
        let update = UserUpdate {
            data: Some(MetadataPatch {
                avatar_url: Some(None),
                ..Default::default()
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"data": {"avatar_url": null}}));
    }
}
