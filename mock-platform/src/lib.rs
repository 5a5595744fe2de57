//! In-memory stand-in for the hosted platform.
//!
//! Serves the slice of the platform's HTTP surface the data-access layer
//! talks to: identity endpoints under `/auth/v1`, the `todos` table under
//! `/rest/v1` with `eq.`-style filters, and the avatar bucket under
//! `/storage/v1`. Sessions are bearer tokens issued at sign-up/sign-in;
//! the table and storage handlers enforce ownership from the token the
//! way the real platform's access rules do. Test scaffolding only.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Custom fields the platform keeps on a user.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// User object as the identity endpoints return it.
#[derive(Clone, Debug, Serialize)]
pub struct UserPayload {
    pub id: Uuid,
    pub email: String,
    pub created_at: String,
    pub user_metadata: Metadata,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionPayload {
    pub access_token: String,
    pub token_type: String,
    pub user: UserPayload,
}

/// A `todos` row as the table API returns it.
#[derive(Clone, Debug, Serialize)]
pub struct TodoRow {
    pub id: i64,
    pub created_at: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub data: Metadata,
}

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateUserBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub data: Option<MetadataUpdate>,
}

/// Metadata patch where a present `null` clears the field.
#[derive(Deserialize, Default)]
pub struct MetadataUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct InsertTodoBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub user_id: String,
}

#[derive(Deserialize, Default)]
pub struct PatchTodoBody {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ListObjectsBody {
    pub prefix: String,
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn default_status() -> String {
    "en_cours".to_string()
}

const STATUSES: [&str; 2] = ["en_cours", "termine"];

#[derive(Clone, Debug)]
struct Account {
    id: Uuid,
    email: String,
    password: String,
    created_at: String,
    metadata: Metadata,
}

impl Account {
    fn payload(&self) -> UserPayload {
        UserPayload {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at.clone(),
            user_metadata: self.metadata.clone(),
        }
    }
}

#[derive(Default)]
pub struct PlatformState {
    accounts: Vec<Account>,
    sessions: HashMap<String, Uuid>,
    todos: Vec<TodoRow>,
    next_todo_id: i64,
    objects: HashMap<String, (String, Vec<u8>)>,
}

pub type Db = Arc<RwLock<PlatformState>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(PlatformState::default()));
    Router::new()
        .route("/auth/v1/signup", post(sign_up))
        .route("/auth/v1/token", post(issue_token))
        .route("/auth/v1/logout", post(log_out))
        .route("/auth/v1/user", get(current_user).put(update_user))
        .route(
            "/rest/v1/todos",
            get(list_todos)
                .post(insert_todo)
                .patch(update_todos)
                .delete(delete_todos),
        )
        .route("/storage/v1/object/list/avatars", post(list_objects))
        .route(
            "/storage/v1/object/avatars/{*path}",
            post(upload_object).delete(remove_object),
        )
        .route("/storage/v1/object/public/avatars/{*path}", get(serve_object))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type ErrorReply = (StatusCode, Json<serde_json::Value>);

fn identity_error(status: StatusCode, message: &str) -> ErrorReply {
    (status, Json(serde_json::json!({"msg": message})))
}

fn grant_error(message: &str) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error_description": message})),
    )
}

fn table_error(status: StatusCode, message: &str) -> ErrorReply {
    (status, Json(serde_json::json!({"message": message})))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticated(state: &PlatformState, headers: &HeaderMap) -> Result<Uuid, ErrorReply> {
    bearer_token(headers)
        .and_then(|token| state.sessions.get(token).copied())
        .ok_or_else(|| identity_error(StatusCode::UNAUTHORIZED, "Invalid token"))
}

fn eq_filter(params: &HashMap<String, String>, column: &str) -> Option<String> {
    params
        .get(column)
        .and_then(|v| v.strip_prefix("eq."))
        .map(str::to_string)
}

fn open_session(state: &mut PlatformState, account_id: Uuid) -> String {
    let token = Uuid::new_v4().to_string();
    state.sessions.insert(token.clone(), account_id);
    token
}

// --- identity ---

async fn sign_up(
    State(db): State<Db>,
    Json(body): Json<SignUpBody>,
) -> Result<Json<SessionPayload>, ErrorReply> {
    let mut state = db.write().await;
    if state.accounts.iter().any(|a| a.email == body.email) {
        return Err(identity_error(
            StatusCode::BAD_REQUEST,
            "User already registered",
        ));
    }
    let account = Account {
        id: Uuid::new_v4(),
        email: body.email,
        password: body.password,
        created_at: now(),
        metadata: body.data,
    };
    // Accounts are auto-confirmed, so sign-up answers with a live session.
    let access_token = open_session(&mut state, account.id);
    let payload = SessionPayload {
        access_token,
        token_type: "bearer".to_string(),
        user: account.payload(),
    };
    state.accounts.push(account);
    Ok(Json(payload))
}

async fn issue_token(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<SessionPayload>, ErrorReply> {
    if params.get("grant_type").map(String::as_str) != Some("password") {
        return Err(grant_error("unsupported grant type"));
    }
    let mut state = db.write().await;
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.email == body.email && a.password == body.password)
        .cloned()
    else {
        return Err(grant_error("Invalid login credentials"));
    };
    let access_token = open_session(&mut state, account.id);
    Ok(Json(SessionPayload {
        access_token,
        token_type: "bearer".to_string(),
        user: account.payload(),
    }))
}

async fn log_out(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, ErrorReply> {
    let mut state = db.write().await;
    authenticated(&state, &headers)?;
    if let Some(token) = bearer_token(&headers) {
        let token = token.to_string();
        state.sessions.remove(&token);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn current_user(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<UserPayload>, ErrorReply> {
    let state = db.read().await;
    let account_id = authenticated(&state, &headers)?;
    let account = state
        .accounts
        .iter()
        .find(|a| a.id == account_id)
        .ok_or_else(|| identity_error(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    Ok(Json(account.payload()))
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<UserPayload>, ErrorReply> {
    let mut state = db.write().await;
    let account_id = authenticated(&state, &headers)?;
    let account = state
        .accounts
        .iter_mut()
        .find(|a| a.id == account_id)
        .ok_or_else(|| identity_error(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    if let Some(email) = body.email {
        account.email = email;
    }
    if let Some(password) = body.password {
        account.password = password;
    }
    if let Some(data) = body.data {
        if let Some(full_name) = data.full_name {
            account.metadata.full_name = full_name;
        }
        if let Some(avatar_url) = data.avatar_url {
            account.metadata.avatar_url = avatar_url;
        }
    }
    Ok(Json(account.payload()))
}

// --- todos table ---

async fn list_todos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<TodoRow>>, ErrorReply> {
    let state = db.read().await;
    let owner = authenticated(&state, &headers)?.to_string();
    let user_filter = eq_filter(&params, "user_id");
    let id_filter = eq_filter(&params, "id");
    let mut rows: Vec<TodoRow> = state
        .todos
        .iter()
        .filter(|row| row.user_id == owner)
        .filter(|row| user_filter.as_deref().map_or(true, |uid| row.user_id == uid))
        .filter(|row| id_filter.as_deref().map_or(true, |id| row.id.to_string() == id))
        .cloned()
        .collect();
    let ascending = params.get("order").map(String::as_str) == Some("created_at.asc");
    rows.sort_by(|a, b| {
        let ordering = (a.created_at.as_str(), a.id).cmp(&(b.created_at.as_str(), b.id));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    Ok(Json(rows))
}

async fn insert_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<InsertTodoBody>,
) -> Result<(StatusCode, Json<TodoRow>), ErrorReply> {
    let mut state = db.write().await;
    let owner = authenticated(&state, &headers)?.to_string();
    if body.user_id != owner {
        return Err(table_error(
            StatusCode::FORBIDDEN,
            "new row violates row-level security policy",
        ));
    }
    if !STATUSES.contains(&body.status.as_str()) {
        return Err(table_error(
            StatusCode::BAD_REQUEST,
            "invalid input value for enum todo_status",
        ));
    }
    state.next_todo_id += 1;
    let row = TodoRow {
        id: state.next_todo_id,
        created_at: now(),
        title: body.title,
        description: body.description,
        status: body.status,
        user_id: body.user_id,
    };
    state.todos.push(row.clone());
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_todos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<PatchTodoBody>,
) -> Result<Json<TodoRow>, ErrorReply> {
    let mut state = db.write().await;
    let owner = authenticated(&state, &headers)?.to_string();
    if let Some(status) = body.status.as_deref() {
        if !STATUSES.contains(&status) {
            return Err(table_error(
                StatusCode::BAD_REQUEST,
                "invalid input value for enum todo_status",
            ));
        }
    }
    let user_filter = eq_filter(&params, "user_id");
    let id_filter = eq_filter(&params, "id");
    let mut matches: Vec<&mut TodoRow> = state
        .todos
        .iter_mut()
        .filter(|row| row.user_id == owner)
        .filter(|row| user_filter.as_deref().map_or(true, |uid| row.user_id == uid))
        .filter(|row| id_filter.as_deref().map_or(true, |id| row.id.to_string() == id))
        .collect();
    // The client asked for a single-object representation.
    if matches.len() != 1 {
        return Err(table_error(
            StatusCode::NOT_ACCEPTABLE,
            "JSON object requested, multiple (or no) rows returned",
        ));
    }
    let row = matches.remove(0);
    if let Some(title) = body.title {
        row.title = title;
    }
    if let Some(description) = body.description {
        row.description = description;
    }
    if let Some(status) = body.status {
        row.status = status;
    }
    Ok(Json(row.clone()))
}

async fn delete_todos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<StatusCode, ErrorReply> {
    let mut state = db.write().await;
    let owner = authenticated(&state, &headers)?.to_string();
    let user_filter = eq_filter(&params, "user_id");
    let id_filter = eq_filter(&params, "id");
    state.todos.retain(|row| {
        let matched = row.user_id == owner
            && user_filter.as_deref().map_or(true, |uid| row.user_id == uid)
            && id_filter.as_deref().map_or(true, |id| row.id.to_string() == id);
        !matched
    });
    // The table API acknowledges a delete even when nothing matched.
    Ok(StatusCode::NO_CONTENT)
}

// --- avatar bucket ---

async fn upload_object(
    State(db): State<Db>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ErrorReply> {
    let mut state = db.write().await;
    let owner = authenticated(&state, &headers)?.to_string();
    if !path.starts_with(&format!("{owner}/")) {
        return Err(table_error(
            StatusCode::FORBIDDEN,
            "new row violates row-level security policy",
        ));
    }
    let upsert = headers
        .get("x-upsert")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == "true");
    if !upsert && state.objects.contains_key(&path) {
        return Err(table_error(
            StatusCode::CONFLICT,
            "The resource already exists",
        ));
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    state.objects.insert(path.clone(), (content_type, body.to_vec()));
    Ok(Json(serde_json::json!({"Key": format!("avatars/{path}")})))
}

async fn remove_object(
    State(db): State<Db>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ErrorReply> {
    let mut state = db.write().await;
    let owner = authenticated(&state, &headers)?.to_string();
    if !path.starts_with(&format!("{owner}/")) {
        return Err(table_error(
            StatusCode::FORBIDDEN,
            "new row violates row-level security policy",
        ));
    }
    if state.objects.remove(&path).is_none() {
        return Err(table_error(StatusCode::NOT_FOUND, "Object not found"));
    }
    Ok(Json(serde_json::json!({"message": "Successfully deleted"})))
}

async fn list_objects(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<ListObjectsBody>,
) -> Result<Json<Vec<serde_json::Value>>, ErrorReply> {
    let state = db.read().await;
    authenticated(&state, &headers)?;
    let prefix = format!("{}/", body.prefix.trim_end_matches('/'));
    let entries = state
        .objects
        .keys()
        .filter_map(|key| key.strip_prefix(&prefix))
        .map(|name| serde_json::json!({"name": name}))
        .collect();
    Ok(Json(entries))
}

async fn serve_object(
    State(db): State<Db>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ErrorReply> {
    let state = db.read().await;
    let Some((content_type, content)) = state.objects.get(&path) else {
        return Err(table_error(StatusCode::NOT_FOUND, "Object not found"));
    };
    Ok(([(header::CONTENT_TYPE, content_type.clone())], content.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_update_distinguishes_null_from_absent() {
        let update: MetadataUpdate = serde_json::from_str(r#"{"avatar_url":null}"#).unwrap();
        assert_eq!(update.avatar_url, Some(None));
        assert_eq!(update.full_name, None);

        let update: MetadataUpdate =
            serde_json::from_str(r#"{"avatar_url":"http://x/a.png"}"#).unwrap();
        assert_eq!(update.avatar_url, Some(Some("http://x/a.png".to_string())));
    }

    #[test]
    fn insert_body_defaults_status_to_en_cours() {
        let body: InsertTodoBody =
            serde_json::from_str(r#"{"title":"A","user_id":"u-1"}"#).unwrap();
        assert_eq!(body.status, "en_cours");
        assert!(body.description.is_none());
    }

    #[test]
    fn todo_row_serializes_description_null() {
        let row = TodoRow {
            id: 1,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            title: "A".to_string(),
            description: None,
            status: "en_cours".to_string(),
            user_id: "u-1".to_string(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("description").unwrap().is_null());
    }
}
