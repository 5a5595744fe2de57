//! Table operations on the `todos` resource.
//!
//! Filters use the table API's `column=op.value` query syntax. Every
//! operation is scoped to the owning user: selects filter on `user_id`,
//! mutations filter on both `id` and `user_id`. The platform's row-level
//! access rules enforce the same ownership on their side; the filters here
//! keep the client honest about what it asks for.

use crate::error::AccessError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{TodoInsert, TodoPatch, TodoRow};

use super::{check_status, json_body, owned_header, PlatformClient, JSON_CONTENT_TYPE};

/// Ask the table API to answer a mutation with the affected row as a
/// single JSON object instead of the default empty body.
const REPRESENTATION_HEADERS: [(&str, &str); 2] = [
    ("prefer", "return=representation"),
    ("accept", "application/vnd.pgrst.object+json"),
];

impl PlatformClient {
    /// Select the owner's rows, newest first.
    pub fn build_list_todos(&self, access_token: &str, user_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.endpoint(&format!(
                "/rest/v1/todos?select=*&user_id=eq.{user_id}&order=created_at.desc"
            )),
            headers: self.auth_headers(access_token),
            body: None,
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<TodoRow>, AccessError> {
        check_status(&response, 200)?;
        super::parse_json(&response)
    }

    /// Insert a row. The owner id is already attached to the payload.
    pub fn build_insert_todo(
        &self,
        access_token: &str,
        insert: &TodoInsert,
    ) -> Result<HttpRequest, AccessError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint("/rest/v1/todos"),
            headers: self.mutation_headers(access_token),
            body: Some(json_body(insert)?),
        })
    }

    pub fn parse_insert_todo(&self, response: HttpResponse) -> Result<TodoRow, AccessError> {
        check_status(&response, 201)?;
        single_row(&response.body)
    }

    /// Partially update the row matching both `id` and `user_id`.
    pub fn build_update_todo(
        &self,
        access_token: &str,
        id: i64,
        user_id: &str,
        patch: &TodoPatch,
    ) -> Result<HttpRequest, AccessError> {
        Ok(HttpRequest {
            method: HttpMethod::Patch,
            path: self.endpoint(&format!("/rest/v1/todos?id=eq.{id}&user_id=eq.{user_id}")),
            headers: self.mutation_headers(access_token),
            body: Some(json_body(patch)?),
        })
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<TodoRow, AccessError> {
        check_status(&response, 200)?;
        single_row(&response.body)
    }

    /// Delete the row matching both `id` and `user_id`.
    pub fn build_delete_todo(&self, access_token: &str, id: i64, user_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.endpoint(&format!("/rest/v1/todos?id=eq.{id}&user_id=eq.{user_id}")),
            headers: self.auth_headers(access_token),
            body: None,
        }
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), AccessError> {
        check_status(&response, 204)
    }

    fn mutation_headers(&self, access_token: &str) -> Vec<(String, String)> {
        let mut headers = self.auth_headers(access_token);
        headers.push(owned_header(JSON_CONTENT_TYPE));
        headers.extend(REPRESENTATION_HEADERS.map(owned_header));
        headers
    }
}

/// Read one row from a representation body. Some deployments answer with a
/// one-element array instead of a bare object; an empty array means the
/// platform acknowledged the call without returning data.
fn single_row(body: &str) -> Result<TodoRow, AccessError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AccessError::Deserialization(e.to_string()))?;
    let value = match value {
        serde_json::Value::Array(mut rows) => {
            if rows.is_empty() {
                return Err(AccessError::EmptyResponse);
            }
            rows.remove(0)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|e| AccessError::Deserialization(e.to_string()))
}
