//! Avatar bucket operations.
//!
//! Avatars live in a public bucket under one folder per user, so the only
//! paths this module ever touches look like `<user_id>/avatar.<ext>`. The
//! bucket itself (policies, retention) belongs to the platform.

use serde::Serialize;

use crate::error::AccessError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::ObjectInfo;

use super::{check_status, json_body, owned_header, parse_json, PlatformClient, JSON_CONTENT_TYPE};

/// Bucket holding user avatars.
pub const AVATAR_BUCKET: &str = "avatars";

impl PlatformClient {
    /// Upload an object, replacing any previous content at the same path.
    pub fn build_upload_avatar(
        &self,
        access_token: &str,
        path: &str,
        content: &[u8],
    ) -> HttpRequest {
        let mut headers = self.auth_headers(access_token);
        headers.push(("content-type".to_string(), content_type_for(path).to_string()));
        headers.push(("cache-control".to_string(), "3600".to_string()));
        headers.push(("x-upsert".to_string(), "true".to_string()));
        HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint(&format!("/storage/v1/object/{AVATAR_BUCKET}/{path}")),
            headers,
            body: Some(content.to_vec()),
        }
    }

    pub fn parse_upload_avatar(&self, response: HttpResponse) -> Result<(), AccessError> {
        check_status(&response, 200)
    }

    /// List the objects stored under a user's folder.
    pub fn build_list_avatar_folder(
        &self,
        access_token: &str,
        prefix: &str,
    ) -> Result<HttpRequest, AccessError> {
        #[derive(Serialize)]
        struct ListRequest<'a> {
            prefix: &'a str,
        }

        let mut headers = self.auth_headers(access_token);
        headers.push(owned_header(JSON_CONTENT_TYPE));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint(&format!("/storage/v1/object/list/{AVATAR_BUCKET}")),
            headers,
            body: Some(json_body(&ListRequest { prefix })?),
        })
    }

    pub fn parse_list_avatar_folder(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<ObjectInfo>, AccessError> {
        check_status(&response, 200)?;
        parse_json(&response)
    }

    /// Remove a single object.
    pub fn build_remove_avatar_object(&self, access_token: &str, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.endpoint(&format!("/storage/v1/object/{AVATAR_BUCKET}/{path}")),
            headers: self.auth_headers(access_token),
            body: None,
        }
    }

    pub fn parse_remove_avatar_object(&self, response: HttpResponse) -> Result<(), AccessError> {
        check_status(&response, 200)
    }

    /// Public URL of an object in the avatar bucket. No request involved:
    /// the bucket is public and the URL shape is fixed.
    pub fn avatar_public_url(&self, path: &str) -> String {
        self.endpoint(&format!("/storage/v1/object/public/{AVATAR_BUCKET}/{path}"))
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
