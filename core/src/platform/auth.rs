//! Identity operations: sign-up, sign-in, sign-out, current user, update.

use crate::error::AccessError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthUser, SessionPayload, SignInRequest, SignUpRequest, UserMetadata, UserUpdate};

use super::{check_status, json_body, owned_header, parse_json, PlatformClient, JSON_CONTENT_TYPE};

impl PlatformClient {
    /// Register a new user. The display name travels as `data.full_name`
    /// metadata and the platform answers with a ready-to-use session.
    pub fn build_sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<HttpRequest, AccessError> {
        let payload = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            data: UserMetadata {
                full_name: Some(full_name.to_string()),
                avatar_url: None,
            },
        };
        let mut headers = self.base_headers();
        headers.push(owned_header(JSON_CONTENT_TYPE));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint("/auth/v1/signup"),
            headers,
            body: Some(json_body(&payload)?),
        })
    }

    pub fn parse_sign_up(&self, response: HttpResponse) -> Result<SessionPayload, AccessError> {
        check_status(&response, 200)?;
        parse_json(&response)
    }

    /// Authenticate with the password grant.
    pub fn build_sign_in(&self, email: &str, password: &str) -> Result<HttpRequest, AccessError> {
        let payload = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let mut headers = self.base_headers();
        headers.push(owned_header(JSON_CONTENT_TYPE));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint("/auth/v1/token?grant_type=password"),
            headers,
            body: Some(json_body(&payload)?),
        })
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<SessionPayload, AccessError> {
        check_status(&response, 200)?;
        parse_json(&response)
    }

    /// End the session behind `access_token`.
    pub fn build_sign_out(&self, access_token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint("/auth/v1/logout"),
            headers: self.auth_headers(access_token),
            body: None,
        }
    }

    pub fn parse_sign_out(&self, response: HttpResponse) -> Result<(), AccessError> {
        check_status(&response, 204)
    }

    /// Fetch the user attached to `access_token`.
    pub fn build_current_user(&self, access_token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.endpoint("/auth/v1/user"),
            headers: self.auth_headers(access_token),
            body: None,
        }
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<AuthUser, AccessError> {
        check_status(&response, 200)?;
        parse_json(&response)
    }

    /// Update the signed-in user's email, password, or metadata.
    pub fn build_update_user(
        &self,
        access_token: &str,
        update: &UserUpdate,
    ) -> Result<HttpRequest, AccessError> {
        let mut headers = self.auth_headers(access_token);
        headers.push(owned_header(JSON_CONTENT_TYPE));
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.endpoint("/auth/v1/user"),
            headers,
            body: Some(json_body(update)?),
        })
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<AuthUser, AccessError> {
        check_status(&response, 200)?;
        parse_json(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;
    use crate::types::MetadataPatch;

    fn client() -> PlatformClient {
        PlatformClient::new(PlatformConfig::new("http://localhost:54321", "clef-anon"))
    }

    fn body_json(request: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn sign_up_request_carries_metadata() {
        let req = client()
            .build_sign_up("marie@example.com", "motdepasse8", "Marie Dupont")
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:54321/auth/v1/signup");
        assert!(req
            .headers
            .contains(&("apikey".to_string(), "clef-anon".to_string())));
        assert_eq!(
            body_json(&req),
            serde_json::json!({
                "email": "marie@example.com",
                "password": "motdepasse8",
                "data": {"full_name": "Marie Dupont"}
            })
        );
    }

    #[test]
    fn sign_in_uses_the_password_grant() {
        let req = client()
            .build_sign_in("marie@example.com", "motdepasse8")
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.path,
            "http://localhost:54321/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn sign_out_carries_the_bearer_token() {
        let req = client().build_sign_out("jeton-1");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:54321/auth/v1/logout");
        assert!(req
            .headers
            .contains(&("authorization".to_string(), "Bearer jeton-1".to_string())));
        assert!(req.body.is_none());
    }

    #[test]
    fn current_user_is_a_bare_get() {
        let req = client().build_current_user("jeton-1");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:54321/auth/v1/user");
        assert!(req.body.is_none());
    }

    #[test]
    fn update_user_serializes_only_the_given_fields() {
        let update = UserUpdate {
            data: Some(MetadataPatch {
                full_name: Some("Nouveau Nom".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let req = client().build_update_user("jeton-1", &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(
            body_json(&req),
            serde_json::json!({"data": {"full_name": "Nouveau Nom"}})
        );
    }

    #[test]
    fn parse_sign_in_reads_the_session() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"access_token":"jeton-1","token_type":"bearer","user":{"id":"u-1","email":"marie@example.com","created_at":"2024-01-01T00:00:00Z","user_metadata":{"full_name":"Marie"}}}"#.to_string(),
        };
        let session = client().parse_sign_in(response).unwrap();
        assert_eq!(session.access_token, "jeton-1");
        assert_eq!(session.user.id, "u-1");
        assert_eq!(session.user.user_metadata.full_name.as_deref(), Some("Marie"));
    }

    #[test]
    fn parse_sign_in_surfaces_the_credentials_error() {
        let response = HttpResponse {
            status: 400,
            headers: Vec::new(),
            body: r#"{"error_description":"Invalid login credentials"}"#.to_string(),
        };
        let err = client().parse_sign_in(response).unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn parse_sign_out_expects_no_content() {
        let response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(client().parse_sign_out(response).is_ok());
    }

    #[test]
    fn parse_current_user_rejects_an_expired_token() {
        let response = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: r#"{"msg":"Invalid token"}"#.to_string(),
        };
        let err = client().parse_current_user(response).unwrap_err();
        assert!(matches!(err, AccessError::Platform { status: 401, .. }));
    }
}
