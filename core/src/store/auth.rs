//! Session and profile operations.
//!
//! Mirrors the platform's identity surface: credentials go out, the
//! platform's user object comes back and is mirrored into the local
//! [`User`] shape. The store never creates or destroys users itself.

use tracing::{debug, warn};

use crate::error::AccessError;
use crate::http::Transport;
use crate::types::{MetadataPatch, User, UserUpdate, DEFAULT_FULL_NAME};

use super::AppContext;

impl<T: Transport> AppContext<T> {
    /// Register a listener invoked on every session transition.
    pub fn on_session_change(&mut self, listener: impl FnMut(bool, Option<&User>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Register a new user and install the returned session.
    pub fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AccessError> {
        self.session.last_error = None;
        debug!(email, "signing up");
        let result = self.sign_up_inner(email, password, full_name);
        self.record_auth(result)
    }

    fn sign_up_inner(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AccessError> {
        let request = self.platform.build_sign_up(email, password, full_name)?;
        let response = self.execute(request)?;
        let session = self.platform.parse_sign_up(response)?;
        // The submitted name is the fallback: a fresh account may not have
        // its metadata materialized yet.
        let user = User::from_auth(session.user, full_name)?;
        self.install_session(session.access_token, user.clone());
        Ok(user)
    }

    /// Authenticate an existing user and install the returned session.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AccessError> {
        self.session.last_error = None;
        debug!(email, "signing in");
        let result = self.sign_in_inner(email, password);
        self.record_auth(result)
    }

    fn sign_in_inner(&mut self, email: &str, password: &str) -> Result<User, AccessError> {
        let request = self.platform.build_sign_in(email, password)?;
        let response = self.execute(request)?;
        let session = self.platform.parse_sign_in(response)?;
        let user = User::from_auth(session.user, DEFAULT_FULL_NAME)?;
        self.install_session(session.access_token, user.clone());
        Ok(user)
    }

    /// End the platform session and clear the local state. Without a
    /// stored token there is nothing to end remotely; the local state is
    /// cleared and no call is made.
    pub fn sign_out(&mut self) -> Result<(), AccessError> {
        self.session.last_error = None;
        debug!("signing out");
        let Some(token) = self.session.access_token.clone() else {
            self.clear_session();
            return Ok(());
        };
        let result = self.sign_out_inner(&token);
        if result.is_ok() {
            self.clear_session();
        }
        self.record_auth(result)
    }

    fn sign_out_inner(&mut self, token: &str) -> Result<(), AccessError> {
        let request = self.platform.build_sign_out(token);
        let response = self.execute(request)?;
        self.platform.parse_sign_out(response)
    }

    /// Restore the session state from the stored token. Returns the
    /// signed-in user, or `None` when no session exists. A rejected token
    /// clears the local state.
    pub fn load_session(&mut self) -> Result<Option<User>, AccessError> {
        self.session.last_error = None;
        let Some(token) = self.session.access_token.clone() else {
            self.clear_session();
            return Ok(None);
        };
        match self.load_session_inner(&token) {
            Ok(user) => Ok(Some(user)),
            Err(error) => {
                self.clear_session();
                self.record_auth(Err(error))
            }
        }
    }

    fn load_session_inner(&mut self, token: &str) -> Result<User, AccessError> {
        let request = self.platform.build_current_user(token);
        let response = self.execute(request)?;
        let raw = self.platform.parse_current_user(response)?;
        let user = User::from_auth(raw, DEFAULT_FULL_NAME)?;
        self.replace_user(user.clone());
        Ok(user)
    }

    /// Update the signed-in user's display name and email.
    pub fn update_profile(&mut self, full_name: &str, email: &str) -> Result<User, AccessError> {
        self.session.last_error = None;
        debug!(email, "updating profile");
        let result = self.update_profile_inner(full_name, email);
        self.record_auth(result)
    }

    fn update_profile_inner(&mut self, full_name: &str, email: &str) -> Result<User, AccessError> {
        let (_, token) = self.require_session()?;
        let update = UserUpdate {
            email: Some(email.to_string()),
            data: Some(MetadataPatch {
                full_name: Some(full_name.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let raw = self.send_user_update(&token, &update)?;
        let user = User::from_auth(raw, full_name)?;
        self.replace_user(user.clone());
        Ok(user)
    }

    /// Change the signed-in user's password. The mirrored user state is
    /// untouched.
    pub fn update_password(&mut self, new_password: &str) -> Result<(), AccessError> {
        self.session.last_error = None;
        debug!("updating password");
        let result = self.update_password_inner(new_password);
        self.record_auth(result)
    }

    fn update_password_inner(&mut self, new_password: &str) -> Result<(), AccessError> {
        let (_, token) = self.require_session()?;
        let update = UserUpdate {
            password: Some(new_password.to_string()),
            ..Default::default()
        };
        self.send_user_update(&token, &update)?;
        Ok(())
    }

    /// Store an avatar under the user's folder and record its public URL
    /// in the user metadata. Returns the public URL.
    pub fn upload_avatar(&mut self, file_name: &str, content: &[u8]) -> Result<String, AccessError> {
        self.session.last_error = None;
        debug!(file_name, "uploading avatar");
        let result = self.upload_avatar_inner(file_name, content);
        self.record_auth(result)
    }

    fn upload_avatar_inner(&mut self, file_name: &str, content: &[u8]) -> Result<String, AccessError> {
        let (user_id, token) = self.require_session()?;
        let extension = file_name.rsplit('.').next().unwrap_or("bin");
        let path = format!("{user_id}/avatar.{extension}");

        // A previous avatar may or may not exist; a failed removal is not
        // an error.
        let request = self.platform.build_remove_avatar_object(&token, &path);
        if let Ok(response) = self.execute(request) {
            let _ = self.platform.parse_remove_avatar_object(response);
        }

        let request = self.platform.build_upload_avatar(&token, &path, content);
        let response = self.execute(request)?;
        self.platform.parse_upload_avatar(response)?;

        let avatar_url = self.platform.avatar_public_url(&path);
        let update = UserUpdate {
            data: Some(MetadataPatch {
                avatar_url: Some(Some(avatar_url.clone())),
                ..Default::default()
            }),
            ..Default::default()
        };
        let raw = self.send_user_update(&token, &update)?;
        let user = User::from_auth(raw, DEFAULT_FULL_NAME)?;
        self.replace_user(user);
        Ok(avatar_url)
    }

    /// Delete every object in the user's avatar folder and clear the URL
    /// from the user metadata.
    pub fn remove_avatar(&mut self) -> Result<(), AccessError> {
        self.session.last_error = None;
        debug!("removing avatar");
        let result = self.remove_avatar_inner();
        self.record_auth(result)
    }

    fn remove_avatar_inner(&mut self) -> Result<(), AccessError> {
        let (user_id, token) = self.require_session()?;

        // The listing mirrors what the bucket holds; a failure just means
        // there is nothing to delete.
        let objects = self
            .platform
            .build_list_avatar_folder(&token, &user_id)
            .and_then(|request| self.execute(request))
            .and_then(|response| self.platform.parse_list_avatar_folder(response))
            .unwrap_or_default();
        for object in objects {
            let path = format!("{user_id}/{}", object.name);
            let request = self.platform.build_remove_avatar_object(&token, &path);
            if let Ok(response) = self.execute(request) {
                let _ = self.platform.parse_remove_avatar_object(response);
            }
        }

        let update = UserUpdate {
            data: Some(MetadataPatch {
                avatar_url: Some(None),
                ..Default::default()
            }),
            ..Default::default()
        };
        let raw = self.send_user_update(&token, &update)?;
        let user = User::from_auth(raw, DEFAULT_FULL_NAME)?;
        self.replace_user(user);
        Ok(())
    }

    fn send_user_update(
        &mut self,
        token: &str,
        update: &UserUpdate,
    ) -> Result<crate::types::AuthUser, AccessError> {
        let request = self.platform.build_update_user(token, update)?;
        let response = self.execute(request)?;
        self.platform.parse_update_user(response)
    }

    fn record_auth<V>(&mut self, result: Result<V, AccessError>) -> Result<V, AccessError> {
        if let Err(error) = &result {
            warn!(%error, "session operation failed");
            self.session.last_error = Some(error.to_string());
        }
        result
    }
}
