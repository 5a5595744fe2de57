//! Stateful side of the data-access layer.
//!
//! # Design
//! `AppContext` is the single context object the application threads
//! through its views: it owns the platform client, the transport, the
//! session state, and the todo cache. There is no process-global state;
//! consumers hold the context and read through the accessor methods, which
//! expose the state read-only.
//!
//! Operations live in two impl blocks: session and profile management in
//! [`auth`], todo CRUD in [`todos`]. Each operation clears its store's
//! error slot, runs, and on failure writes the displayable message back
//! into the slot before returning the error. Session transitions invoke
//! the registered session-change listeners.

pub mod auth;
pub mod todos;

use crate::config::PlatformConfig;
use crate::error::AccessError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::platform::PlatformClient;
use crate::types::{Todo, User};

/// Callback invoked on every session transition with the authentication
/// flag and the signed-in user, if any.
pub type SessionListener = Box<dyn FnMut(bool, Option<&User>)>;

#[derive(Default)]
struct SessionState {
    user: Option<User>,
    access_token: Option<String>,
    last_error: Option<String>,
}

#[derive(Default)]
struct TodoState {
    items: Vec<Todo>,
    last_error: Option<String>,
}

/// Application context: platform client, transport, and reactive state.
pub struct AppContext<T: Transport> {
    platform: PlatformClient,
    transport: T,
    session: SessionState,
    todos: TodoState,
    listeners: Vec<SessionListener>,
}

impl<T: Transport> AppContext<T> {
    pub fn new(config: PlatformConfig, transport: T) -> Self {
        Self {
            platform: PlatformClient::new(config),
            transport,
            session: SessionState::default(),
            todos: TodoState::default(),
            listeners: Vec::new(),
        }
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.user.is_some()
    }

    /// Message of the last failed session or profile operation.
    pub fn auth_error(&self) -> Option<&str> {
        self.session.last_error.as_deref()
    }

    /// The cached todo list, as of the last successful fetch or mutation.
    pub fn todos(&self) -> &[Todo] {
        &self.todos.items
    }

    /// Message of the last failed todo operation.
    pub fn todos_error(&self) -> Option<&str> {
        self.todos.last_error.as_deref()
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AccessError> {
        self.transport.execute(request)
    }

    /// The owner id and token every todo and storage call runs under.
    fn require_session(&self) -> Result<(String, String), AccessError> {
        match (&self.session.user, &self.session.access_token) {
            (Some(user), Some(token)) => Ok((user.id.clone(), token.clone())),
            _ => Err(AccessError::SignedOut),
        }
    }

    fn install_session(&mut self, access_token: String, user: User) {
        self.session.access_token = Some(access_token);
        self.replace_user(user);
    }

    fn replace_user(&mut self, user: User) {
        self.session.user = Some(user);
        let user = self.session.user.as_ref();
        for listener in &mut self.listeners {
            listener(true, user);
        }
    }

    fn clear_session(&mut self) {
        let was_signed_in = self.session.user.is_some() || self.session.access_token.is_some();
        self.session.user = None;
        self.session.access_token = None;
        if was_signed_in {
            for listener in &mut self.listeners {
                listener(false, None);
            }
        }
    }
}
