//! Todo CRUD against the `todos` table.
//!
//! The cached list mirrors the last successful fetch and is adjusted in
//! place after each successful mutation: creations are prepended (the list
//! is ordered newest first), updates replace their entry, deletions drop
//! it. Every operation runs under the signed-in user's id; without a
//! session nothing is sent and the operation fails with the fixed
//! precondition message.

use tracing::{debug, warn};

use crate::error::AccessError;
use crate::http::Transport;
use crate::types::{Todo, TodoInsert, TodoPatch, TodoStatus};

use super::AppContext;

impl<T: Transport> AppContext<T> {
    /// Fetch the owner's todos, newest first, and replace the cache.
    pub fn fetch_todos(&mut self) -> Result<&[Todo], AccessError> {
        self.todos.last_error = None;
        debug!("fetching todos");
        match self.fetch_todos_inner() {
            Ok(()) => Ok(&self.todos.items),
            Err(error) => Err(self.record_todos(error)),
        }
    }

    fn fetch_todos_inner(&mut self) -> Result<(), AccessError> {
        let (user_id, token) = self.require_session()?;
        let request = self.platform.build_list_todos(&token, &user_id);
        let response = self.execute(request)?;
        let rows = self.platform.parse_list_todos(response)?;
        let items = rows
            .into_iter()
            .map(Todo::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.todos.items = items;
        Ok(())
    }

    /// Insert a todo owned by the signed-in user. On success the new todo
    /// is prepended to the cache.
    pub fn create_todo(
        &mut self,
        title: &str,
        description: Option<&str>,
        status: TodoStatus,
    ) -> Result<Todo, AccessError> {
        self.todos.last_error = None;
        debug!(title, "creating todo");
        match self.create_todo_inner(title, description, status) {
            Ok(todo) => Ok(todo),
            Err(error) => Err(self.record_todos(error)),
        }
    }

    fn create_todo_inner(
        &mut self,
        title: &str,
        description: Option<&str>,
        status: TodoStatus,
    ) -> Result<Todo, AccessError> {
        let (user_id, token) = self.require_session()?;
        let insert = TodoInsert {
            title: title.to_string(),
            description: description.map(str::to_string),
            status,
            user_id,
        };
        let request = self.platform.build_insert_todo(&token, &insert)?;
        let response = self.execute(request)?;
        let row = self.platform.parse_insert_todo(response)?;
        let todo = Todo::from_row(row)?;
        self.todos.items.insert(0, todo.clone());
        Ok(todo)
    }

    /// Apply a partial update to one of the owner's todos. On success the
    /// cached entry reflects the returned row exactly.
    pub fn update_todo(&mut self, id: i64, changes: TodoPatch) -> Result<Todo, AccessError> {
        self.todos.last_error = None;
        debug!(id, "updating todo");
        match self.update_todo_inner(id, changes) {
            Ok(todo) => Ok(todo),
            Err(error) => Err(self.record_todos(error)),
        }
    }

    fn update_todo_inner(&mut self, id: i64, changes: TodoPatch) -> Result<Todo, AccessError> {
        let (user_id, token) = self.require_session()?;
        let request = self
            .platform
            .build_update_todo(&token, id, &user_id, &changes)?;
        let response = self.execute(request)?;
        let row = self.platform.parse_update_todo(response)?;
        let todo = Todo::from_row(row)?;
        if let Some(entry) = self.todos.items.iter_mut().find(|t| t.id == id) {
            *entry = todo.clone();
        }
        Ok(todo)
    }

    /// Delete one of the owner's todos and drop it from the cache.
    pub fn delete_todo(&mut self, id: i64) -> Result<(), AccessError> {
        self.todos.last_error = None;
        debug!(id, "deleting todo");
        match self.delete_todo_inner(id) {
            Ok(()) => Ok(()),
            Err(error) => Err(self.record_todos(error)),
        }
    }

    fn delete_todo_inner(&mut self, id: i64) -> Result<(), AccessError> {
        let (user_id, token) = self.require_session()?;
        let request = self.platform.build_delete_todo(&token, id, &user_id);
        let response = self.execute(request)?;
        self.platform.parse_delete_todo(response)?;
        self.todos.items.retain(|t| t.id != id);
        Ok(())
    }

    /// Flip a cached todo between its two statuses.
    pub fn toggle_todo_status(&mut self, id: i64) -> Result<Todo, AccessError> {
        self.todos.last_error = None;
        let Some(todo) = self.todos.items.iter().find(|t| t.id == id) else {
            return Err(self.record_todos(AccessError::UnknownTodo));
        };
        let next = todo.status.toggled();
        self.update_todo(
            id,
            TodoPatch {
                status: Some(next),
                ..Default::default()
            },
        )
    }

    /// Drop the cached list and error, typically on sign-out.
    pub fn clear_todos(&mut self) {
        self.todos.items.clear();
        self.todos.last_error = None;
    }

    fn record_todos(&mut self, error: AccessError) -> AccessError {
        warn!(%error, "todo operation failed");
        self.todos.last_error = Some(error.to_string());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FakeTransport;
    use super::*;
    use crate::config::PlatformConfig;
    use crate::http::HttpMethod;

    const SESSION_BODY: &str = r#"{"access_token":"jeton-1","token_type":"bearer","user":{"id":"u-1","email":"marie@example.com","created_at":"2024-01-01T00:00:00Z","user_metadata":{"full_name":"Marie Dupont"}}}"#;

    fn signed_in_context() -> AppContext<FakeTransport> {
        let mut ctx = AppContext::new(
            PlatformConfig::new("http://localhost:54321", "clef-anon"),
            FakeTransport::new(),
        );
        ctx.transport.push(200, SESSION_BODY);
        ctx.sign_in("marie@example.com", "motdepasse8").unwrap();
        ctx
    }

    fn row(id: i64, title: &str, status: &str, created_at: &str) -> String {
        format!(
            r#"{{"id":{id},"created_at":"{created_at}","title":"{title}","description":null,"status":"{status}","user_id":"u-1"}}"#
        )
    }

    #[test]
    fn mutations_without_a_session_make_no_call() {
        let mut ctx = AppContext::new(
            PlatformConfig::new("http://localhost:54321", "clef-anon"),
            FakeTransport::new(),
        );

        assert_eq!(ctx.fetch_todos().unwrap_err(), AccessError::SignedOut);
        assert_eq!(
            ctx.create_todo("A", None, TodoStatus::EnCours).unwrap_err(),
            AccessError::SignedOut
        );
        assert_eq!(
            ctx.update_todo(1, TodoPatch::default()).unwrap_err(),
            AccessError::SignedOut
        );
        assert_eq!(ctx.delete_todo(1).unwrap_err(), AccessError::SignedOut);

        assert_eq!(ctx.todos_error(), Some("Utilisateur non connecté"));
        assert_eq!(ctx.transport.request_count(), 0);
    }

    #[test]
    fn fetch_replaces_the_cache_newest_first() {
        let mut ctx = signed_in_context();
        ctx.transport.push(
            200,
            &format!(
                "[{},{}]",
                row(2, "B", "en_cours", "2024-01-02T00:00:00Z"),
                row(1, "A", "termine", "2024-01-01T00:00:00Z")
            ),
        );
        let todos = ctx.fetch_todos().unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].id, 2);
        assert_eq!(todos[1].status, TodoStatus::Termine);

        let request = ctx.transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.path.contains("user_id=eq.u-1"));
        assert!(request.path.contains("order=created_at.desc"));
    }

    #[test]
    fn create_prepends_the_new_todo() {
        let mut ctx = signed_in_context();
        ctx.transport
            .push(200, &format!("[{}]", row(1, "A", "en_cours", "2024-01-01T00:00:00Z")));
        ctx.fetch_todos().unwrap();

        ctx.transport
            .push(201, &row(2, "B", "en_cours", "2024-01-02T00:00:00Z"));
        let todo = ctx.create_todo("B", None, TodoStatus::EnCours).unwrap();
        assert_eq!(todo.id, 2);
        assert_eq!(ctx.todos()[0].id, 2);
        assert_eq!(ctx.todos().len(), 2);

        let request = ctx.transport.last_request().unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["user_id"], "u-1");
    }

    #[test]
    fn update_replaces_the_cached_entry_exactly() {
        let mut ctx = signed_in_context();
        ctx.transport
            .push(200, &format!("[{}]", row(1, "A", "en_cours", "2024-01-01T00:00:00Z")));
        ctx.fetch_todos().unwrap();

        ctx.transport.push(
            200,
            r#"{"id":1,"created_at":"2024-01-01T00:00:00Z","title":"A2","description":"détail","status":"termine","user_id":"u-1"}"#,
        );
        let todo = ctx
            .update_todo(
                1,
                TodoPatch {
                    title: Some("A2".to_string()),
                    description: Some(Some("détail".to_string())),
                    status: Some(TodoStatus::Termine),
                },
            )
            .unwrap();
        assert_eq!(todo.title, "A2");
        assert_eq!(ctx.todos()[0].title, "A2");
        assert_eq!(ctx.todos()[0].description.as_deref(), Some("détail"));
        assert_eq!(ctx.todos()[0].status, TodoStatus::Termine);
    }

    #[test]
    fn delete_drops_the_cached_entry() {
        let mut ctx = signed_in_context();
        ctx.transport.push(
            200,
            &format!(
                "[{},{}]",
                row(2, "B", "en_cours", "2024-01-02T00:00:00Z"),
                row(1, "A", "en_cours", "2024-01-01T00:00:00Z")
            ),
        );
        ctx.fetch_todos().unwrap();

        ctx.transport.push(204, "");
        ctx.delete_todo(2).unwrap();
        assert_eq!(ctx.todos().len(), 1);
        assert_eq!(ctx.todos()[0].id, 1);
    }

    #[test]
    fn toggle_flips_between_the_two_statuses() {
        let mut ctx = signed_in_context();
        ctx.transport
            .push(200, &format!("[{}]", row(1, "A", "en_cours", "2024-01-01T00:00:00Z")));
        ctx.fetch_todos().unwrap();

        ctx.transport
            .push(200, &row(1, "A", "termine", "2024-01-01T00:00:00Z"));
        let todo = ctx.toggle_todo_status(1).unwrap();
        assert_eq!(todo.status, TodoStatus::Termine);

        let request = ctx.transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "termine"}));

        ctx.transport
            .push(200, &row(1, "A", "en_cours", "2024-01-01T00:00:00Z"));
        let todo = ctx.toggle_todo_status(1).unwrap();
        assert_eq!(todo.status, TodoStatus::EnCours);
    }

    #[test]
    fn toggle_of_an_unknown_todo_fails_locally() {
        let mut ctx = signed_in_context();
        let calls_before = ctx.transport.request_count();
        let err = ctx.toggle_todo_status(99).unwrap_err();
        assert_eq!(err, AccessError::UnknownTodo);
        assert_eq!(ctx.todos_error(), Some("Todo non trouvée"));
        assert_eq!(ctx.transport.request_count(), calls_before);
    }

    #[test]
    fn platform_rejection_fills_the_error_slot() {
        let mut ctx = signed_in_context();
        ctx.transport.push(
            406,
            r#"{"message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        let err = ctx.update_todo(42, TodoPatch::default()).unwrap_err();
        assert!(matches!(err, AccessError::Platform { status: 406, .. }));
        assert_eq!(
            ctx.todos_error(),
            Some("JSON object requested, multiple (or no) rows returned")
        );
    }

    #[test]
    fn clear_todos_empties_cache_and_error() {
        let mut ctx = signed_in_context();
        ctx.transport
            .push(200, &format!("[{}]", row(1, "A", "en_cours", "2024-01-01T00:00:00Z")));
        ctx.fetch_todos().unwrap();
        let _ = ctx.toggle_todo_status(99);

        ctx.clear_todos();
        assert!(ctx.todos().is_empty());
        assert_eq!(ctx.todos_error(), None);
    }
}
