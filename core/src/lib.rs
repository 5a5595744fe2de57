//! Client-side data-access layer for a hosted-platform todo application.
//!
//! # Overview
//! Everything here is boundary translation: credentials and todo edits go
//! out to the hosted platform's identity, table, and storage endpoints;
//! the platform's row and user shapes come back and are mirrored into the
//! application view models. No persistence, scheduling, or consistency
//! logic lives on this side of the wire.
//!
//! # Design
//! - `PlatformClient` is stateless: each operation is a `build_*` method
//!   producing an `HttpRequest` and a `parse_*` method consuming an
//!   `HttpResponse`, so the wire surface stays deterministic and testable.
//! - The round-trip itself goes through the `Transport` trait supplied by
//!   the embedding application.
//! - `AppContext` is the stateful layer on top: it holds the session, the
//!   cached todo list, and the per-store error slots, and exposes the
//!   state through read-only accessors.
//! - Wire shapes are defined independently from the mock platform crate;
//!   integration tests catch schema drift.

pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod store;
pub mod types;
pub mod validate;

pub use config::PlatformConfig;
pub use error::AccessError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use platform::PlatformClient;
pub use store::AppContext;
pub use types::{Todo, TodoInsert, TodoPatch, TodoRow, TodoStatus, User};
