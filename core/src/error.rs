//! Error type for the data-access layer.
//!
//! # Design
//! One enum covers the whole surface: platform rejections, transport
//! failures, codec failures, and local preconditions. The `Display` output
//! is the exact user-facing message the application shows and stores in the
//! per-store error slots, which is why the precondition variants carry fixed
//! French wording. `Platform` keeps the raw status for debugging but
//! displays only the message extracted from the platform's error body.

use std::fmt;

/// Errors returned by every operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The operation requires a signed-in user and none is present.
    SignedOut,

    /// The todo targeted by a local toggle is not in the fetched list.
    UnknownTodo,

    /// The platform reported success but returned no row.
    EmptyResponse,

    /// The platform rejected the call with a non-success status.
    Platform { status: u16, message: String },

    /// The transport could not complete the round-trip.
    Transport(String),

    /// A required configuration value is missing.
    Config(String),

    /// The request payload could not be encoded.
    Serialization(String),

    /// The response body did not match the expected shape.
    Deserialization(String),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::SignedOut => write!(f, "Utilisateur non connecté"),
            AccessError::UnknownTodo => write!(f, "Todo non trouvée"),
            AccessError::EmptyResponse => write!(f, "Aucune donnée retournée"),
            AccessError::Platform { status, message } => {
                if message.is_empty() {
                    write!(f, "HTTP {status}")
                } else {
                    write!(f, "{message}")
                }
            }
            AccessError::Transport(msg) => write!(f, "Erreur réseau: {msg}"),
            AccessError::Config(name) => write!(f, "Configuration manquante: {name}"),
            AccessError::Serialization(msg) => write!(f, "Requête invalide: {msg}"),
            AccessError::Deserialization(msg) => write!(f, "Réponse invalide: {msg}"),
        }
    }
}

impl std::error::Error for AccessError {}
