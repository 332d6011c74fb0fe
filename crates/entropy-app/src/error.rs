//! Error types for bindings, login and the backend.

use entropy_core::{CollectionError, RenderKind};
use entropy_store::StoreError;
use thiserror::Error;

/// Errors raised while driving a list surface from change sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A change set or row lookup used an index that does not exist.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// The surface's row count no longer matches the binding's row model.
    ///
    /// Means something other than the binding changed the surface's rows.
    #[error("surface out of sync: binding has {expected} rows, surface shows {actual}")]
    SurfaceOutOfSync {
        /// Rows according to the binding
        expected: usize,
        /// Rows according to the surface
        actual: usize,
    },

    /// No cell strategy is registered for an item's render kind.
    #[error("no cell configurator registered for {0:?}")]
    NoConfigurator(RenderKind),
}

/// Errors reported by the backend collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The homeserver URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with an unacceptable status.
    #[error("server responded with status {status}: {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Reason phrase or server error text
        reason: String,
    },

    /// A request or response could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested media does not exist.
    #[error("media not found: {0}")]
    MediaNotFound(String),

    /// Local storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from logging in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Username was empty after trimming.
    #[error("username must not be empty")]
    MissingUsername,

    /// Password was empty.
    #[error("password must not be empty")]
    MissingPassword,

    /// Homeserver was empty, had an unsupported scheme or no host.
    #[error("invalid homeserver URL: {0:?}")]
    InvalidHomeserver(String),

    /// The backend rejected the login.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl LoginError {
    /// Text shown under the login form.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingUsername => "Please enter a username.".to_string(),
            Self::MissingPassword => "Please enter a password.".to_string(),
            Self::InvalidHomeserver(_) | Self::Backend(BackendError::InvalidUrl(_)) => {
                "Invalid Homeserver URL.".to_string()
            },
            Self::Backend(BackendError::Status { status: 403, .. }) => {
                "Incorrect username or password.".to_string()
            },
            Self::Backend(BackendError::Encoding(_)) => "Internal Error.".to_string(),
            Self::Backend(other) => other.to_string(),
        }
    }
}
