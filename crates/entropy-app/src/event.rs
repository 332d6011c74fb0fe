//! Application input events.
//!
//! This module defines [`AppEvent`], the inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from three sources:
//! - User interactions (keyboard, paste, resize, file drops) and ticks.
//! - The store's change feed.
//! - Results of backend calls the runtime spawned.

use std::path::PathBuf;

use entropy_store::{CollectionKey, Session};

use crate::{BackendError, EnrichmentTicket, KeyInput, LoginError, Media, Pane};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Text pasted into the terminal.
    Paste(String),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// A persisted collection may have changed.
    CollectionChanged(CollectionKey),

    /// Change notifications were lost; everything shown must be re-read.
    ChangesLagged,

    /// Login succeeded.
    LoggedIn(Session),

    /// Login failed.
    LoginFailed(LoginError),

    /// The backend is syncing.
    SyncStarted,

    /// The backend could not start syncing.
    SyncFailed(BackendError),

    /// Files are being dragged over the chat.
    FilesDragged {
        /// Dragged files
        paths: Vec<PathBuf>,
    },

    /// Files were dropped on the chat.
    FilesDropped {
        /// Dropped files
        paths: Vec<PathBuf>,
    },

    /// An avatar or thumbnail fetch finished.
    EnrichmentReady {
        /// List the ticket was issued for
        pane: Pane,
        /// Ticket from configuration time
        ticket: EnrichmentTicket,
        /// Fetched media
        result: Result<Media, BackendError>,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
