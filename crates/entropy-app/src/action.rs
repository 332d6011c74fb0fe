//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use entropy_store::{RoomId, Session};

use crate::{Credentials, EnrichmentTicket, Pane, Upload};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Log in with validated credentials.
    Login(Credentials),

    /// Start the backend sync loop for a session.
    StartSyncing(Session),

    /// Send a text message.
    SendMessage {
        /// Target room
        room_id: RoomId,
        /// Message text
        body: String,
    },

    /// Upload a dropped file.
    Upload(Upload),

    /// Fetch media for a configured row.
    Enrich {
        /// List the row belongs to
        pane: Pane,
        /// What to fetch, and for which slot
        ticket: EnrichmentTicket,
    },
}
