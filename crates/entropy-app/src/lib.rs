//! Application layer for Entropy
//!
//! Screens that bind persisted rooms and messages to list UI, the pure App
//! state machine that routes input to them, and a generic runtime that
//! connects the App to a frontend and a backend. The same code runs in the
//! terminal client and in tests.
//!
//! # Components
//!
//! - [`ListBinding`]: drives a [`ListSurface`] from an observable collection
//! - [`CellRegistry`]: render-kind tagged row strategies
//! - [`SidebarScreen`] / [`ChatScreen`]: the two lists of the main window
//! - [`LoginForm`]: credential entry and validation
//! - [`App`]: UI state machine (input handling, room navigation, enrichment)
//! - [`Backend`] / [`Driver`]: traits for the async collaborator and for I/O
//! - [`Runtime`]: generic orchestration loop

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod backend;
mod binding;
mod cell;
mod chat;
mod driver;
mod file_drop;
mod error;
mod event;
mod format;
mod input;
mod login;
mod runtime;
mod settings;
mod sidebar;
mod state;
mod surface;
mod view;

pub use action::AppAction;
pub use app::App;
pub use backend::Backend;
pub use binding::{EnrichmentTicket, ListBinding};
pub use cell::{
    CellConfigurator, CellRegistry, EnrichmentRequest, ImageMessageCell, RoomCell, TextMessageCell,
};
pub use chat::ChatScreen;
pub use driver::Driver;
pub use file_drop::{DropOperation, Upload, drag_operation, perform_drop};
pub use error::{BackendError, BindingError, LoginError};
pub use event::AppEvent;
pub use format::{Formatters, grapheme_len, is_emoji_only};
pub use input::KeyInput;
pub use login::{Credentials, LoginField, LoginForm, LoginOutcome, validate_login_credentials};
pub use runtime::Runtime;
pub use settings::{LoginPrefill, Settings};
pub use sidebar::SidebarScreen;
pub use state::{Composer, Pane, Screen, SyncState};
pub use surface::{ListSurface, SlotId, SlotStamp, ViewList};
pub use view::{Media, RowView};
