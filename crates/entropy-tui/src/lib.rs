//! Terminal UI for Entropy
//!
//! A thin shell over [`entropy_app::Driver`] that provides terminal-specific
//! I/O, plus an in-process backend. All orchestration logic lives in the
//! generic [`entropy_app::Runtime`].
//!
//! This crate only handles terminal rendering, input conversion and wiring.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod config;
pub mod input;
pub mod terminal;
pub mod ui;

pub use backend::LocalBackend;
pub use config::Args;
pub use entropy_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
