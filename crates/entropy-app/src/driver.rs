//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from a specific
//! terminal or windowing library. Each frontend implements it, while the
//! generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use entropy_store::Store;

use crate::{App, AppEvent};

/// Abstracts user-facing I/O for the application runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm events, ratatui rendering
/// - **Tests**: scripted events, recorded renders
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input event.
    ///
    /// Returns `None` if nothing happened within the driver's poll interval.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render<S: Store>(&mut self, app: &App<S>) -> Result<(), Self::Error>;

    /// Restore the terminal and clean up resources.
    fn stop(&mut self);
}
