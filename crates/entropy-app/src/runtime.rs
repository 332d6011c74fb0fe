//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Backend`]: async collaborator, called from spawned tasks
//! - [`Driver`]: platform-specific I/O
//!
//! The App only ever runs on this loop. Backend calls are spawned so a slow
//! homeserver never blocks input; their results come back as [`AppEvent`]s
//! over an mpsc channel, next to the store's change feed.

use std::future::Future;

use entropy_store::{CollectionKey, Store};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};

use crate::{App, AppAction, AppEvent, Backend, Driver, EnrichmentRequest, LoginError};

/// Generic runtime that orchestrates App, Backend, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `B`: Backend the App's requests go to
/// - `S`: Store the App's lists read from
pub struct Runtime<D, B, S>
where
    D: Driver,
    B: Backend,
    S: Store,
{
    driver: D,
    backend: B,
    app: App<S>,
    changes: broadcast::Receiver<CollectionKey>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl<D, B, S> Runtime<D, B, S>
where
    D: Driver,
    B: Backend,
    S: Store,
{
    /// Create a runtime.
    ///
    /// `changes` must come from the change feed wrapping the App's store.
    pub fn new(driver: D, backend: B, app: App<S>, changes: broadcast::Receiver<CollectionKey>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { driver, backend, app, changes, events_tx, events_rx }
    }

    /// Run the main event loop until the App quits.
    ///
    /// Each cycle waits for whichever comes first: an input event, a change
    /// notification or a backend result. The event goes through the App and
    /// the resulting actions are executed.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let actions = self.app.start();
        if self.process_actions(actions)? {
            self.driver.stop();
            return Ok(());
        }

        let mut feed_open = true;
        loop {
            let event = tokio::select! {
                polled = self.driver.poll_event() => match polled? {
                    Some(event) => event,
                    None => continue,
                },
                change = self.changes.recv(), if feed_open => match change {
                    Ok(key) => AppEvent::CollectionChanged(key),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change feed lagged");
                        AppEvent::ChangesLagged
                    },
                    Err(RecvError::Closed) => {
                        tracing::debug!("change feed closed");
                        feed_open = false;
                        continue;
                    },
                },
                Some(event) = self.events_rx.recv() => event,
            };

            let actions = self.app.handle(event);
            if self.process_actions(actions)? {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Execute actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(true),
                AppAction::Login(credentials) => {
                    let backend = self.backend.clone();
                    self.spawn(async move {
                        Some(match backend.login(&credentials).await {
                            Ok(session) => AppEvent::LoggedIn(session),
                            Err(error) => AppEvent::LoginFailed(LoginError::from(error)),
                        })
                    });
                },
                AppAction::StartSyncing(session) => {
                    let backend = self.backend.clone();
                    self.spawn(async move {
                        Some(match backend.start_syncing(&session).await {
                            Ok(()) => AppEvent::SyncStarted,
                            Err(error) => AppEvent::SyncFailed(error),
                        })
                    });
                },
                AppAction::SendMessage { room_id, body } => {
                    let backend = self.backend.clone();
                    self.spawn(async move {
                        let error = backend.send_text(room_id, &body).await.err()?;
                        tracing::warn!(%error, room_id, "failed to send message");
                        Some(AppEvent::Error { message: format!("Failed to send message: {error}") })
                    });
                },
                AppAction::Upload(upload) => {
                    let backend = self.backend.clone();
                    self.spawn(async move {
                        let error = backend.upload_media(&upload).await.err()?;
                        tracing::warn!(%error, path = %upload.path.display(), "upload failed");
                        Some(AppEvent::Error {
                            message: format!("Failed to upload {}: {error}", upload.path.display()),
                        })
                    });
                },
                AppAction::Enrich { pane, ticket } => {
                    let backend = self.backend.clone();
                    self.spawn(async move {
                        let result = match &ticket.request {
                            EnrichmentRequest::Avatar { user_id } => backend.fetch_avatar(user_id).await,
                            EnrichmentRequest::Thumbnail { url } => backend.fetch_thumbnail(url).await,
                        };
                        Some(AppEvent::EnrichmentReady { pane, ticket, result })
                    });
                },
            }
        }
        Ok(false)
    }

    /// Run a backend call in the background and feed its event back.
    ///
    /// Fire-and-forget: nothing is cancelled, late results are matched (or
    /// dropped) by the App.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Option<AppEvent>> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = task.await {
                // Receiver gone means the runtime has stopped.
                let _ = events.send(event);
            }
        });
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<S> {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App<S> {
        &mut self.app
    }
}
