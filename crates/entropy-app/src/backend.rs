//! Backend collaborator.
//!
//! Everything behind this trait (homeserver API, sync, media repository) is
//! out of the app's hands. The backend writes what it receives into the
//! store; the app only ever sees it through the change feed.

use std::future::Future;

use entropy_store::{RoomId, Session, UserId};

use crate::{BackendError, Credentials, Media, Upload};

/// Async operations the app asks the backend for.
///
/// Clones share one backend; the runtime moves a clone into every spawned
/// call.
pub trait Backend: Clone + Send + Sync + 'static {
    /// Log in and persist the resulting session.
    ///
    /// # Errors
    ///
    /// [`BackendError::Status`] with 403 for wrong credentials, other variants
    /// for unreachable or invalid homeservers.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, BackendError>> + Send;

    /// Start the sync loop for `session`.
    ///
    /// Resolves once syncing runs; the loop itself belongs to the backend and
    /// reports through the store.
    fn start_syncing(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Send a text message to `room_id`.
    fn send_text(
        &self,
        room_id: RoomId,
        body: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Upload a local file as a message.
    fn upload_media(&self, upload: &Upload) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Avatar of `user_id`.
    fn fetch_avatar(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Media, BackendError>> + Send;

    /// Thumbnail for the image at `url`.
    fn fetch_thumbnail(&self, url: &str)
    -> impl Future<Output = Result<Media, BackendError>> + Send;
}
