//! In-process backend.
//!
//! Stands in for a homeserver: logins, sends and uploads are written straight
//! into the store through the change feed, exactly where a real sync would
//! put them. Uploaded files are kept in memory as the media repository.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use entropy_app::{Backend, BackendError, Credentials, Media, Upload};
use entropy_store::{ChangeFeed, Message, Room, RoomId, Session, Store, User, UserId};

/// ID of the room created on first sync.
pub const WELCOME_ROOM: RoomId = 1;

const SYSTEM_USER: &str = "@entropy:local";

/// Backend that keeps everything in the local store.
#[derive(Clone)]
pub struct LocalBackend<S: Store> {
    feed: ChangeFeed<S>,
    /// Accepted username/password pairs. Empty accepts everyone.
    accounts: Arc<HashMap<String, String>>,
    media: Arc<Mutex<HashMap<String, Media>>>,
    next_event: Arc<AtomicU64>,
}

impl<S: Store> LocalBackend<S> {
    /// Backend writing through `feed`, accepting any credentials.
    pub fn new(feed: ChangeFeed<S>) -> Self {
        Self {
            feed,
            accounts: Arc::new(HashMap::new()),
            media: Arc::new(Mutex::new(HashMap::new())),
            next_event: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Only accept `username` with `password` (plus other registered accounts).
    #[must_use]
    pub fn with_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.accounts).insert(username.into(), password.into());
        self
    }

    fn event_id(&self) -> String {
        let n = self.next_event.fetch_add(1, Ordering::Relaxed);
        format!("$local-{n}")
    }

    fn current_user(&self) -> Result<User, BackendError> {
        let session = self
            .feed
            .store()
            .load_session()?
            .ok_or_else(|| BackendError::Status { status: 401, reason: "Not logged in".into() })?;
        Ok(User::new(session.user_id.clone(), localpart(&session.user_id)))
    }
}

impl<S: Store> Backend for LocalBackend<S> {
    async fn login(&self, credentials: &Credentials) -> Result<Session, BackendError> {
        if !self.accounts.is_empty()
            && self.accounts.get(&credentials.username) != Some(&credentials.password)
        {
            tracing::debug!(user = %credentials.username, "login rejected");
            return Err(BackendError::Status { status: 403, reason: "Forbidden".into() });
        }

        let host = credentials
            .homeserver
            .split_once("://")
            .map_or(credentials.homeserver.as_str(), |(_, rest)| rest);
        let session = Session {
            user_id: format!("@{}:{host}", credentials.username),
            homeserver: credentials.homeserver.clone(),
            access_token: format!("local-{}", self.next_event.fetch_add(1, Ordering::Relaxed)),
        };
        self.feed.store_session(&session)?;
        tracing::info!(user = %session.user_id, "logged in");
        Ok(session)
    }

    async fn start_syncing(&self, session: &Session) -> Result<(), BackendError> {
        if !self.feed.store().list_rooms()?.is_empty() {
            return Ok(());
        }

        let now = now_ms();
        let me = User::new(session.user_id.clone(), localpart(&session.user_id));
        let system = User::new(SYSTEM_USER, "Entropy");
        let room = Room::new(WELCOME_ROOM, now).with_name("welcome").with_member(me).with_member(system.clone());
        self.feed.store_room(&room)?;
        self.feed.store_message(&Message::text(
            self.event_id(),
            WELCOME_ROOM,
            system,
            "Welcome to Entropy! Drop a file here to share it.",
            now,
        ))?;
        tracing::info!(user = %session.user_id, "created welcome room");
        Ok(())
    }

    async fn send_text(&self, room_id: RoomId, body: &str) -> Result<(), BackendError> {
        let message = Message::text(self.event_id(), room_id, self.current_user()?, body, now_ms());
        self.feed.store_message(&message)?;
        Ok(())
    }

    async fn upload_media(&self, upload: &Upload) -> Result<(), BackendError> {
        let data = tokio::fs::read(&upload.path)
            .await
            .map_err(|error| BackendError::Transport(format!("{}: {error}", upload.path.display())))?;

        let name = upload
            .path
            .file_name()
            .map_or_else(|| upload.path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let mimetype =
            mime_guess::from_path(&upload.path).first().map(|mime| mime.essence_str().to_string());
        let event_id = self.event_id();
        let url = format!("local://media/{}", event_id.trim_start_matches('$'));
        let sender = self.current_user()?;

        let message = if mimetype.as_deref().is_some_and(|mimetype| mimetype.starts_with("image/")) {
            Message::image(event_id, upload.room_id, sender, name, url.clone(), now_ms())
        } else {
            Message::text(event_id, upload.room_id, sender, format!("[file] {name}"), now_ms())
        };

        self.media.lock().unwrap_or_else(PoisonError::into_inner).insert(url, Media {
            source: upload.path.display().to_string(),
            mimetype,
            data,
        });
        self.feed.store_message(&message)?;
        Ok(())
    }

    async fn fetch_avatar(&self, user_id: &UserId) -> Result<Media, BackendError> {
        // Avatars are the user's initial.
        let initial = localpart(user_id).chars().next().map(|c| c.to_uppercase().to_string());
        Ok(Media {
            source: user_id.clone(),
            mimetype: Some("text/plain".into()),
            data: initial.unwrap_or_default().into_bytes(),
        })
    }

    async fn fetch_thumbnail(&self, url: &str) -> Result<Media, BackendError> {
        self.media
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| BackendError::MediaNotFound(url.to_string()))
    }
}

/// `alice` for `@alice:example.org`.
fn localpart(user_id: &str) -> &str {
    let id = user_id.strip_prefix('@').unwrap_or(user_id);
    id.split_once(':').map_or(id, |(local, _)| local)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use entropy_store::{CollectionKey, MemoryStore};

    use super::*;

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "alice".into(),
            password: password.into(),
            homeserver: "https://example.org".into(),
        }
    }

    #[test]
    fn localpart_strips_sigil_and_server() {
        assert_eq!(localpart("@alice:example.org"), "alice");
        assert_eq!(localpart("bob"), "bob");
    }

    #[tokio::test]
    async fn login_persists_session() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let backend = LocalBackend::new(feed.clone()).with_account("alice", "secret");

        let error = backend.login(&credentials("nope")).await.expect_err("rejected");
        assert_eq!(error, BackendError::Status { status: 403, reason: "Forbidden".into() });

        let session = backend.login(&credentials("secret")).await.expect("login");
        assert_eq!(session.user_id, "@alice:example.org");
        assert_eq!(feed.store().load_session().expect("load"), Some(session));
    }

    #[tokio::test]
    async fn first_sync_creates_welcome_room_once() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let mut changes = feed.subscribe();
        let backend = LocalBackend::new(feed.clone());
        let session = backend.login(&credentials("pw")).await.expect("login");

        backend.start_syncing(&session).await.expect("sync");
        backend.start_syncing(&session).await.expect("sync");

        assert_eq!(feed.store().list_rooms().expect("rooms").len(), 1);
        assert_eq!(feed.store().load_messages(WELCOME_ROOM).expect("messages").len(), 1);
        assert_eq!(changes.recv().await.expect("change"), CollectionKey::Rooms);
    }

    #[tokio::test]
    async fn sending_requires_a_session() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let backend = LocalBackend::new(feed.clone());
        assert!(matches!(
            backend.send_text(WELCOME_ROOM, "hi").await,
            Err(BackendError::Status { status: 401, .. })
        ));

        let session = backend.login(&credentials("pw")).await.expect("login");
        backend.start_syncing(&session).await.expect("sync");
        backend.send_text(WELCOME_ROOM, "hi").await.expect("send");

        let messages = feed.store().load_messages(WELCOME_ROOM).expect("messages");
        assert!(messages.iter().any(|message| message.body == "hi" && message.sender.id == session.user_id));
    }

    #[tokio::test]
    async fn uploaded_image_is_served_as_thumbnail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"not really a png").expect("write");

        let feed = ChangeFeed::new(MemoryStore::new());
        let backend = LocalBackend::new(feed.clone());
        let session = backend.login(&credentials("pw")).await.expect("login");
        backend.start_syncing(&session).await.expect("sync");

        backend.upload_media(&Upload { room_id: WELCOME_ROOM, path }).await.expect("upload");

        let messages = feed.store().load_messages(WELCOME_ROOM).expect("messages");
        let url = messages.iter().find_map(Message::image_url).expect("image message");
        let thumbnail = backend.fetch_thumbnail(url).await.expect("thumbnail");
        assert_eq!(thumbnail.data, b"not really a png");
        assert_eq!(thumbnail.mimetype.as_deref(), Some("image/png"));

        assert!(matches!(
            backend.fetch_thumbnail("local://media/missing").await,
            Err(BackendError::MediaNotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_kind_follows_content_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let feed = ChangeFeed::new(MemoryStore::new());
        let backend = LocalBackend::new(feed.clone());
        let session = backend.login(&credentials("pw")).await.expect("login");
        backend.start_syncing(&session).await.expect("sync");

        for name in ["scan.bmp", "logo.svg", "notes.txt"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"data").expect("write");
            backend.upload_media(&Upload { room_id: WELCOME_ROOM, path }).await.expect("upload");
        }

        let messages = feed.store().load_messages(WELCOME_ROOM).expect("messages");
        let mut images: Vec<&str> = messages
            .iter()
            .filter(|message| message.image_url().is_some())
            .map(|message| message.body.as_str())
            .collect();
        images.sort_unstable();
        assert_eq!(images, ["logo.svg", "scan.bmp"]);
        assert!(messages.iter().any(|message| message.body == "[file] notes.txt"));

        let url = messages
            .iter()
            .find(|message| message.body == "logo.svg")
            .and_then(Message::image_url)
            .expect("image url");
        let media = backend.fetch_thumbnail(url).await.expect("thumbnail");
        assert_eq!(media.mimetype.as_deref(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn missing_upload_fails_without_message() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let backend = LocalBackend::new(feed.clone());
        let session = backend.login(&credentials("pw")).await.expect("login");
        backend.start_syncing(&session).await.expect("sync");

        let upload = Upload { room_id: WELCOME_ROOM, path: "/no/such/file.png".into() };
        assert!(matches!(backend.upload_media(&upload).await, Err(BackendError::Transport(_))));
        assert_eq!(feed.store().load_messages(WELCOME_ROOM).expect("messages").len(), 1);
    }
}
