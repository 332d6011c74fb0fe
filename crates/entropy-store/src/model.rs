//! Persisted domain records.
//!
//! These are the items shown in the room sidebar and the chat list. They carry
//! stable identities (room id, event id) that the collection diff keys on, and
//! a render-kind tag that selects the row strategy.

use entropy_core::{Identified, RenderKind, Renderable};
use serde::{Deserialize, Serialize};

/// 128-bit room identifier.
pub type RoomId = u128;

/// Fully qualified user identifier (e.g. `@alice:example.org`).
pub type UserId = String;

/// Server-assigned event identifier of a message.
pub type EventId = String;

const SHORT_ID_HEX_WIDTH: usize = 4;

/// A user as embedded in rooms and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Fully qualified user ID.
    pub id: UserId,
    /// Display name. Falls back to the ID when empty.
    pub displayname: String,
    /// Avatar location, if the user has one.
    pub avatar_url: Option<String>,
}

impl User {
    /// Create a user with no avatar.
    pub fn new(id: impl Into<UserId>, displayname: impl Into<String>) -> Self {
        Self { id: id.into(), displayname: displayname.into(), avatar_url: None }
    }

    /// Name to show for this user.
    pub fn display_name(&self) -> &str {
        if self.displayname.trim().is_empty() { &self.id } else { &self.displayname }
    }
}

/// A joined room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room ID.
    pub id: RoomId,
    /// Explicit room name, if set.
    pub name: Option<String>,
    /// Canonical alias such as `#general:example.org`.
    pub canonical_alias: Option<String>,
    /// Joined members.
    pub members: Vec<User>,
    /// Timestamp of the most recent event (milliseconds since the epoch).
    pub last_activity_ms: i64,
}

impl Room {
    /// Create a room with only an ID and activity time.
    pub fn new(id: RoomId, last_activity_ms: i64) -> Self {
        Self { id, name: None, canonical_alias: None, members: Vec::new(), last_activity_ms }
    }

    /// Set the explicit name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the canonical alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.canonical_alias = Some(alias.into());
        self
    }

    /// Add a member.
    #[must_use]
    pub fn with_member(mut self, member: User) -> Self {
        self.members.push(member);
        self
    }

    /// Best human-readable name: explicit name, alias, member names, short ID.
    ///
    /// Never starts with `#`; the sidebar adds the prefix itself.
    pub fn smart_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        if let Some(alias) = self.canonical_alias.as_deref().map(str::trim).filter(|a| !a.is_empty())
        {
            let local = alias.trim_start_matches('#');
            return local.split(':').next().unwrap_or(local).to_string();
        }

        if !self.members.is_empty() {
            let names: Vec<&str> = self.members.iter().map(User::display_name).collect();
            return names.join(", ");
        }

        let full_hex = format!("{:x}", self.id);
        let tail = &full_hex[full_hex.len().saturating_sub(SHORT_ID_HEX_WIDTH)..];
        format!("{tail:0>SHORT_ID_HEX_WIDTH$}")
    }

    /// Sidebar order: most recent activity first, then ID.
    pub fn sort_key(&self) -> (std::cmp::Reverse<i64>, RoomId) {
        (std::cmp::Reverse(self.last_activity_ms), self.id)
    }
}

impl Identified for Room {
    type Id = RoomId;

    fn id(&self) -> RoomId {
        self.id
    }
}

impl Renderable for Room {
    fn render_kind(&self) -> RenderKind {
        RenderKind::Text
    }
}

/// Kind-specific message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text; the body is the content.
    Text,
    /// Image attachment; the body is the file name or caption.
    Image {
        /// Location of the full image.
        url: String,
        /// MIME type, if known.
        mimetype: Option<String>,
        /// Size in bytes, if known.
        size: Option<u64>,
    },
}

/// A message in a room timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Event ID.
    pub event_id: EventId,
    /// Room this message belongs to.
    pub room_id: RoomId,
    /// Sender.
    pub sender: User,
    /// Text body.
    pub body: String,
    /// Kind-specific content.
    pub content: MessageContent,
    /// Origin timestamp (milliseconds since the epoch).
    pub timestamp_ms: i64,
}

impl Message {
    /// Create a text message.
    pub fn text(
        event_id: impl Into<EventId>,
        room_id: RoomId,
        sender: User,
        body: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            room_id,
            sender,
            body: body.into(),
            content: MessageContent::Text,
            timestamp_ms,
        }
    }

    /// Create an image message.
    pub fn image(
        event_id: impl Into<EventId>,
        room_id: RoomId,
        sender: User,
        body: impl Into<String>,
        url: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            room_id,
            sender,
            body: body.into(),
            content: MessageContent::Image { url: url.into(), mimetype: None, size: None },
            timestamp_ms,
        }
    }

    /// Image location for image messages.
    pub fn image_url(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Image { url, .. } => Some(url),
            MessageContent::Text => None,
        }
    }

    /// Timeline order: oldest first, ties broken by event ID.
    pub fn sort_key(&self) -> (i64, &str) {
        (self.timestamp_ms, &self.event_id)
    }
}

impl Identified for Message {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.event_id.clone()
    }
}

impl Renderable for Message {
    fn render_kind(&self) -> RenderKind {
        match self.content {
            MessageContent::Text => RenderKind::Text,
            MessageContent::Image { .. } => RenderKind::Image,
        }
    }
}

/// A logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Logged-in user.
    pub user_id: UserId,
    /// Homeserver URL.
    pub homeserver: String,
    /// Opaque access token.
    pub access_token: String,
}

/// Sort rooms into sidebar order.
pub fn sort_rooms(rooms: &mut [Room]) {
    rooms.sort_by_key(Room::sort_key);
}

/// Sort messages into timeline order.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_name_prefers_explicit_name() {
        let room = Room::new(1, 0).with_name("Lobby").with_alias("#lobby:example.org");
        assert_eq!(room.smart_name(), "Lobby");
    }

    #[test]
    fn smart_name_falls_back_to_alias_localpart() {
        let room = Room::new(1, 0).with_alias("#rust:example.org");
        assert_eq!(room.smart_name(), "rust");
    }

    #[test]
    fn smart_name_falls_back_to_members() {
        let room = Room::new(1, 0)
            .with_member(User::new("@a:x", "Alice"))
            .with_member(User::new("@b:x", ""));
        assert_eq!(room.smart_name(), "Alice, @b:x");
    }

    #[test]
    fn smart_name_falls_back_to_short_id() {
        assert_eq!(Room::new(0xabcdef, 0).smart_name(), "cdef");
        assert_eq!(Room::new(0x1f, 0).smart_name(), "001f");
    }

    #[test]
    fn rooms_sort_by_recent_activity() {
        let mut rooms = vec![Room::new(1, 10), Room::new(2, 30), Room::new(3, 30)];
        sort_rooms(&mut rooms);
        let ids: Vec<RoomId> = rooms.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn image_messages_render_as_images() {
        let sender = User::new("@a:x", "Alice");
        let text = Message::text("$1", 1, sender.clone(), "hi", 0);
        let image = Message::image("$2", 1, sender, "cat.png", "mxc://x/cat", 1);

        assert_eq!(text.render_kind(), RenderKind::Text);
        assert_eq!(image.render_kind(), RenderKind::Image);
        assert_eq!(image.image_url(), Some("mxc://x/cat"));
    }
}
