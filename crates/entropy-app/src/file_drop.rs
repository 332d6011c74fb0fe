//! File drops onto the chat.

use std::path::PathBuf;

use entropy_store::RoomId;

/// What a drop would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropOperation {
    /// Drop is refused.
    #[default]
    None,
    /// Files are copied (uploaded) into the open room.
    Copy,
}

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Target room
    pub room_id: RoomId,
    /// Local file
    pub path: PathBuf,
}

/// Operation offered while files are dragged over the chat.
///
/// Copy when a room is open and at least one path is dragged.
pub fn drag_operation(room: Option<RoomId>, paths: &[PathBuf]) -> DropOperation {
    if room.is_some() && !paths.is_empty() { DropOperation::Copy } else { DropOperation::None }
}

/// Uploads for dropped files, one per path. Empty if the drop is refused.
pub fn perform_drop(room: Option<RoomId>, paths: Vec<PathBuf>) -> Vec<Upload> {
    let Some(room_id) = room.filter(|_| drag_operation(room, &paths) == DropOperation::Copy) else {
        tracing::debug!(files = paths.len(), "drop refused");
        return Vec::new();
    };
    paths.into_iter().map(|path| Upload { room_id, path }).collect()
}
