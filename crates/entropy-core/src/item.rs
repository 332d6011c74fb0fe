//! Item identity and render tagging.

use std::{fmt::Debug, hash::Hash};

/// A value with a stable identity, distinct from structural equality.
///
/// Content may change while `id()` stays the same; the collection diff relies
/// on this to tell an in-place update from a removal followed by an insertion.
pub trait Identified {
    /// Primary key type.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Stable identity of this item.
    fn id(&self) -> Self::Id;
}

/// How a row for an item is rendered.
///
/// Hosts pick a cell strategy by this tag instead of probing the item's
/// concrete type at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// Plain text row.
    Text,
    /// Row with an image attachment.
    Image,
}

/// Items that carry a render-kind tag.
pub trait Renderable {
    /// Render kind of this item.
    fn render_kind(&self) -> RenderKind;
}

/// Everything an observable collection needs from its items.
pub trait Item: Identified + Clone + PartialEq + Send + Sync + 'static {}

impl<T> Item for T where T: Identified + Clone + PartialEq + Send + Sync + 'static {}
