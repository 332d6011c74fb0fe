//! Observable collections for Entropy
//!
//! Ordered, identity-keyed collections that report granular changes to their
//! observers, so list UIs can insert, remove or reload only the rows that
//! actually changed.
//!
//! # Components
//!
//! - [`ObservableCollection`]: canonical order, mutation and broadcast
//! - [`ChangeSet`]: one replayable step between two observed states
//! - [`Subscription`]: scoped registration with a FIFO delivery queue
//! - [`diff`]: identity diff producing ordered change sets

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod changeset;
mod collection;
mod error;
mod item;
mod subscription;

pub use changeset::{ChangeSet, DiffConfig, diff};
pub use collection::{Mutation, ObservableCollection};
pub use error::CollectionError;
pub use item::{Identified, Item, RenderKind, Renderable};
pub use subscription::{Subscription, SubscriptionId};
