//! Library model: track records, the selection tree and download plans

pub mod selection;
pub mod track;
pub mod tree;

pub use selection::{count_steps, plan, Step};
pub use track::{ArtRef, Identifier, IdentifierKind, Timestamp, TrackRecord};
pub use tree::{sort_tracks, LibraryTree, Node, NodeId};
