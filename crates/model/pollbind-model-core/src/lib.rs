//! pollbind-model-core: the shared model tree and the dirty-checking primitives
//! (path resolution, structural snapshots, structural comparison).

pub mod coercion;
pub mod compare;
pub mod error;
pub mod json;
pub mod path;
pub mod snapshot;
pub mod tree;
pub mod value;

/// Nesting depth at which snapshot and comparison traversals give up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Widest run of `Undefined` padding a write past the end of a list may create.
pub const MAX_LIST_GAP: usize = 1024;

pub use compare::{identical, identical_with_limit};
pub use error::{ModelError, RecursionReason};
pub use path::ModelPath;
pub use snapshot::{deep_clone, Snapshot};
pub use tree::StateTree;
pub use value::{Map, Object, ObjectRef, Value};
