//! External collaborators reachable from every handler.
//!
//! # Data Flow
//! ```text
//! main / tests
//!     → build persistence, identity and storage handles
//!     → AppState (Arc handles, cloned per request, never copied deeply)
//!     → handler groups and the authorization gate
//! ```
//!
//! The request pipeline only forwards these handles; it never calls them
//! itself except through the authorization gate.

pub mod identity;
pub mod persistence;
pub mod storage;

pub use identity::{Identity, IdentityClient, IdentityError, StaticTokenIdentity};
pub use persistence::{MemoryStore, ModelHandle, Persistence, StoreError};
pub use storage::{MemoryStorage, StorageClient, StorageError, StoredObject};
