//! # appkit-store
//!
//! Components storage for apps.
//!
//! Every app owns an ordered list of components (pages, post lists,
//! add-on provided screens, ...). The whole list lives in a single JSON
//! value of the app's key-value metadata, so storage is nothing more than
//! "read the value, change the map, write the value back".
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ComponentStore<M>  (list/find/upsert)  │
//! ├─────────────────────────────────────────┤
//! │  MetadataStore trait (owner, key) → JSON│
//! │    SqliteMetadataStore | InMemory       │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL) + Migrations   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use appkit_store::{Component, ComponentStore, Database, SqliteMetadataStore};
//!
//! let db = Database::open_and_migrate("data/appkit.db").await?;
//! let components = ComponentStore::new(SqliteMetadataStore::new(db));
//! let id = components.upsert(12, Component::new("news", "posts-list"), None).await?;
//! ```

pub mod component;
pub mod components;
pub mod db;
pub mod error;
pub mod meta;
pub mod migration;

// ── re-exports ───────────────────────────────────────────────────────

pub use component::{Component, ComponentId, ComponentRef, Components};
pub use components::{ComponentStore, COMPONENTS_META_KEY};
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use meta::{AppId, InMemoryMetadataStore, MAX_APP_ID, MetadataStore, SqliteMetadataStore};
