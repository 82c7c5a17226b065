//! Lumen asset pipeline.
//!
//! Discovers the files under a project root, gives each a persistent
//! [`AssetId`], decodes them into typed payloads on demand and keeps those
//! payloads current while their sources are edited.
//!
//! Payloads are handed out as [`AssetRef`]s. A reload writes into the same
//! allocation, so a reference taken once stays valid for the lifetime of the
//! [`AssetManager`] and always sees the latest successful decode.

pub mod cache;
pub mod config;
pub mod dispatch;
mod eager;
pub mod error;
pub mod event;
pub mod handle;
pub mod hot_reload;
pub mod importer;
pub mod index;
pub mod key;
pub mod kinds;
pub mod manager;
pub mod payload;
pub mod resolver;
pub mod scan;
pub mod source;
pub mod state;

pub use cache::{AssetCache, AssetRecord};
pub use config::AssetConfig;
pub use dispatch::{DispatchSender, Dispatcher};
pub use error::{AssetError, AssetResult};
pub use event::{AssetEvent, AssetEventBuffer, events_of};
pub use handle::{AssetRef, TrackedRef};
pub use hot_reload::{AssetWatcher, FileEvent, FileEventKind};
pub use importer::{AssetImporter, ErasedImporter, ImportContext, ImporterRegistry};
pub use index::AssetIndex;
pub use key::{AssetId, AssetKey, canonicalize};
pub use manager::AssetManager;
pub use payload::{Asset, AssetKind, AssetPayload};
pub use source::SourceFile;
pub use state::LoadState;
