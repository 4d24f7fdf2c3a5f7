//! # atlas-cells
//!
//! Turns chat messages into renderable cells.
//!
//! This crate provides:
//! - **Bounded caches** - LRU caches limited by the summed size of their entries
//! - **Cell factories** - text, three-part image, location, basic image and generic MIME
//! - **Registry** - first-match dispatch of messages to factories
//! - **Image loading boundary** - requests, pause/resume tags and `layer:` part resolution
//! - **Senders** - text, image and location drafts in the formats the factories read
//! - **Scoped capabilities** - handles that fail cleanly once their screen is gone
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use atlas_cells::{CellHolderSpecs, CellRegistry, CellsConfig, ImageLoader};
//!
//! let loader: Arc<dyn ImageLoader> = Arc::new(MyLoader::new());
//! let registry = CellRegistry::with_defaults(&CellsConfig::default(), &loader);
//!
//! let view_type = registry.view_type(&message, is_me).expect("generic fallback accepts all");
//! let mut holder = registry.create_holder(view_type).expect("registered factory");
//! registry.bind(&mut holder, &message, &CellHolderSpecs::new(is_me, 0, 480, 800))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod cell;
mod config;
mod error;
pub mod lifecycle;
pub mod loader;
mod registry;
pub mod sender;

pub use cache::{CacheStats, Cacheable, SizedLruCache};
pub use cell::{
    CachedCellFactory, CellAction, CellContent, CellFactory, CellHolder, CellHolderSpecs,
    CellTheme, CellView, ImageStage, ImageView, ViewType,
};
pub use config::{CellsConfig, CellsConfigBuilder};
pub use error::{Error, Result};
pub use lifecycle::{Scope, ScopedHandle};
pub use loader::{
    ImageLoader, ImageRequest, ImageSource, LoadCallback, LoadedFrom, LoadedPart,
    MessagePartRequestHandler, PartStore, ScaleMode, ScrollState,
};
pub use registry::CellRegistry;
pub use sender::{
    Conversation, Coordinates, ImageSender, LocationProvider, LocationSender, TextSender,
};
