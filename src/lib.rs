//! Headless live view for a thermal camera webserver.
//!
//! The webserver pushes a JSON batch of auxiliary images over `/ws` for every
//! processed frame. This crate keeps that socket alive, decodes each batch
//! and reconciles it against an in-memory page: the primary camera image,
//! the `webimgs` container and one panel per image name.
//!
//! ```rust,ignore
//! let cfg = ViewerConfig::default();
//! let manager = ConnectionManager::new(cfg.connection()?);
//! let mut live = LiveView::new(cfg.layout).with_snapshot("live.html");
//! let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! manager.run(&mut live, stop_rx).await;
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod dom;
pub mod error;
pub mod layout;
pub mod live;
pub mod protocol;
pub mod render;

pub use config::ViewerConfig;
pub use connection::{socket_url, ConnectionConfig, ConnectionManager, ConnectionState, FrameHandler};
pub use error::{LiveViewError, Result};
pub use layout::{BatchShape, GridPos, LayoutVersion, Placement};
pub use live::LiveView;
pub use protocol::{decode, HeatSource, ImageBatch, ImageDescriptor, UpdateMessage};
pub use render::{RenderSummary, Renderer};
