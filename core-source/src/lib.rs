//! # Media Source Core
//!
//! Timeline-synchronized media source nodes: the state machine binding a
//! parent graph's timeline to adaptive streaming media resources.
//!
//! ## Overview
//!
//! This crate handles:
//! - Scheduling states derived from timeline position and window bounds
//! - Element lifecycle (pool or factory acquisition, bind/release episodes)
//! - Clock reconciliation (source offset, global/local rate product)
//! - Readiness gating and lifecycle event notification
//!
//! The platform capabilities a node drives (media elements, element pools,
//! streaming backends) are defined in the `bridge-media` crate and injected
//! through [`SourceBridges`].

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod state;

pub use config::{QualityPolicy, SourceBridges, SourceBridgesBuilder, SourceConfig};
pub use error::{Result, SourceError};
pub use events::{EventBus, EventStream, SourceEvent, DEFAULT_EVENT_BUFFER_SIZE};
pub use node::MediaSourceNode;
pub use state::SourceState;
