//! # Host Media Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core source node and the
//! platform pieces it drives but does not own. Each trait represents a
//! capability that the core requires but that must be implemented differently
//! per platform (desktop, mobile, web).
//!
//! ## Traits
//!
//! ### Playable Resource
//! - [`MediaElement`](element::MediaElement) - Narrow control surface over a
//!   host-owned playable element (readiness, seek, rate, volume, attributes)
//! - [`MediaElementFactory`](element::MediaElementFactory) - Creates fresh
//!   elements when no pool is configured
//! - [`ElementPool`](pool::ElementPool) - Shared element cache with explicit
//!   acquire/release ownership transfer
//!
//! ### Adaptive Streaming
//! - [`StreamingBackend`](streaming::StreamingBackend) - Manifest loading,
//!   quality control, and volume for one element binding
//! - [`StreamingBackendFactory`](streaming::StreamingBackendFactory) - Creates
//!   one backend binding per bind episode
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Latch element faults rather than raising callbacks; the driving node
//!   polls [`MediaElement::fault`](element::MediaElement::fault) every tick
//!
//! ## Thread Safety
//!
//! Traits are bound by [`PlatformSendSync`](platform::PlatformSendSync):
//! `Send + Sync` on native targets, relaxed on `wasm32` where host media
//! objects are single-threaded. The core node itself runs on exactly one
//! control thread and performs no locking around these traits.

pub mod element;
pub mod error;
pub mod platform;
pub mod pool;
pub mod streaming;

pub use error::{BridgeError, Result};

// Re-export commonly used types
pub use element::{
    AttributeValue, MediaElement, MediaElementFactory, MediaFault, MediaFaultKind, ReadyState,
};
pub use platform::{PlatformSend, PlatformSendSync};
pub use pool::ElementPool;
pub use streaming::{
    BitrateInfo, MetadataHandler, StreamingBackend, StreamingBackendFactory, TrackType,
};
