//! Media element bridge traits and supporting types.
//!
//! These abstractions let the core source node drive a playable element owned
//! by the host platform (an HTML media element on the web, a decoder surface
//! elsewhere) through a narrow control surface: readiness, duration, end and
//! fault signals on the read side; position, volume, rate, source binding and
//! configuration attributes on the write side. Host applications provide
//! concrete implementations that satisfy their platform constraints.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Buffered-readiness level reported by a media element.
///
/// Variants are ordered: a comparison such as
/// `ready_state >= ReadyState::HaveEnoughData` expresses the "can play
/// through" threshold used by readiness gating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ReadyState {
    /// No information about the media resource is available.
    #[default]
    HaveNothing,
    /// Metadata (duration, dimensions) is available.
    HaveMetadata,
    /// Data for the current position is available, but not enough to advance.
    HaveCurrentData,
    /// Data for a short stretch ahead of the current position is available.
    HaveFutureData,
    /// Enough data is buffered to play through without stalling.
    HaveEnoughData,
}

impl ReadyState {
    /// Returns `true` if enough data is buffered to play through without
    /// rebuffering.
    pub fn can_play_through(&self) -> bool {
        *self >= ReadyState::HaveEnoughData
    }
}

/// Configuration value applied to a media element as a named attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean attribute (e.g., `loop`, `muted`).
    Bool(bool),
    /// Numeric attribute.
    Number(f64),
    /// String attribute (e.g., `crossorigin`).
    Text(String),
}

impl AttributeValue {
    /// Interpret the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret the value as a number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// Category of a latched media element fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaFaultKind {
    /// Fetch was aborted by the host.
    Aborted,
    /// Network error interrupted the download.
    Network,
    /// Downloaded data could not be decoded.
    Decode,
    /// The bound source is not usable.
    SourceNotSupported,
    /// Platform-specific failure not covered by the other variants.
    Other,
}

/// Fault raised by a media element after a successful bind.
///
/// Elements latch the fault and expose it through [`MediaElement::fault`]
/// until the source binding is cleared; the driving node polls for it each
/// tick rather than registering a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFault {
    /// Failure category.
    pub kind: MediaFaultKind,
    /// Platform-provided description.
    pub message: String,
}

impl MediaFault {
    /// Create a new fault record.
    pub fn new(kind: MediaFaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for MediaFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Trait for host-owned playable elements.
///
/// Methods take `&self`; implementations are expected to manage their own
/// interior mutability, since a single element may be referenced by both the
/// driving node and the streaming backend feeding it.
pub trait MediaElement: PlatformSendSync {
    /// Total duration of the bound media in seconds. Only meaningful once the
    /// element reports at least [`ReadyState::HaveMetadata`].
    fn duration(&self) -> f64;

    /// Returns `true` once playback has reached the end of the media. Looping
    /// elements never report ended.
    fn ended(&self) -> bool;

    /// Current buffered-readiness level.
    fn ready_state(&self) -> ReadyState;

    /// Returns `true` while the element is carrying out a seek.
    fn seeking(&self) -> bool;

    /// Latched fault, if the element has failed since the source was bound.
    fn fault(&self) -> Option<MediaFault>;

    /// Seek the element's own clock to an absolute position in seconds.
    fn set_position(&self, seconds: f64);

    /// Set output volume, normalized to `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Set the element playback rate (1.0 = natural speed).
    fn set_playback_rate(&self, rate: f64);

    /// Bind a source URL directly to the element.
    fn set_source(&self, url: &str);

    /// Clear the source binding (URL and any attached media stream), so the
    /// element can be reused.
    fn clear_source(&self);

    /// Read a configuration attribute previously applied to the element.
    fn attribute(&self, name: &str) -> Option<AttributeValue>;

    /// Apply a configuration attribute to the element.
    fn set_attribute(&self, name: &str, value: &AttributeValue);

    /// Remove a previously applied configuration attribute.
    fn remove_attribute(&self, name: &str);

    /// Begin or resume playback.
    fn play(&self) -> Result<()>;

    /// Suspend playback without releasing any resources.
    fn pause(&self) -> Result<()>;
}

/// Factory for fresh media elements, used when no element pool is configured.
pub trait MediaElementFactory: PlatformSendSync {
    /// Create a new, unbound media element.
    fn create_element(&self) -> Result<Arc<dyn MediaElement>>;
}
