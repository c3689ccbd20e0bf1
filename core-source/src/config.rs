//! # Source Configuration
//!
//! Configuration types for timeline-synchronized media sources, plus the
//! bridge wiring a node needs from its host platform.

use bridge_media::{
    AttributeValue, ElementPool, MediaElementFactory, StreamingBackendFactory,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SourceError;
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Media source configuration.
///
/// Controls preload behavior, the mapping between timeline time and media
/// time, playback rate and volume, element attributes, and quality selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Seconds before the start bound at which the resource begins loading.
    ///
    /// The trigger is strict: a node scheduled to start at `t = 10` with a
    /// 4 second preload starts loading once the timeline passes `6.0`, not at
    /// `6.0` itself.
    ///
    /// Default: 4 seconds.
    #[serde(default = "default_preload_time")]
    pub preload_time: f64,

    /// Seconds into the media at which presentation begins.
    ///
    /// Timeline time `start` maps to media time `source_offset`.
    ///
    /// Default: 0.
    #[serde(default = "default_source_offset")]
    pub source_offset: f64,

    /// Rate multiplier applied on top of the node's own playback rate.
    ///
    /// The resource plays at `global_playback_rate * playback_rate`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_global_playback_rate")]
    pub global_playback_rate: f64,

    /// Output volume in `0.0..=1.0`, forwarded to the element and the
    /// streaming backend whenever a resource is bound.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Attributes applied to the media element on every bind.
    ///
    /// The `loop` attribute additionally keeps the node from ending when the
    /// media reaches its natural end.
    ///
    /// Default: empty.
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,

    /// How the streaming quality is chosen once the manifest's bitrate ladder
    /// is known.
    ///
    /// Default: pin the last ladder entry.
    #[serde(default)]
    pub quality_policy: QualityPolicy,

    /// Buffer capacity of the node's event channel.
    ///
    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`].
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            preload_time: default_preload_time(),
            source_offset: default_source_offset(),
            global_playback_rate: default_global_playback_rate(),
            volume: default_volume(),
            attributes: HashMap::new(),
            quality_policy: QualityPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SourceConfig {
    /// Create a configuration that starts loading the moment the node is
    /// scheduled, for sources expected to play immediately.
    pub fn instant_start() -> Self {
        Self {
            preload_time: f64::INFINITY,
            ..Default::default()
        }
    }

    /// Create a configuration whose media repeats instead of ending the node
    /// when playback reaches the end.
    pub fn looping() -> Self {
        let mut config = Self::default();
        config
            .attributes
            .insert("loop".to_string(), AttributeValue::from(true));
        config
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.preload_time.is_nan() || self.preload_time < 0.0 {
            return Err("preload_time must be non-negative".to_string());
        }

        if !self.source_offset.is_finite() || self.source_offset < 0.0 {
            return Err("source_offset must be finite and non-negative".to_string());
        }

        if !self.global_playback_rate.is_finite() || self.global_playback_rate <= 0.0 {
            return Err("global_playback_rate must be finite and positive".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("volume must be between 0.0 and 1.0".to_string());
        }

        if self.event_capacity == 0 {
            return Err("event_capacity must be > 0".to_string());
        }

        Ok(())
    }

    /// Returns `true` when the `loop` attribute asks for repeating playback.
    pub fn loop_requested(&self) -> bool {
        self.attributes
            .get("loop")
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_preload_time() -> f64 {
    4.0 // seconds before the start bound
}

fn default_source_offset() -> f64 {
    0.0
}

fn default_global_playback_rate() -> f64 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

// ============================================================================
// Quality Policy
// ============================================================================

/// How a node picks a rendition from the streaming backend's bitrate ladder.
///
/// Any policy other than [`QualityPolicy::Auto`] turns the backend's own
/// quality switching off and pins one ladder entry once the manifest metadata
/// has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum QualityPolicy {
    /// Pin the last ladder entry. Ladders ordered from lowest to highest
    /// bitrate make this the highest rendition; inverted ladders make it the
    /// lowest.
    PinLadderEnd,
    /// Pin the first ladder entry.
    PinLadderStart,
    /// Pin a specific ladder index, clamped to the ladder length.
    Fixed {
        /// Zero-based index into the bitrate ladder.
        index: usize,
    },
    /// Leave quality switching to the streaming backend.
    Auto,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        QualityPolicy::PinLadderEnd
    }
}

impl QualityPolicy {
    /// Returns `true` when the policy overrides the backend's own switching.
    pub fn pins_quality(&self) -> bool {
        !matches!(self, QualityPolicy::Auto)
    }

    /// Resolve the ladder index to pin for a ladder of `ladder_len` entries.
    ///
    /// Returns `None` for [`QualityPolicy::Auto`] or an empty ladder.
    pub fn selection(&self, ladder_len: usize) -> Option<usize> {
        match self {
            QualityPolicy::PinLadderEnd => ladder_len.checked_sub(1),
            QualityPolicy::PinLadderStart => (ladder_len > 0).then_some(0),
            QualityPolicy::Fixed { index } => {
                (ladder_len > 0).then(|| (*index).min(ladder_len - 1))
            }
            QualityPolicy::Auto => None,
        }
    }
}

// ============================================================================
// Source Bridges
// ============================================================================

/// The platform collaborators a source node works through.
///
/// Elements come from either a shared [`ElementPool`] or a
/// [`MediaElementFactory`]; when both are supplied the pool wins and the
/// factory is never consulted. The [`StreamingBackendFactory`] is always
/// required.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use core_source::SourceBridges;
/// # fn wire(
/// #     factory: Arc<dyn bridge_media::MediaElementFactory>,
/// #     backends: Arc<dyn bridge_media::StreamingBackendFactory>,
/// # ) -> core_source::Result<SourceBridges> {
/// let bridges = SourceBridges::builder()
///     .element_factory(factory)
///     .backend_factory(backends)
///     .build()?;
/// # Ok(bridges)
/// # }
/// ```
#[derive(Clone)]
pub struct SourceBridges {
    element_pool: Option<Arc<dyn ElementPool>>,
    element_factory: Option<Arc<dyn MediaElementFactory>>,
    backend_factory: Arc<dyn StreamingBackendFactory>,
}

impl SourceBridges {
    /// Start building a bridge set.
    pub fn builder() -> SourceBridgesBuilder {
        SourceBridgesBuilder::default()
    }

    /// The shared element pool, when the host provided one.
    pub fn element_pool(&self) -> Option<&Arc<dyn ElementPool>> {
        self.element_pool.as_ref()
    }

    /// The element factory, when the host provided one.
    pub fn element_factory(&self) -> Option<&Arc<dyn MediaElementFactory>> {
        self.element_factory.as_ref()
    }

    /// The streaming backend factory.
    pub fn backend_factory(&self) -> &Arc<dyn StreamingBackendFactory> {
        &self.backend_factory
    }
}

impl fmt::Debug for SourceBridges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBridges")
            .field("has_element_pool", &self.element_pool.is_some())
            .field("has_element_factory", &self.element_factory.is_some())
            .finish()
    }
}

/// Builder for [`SourceBridges`].
#[derive(Default)]
pub struct SourceBridgesBuilder {
    element_pool: Option<Arc<dyn ElementPool>>,
    element_factory: Option<Arc<dyn MediaElementFactory>>,
    backend_factory: Option<Arc<dyn StreamingBackendFactory>>,
}

impl SourceBridgesBuilder {
    /// Use a shared element pool as the element source.
    pub fn element_pool(mut self, pool: Arc<dyn ElementPool>) -> Self {
        self.element_pool = Some(pool);
        self
    }

    /// Use a factory creating a fresh element per load.
    pub fn element_factory(mut self, factory: Arc<dyn MediaElementFactory>) -> Self {
        self.element_factory = Some(factory);
        self
    }

    /// Set the streaming backend factory. Required.
    pub fn backend_factory(mut self, factory: Arc<dyn StreamingBackendFactory>) -> Self {
        self.backend_factory = Some(factory);
        self
    }

    /// Finish the bridge set, failing fast on missing capabilities.
    pub fn build(self) -> crate::Result<SourceBridges> {
        let backend_factory =
            self.backend_factory
                .ok_or_else(|| SourceError::CapabilityMissing {
                    capability: "streaming backend factory".to_string(),
                    message: "supply one with SourceBridgesBuilder::backend_factory".to_string(),
                })?;

        if self.element_pool.is_none() && self.element_factory.is_none() {
            return Err(SourceError::CapabilityMissing {
                capability: "media element source".to_string(),
                message: "supply an element pool or an element factory".to_string(),
            });
        }

        Ok(SourceBridges {
            element_pool: self.element_pool,
            element_factory: self.element_factory,
            backend_factory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_media::{BridgeError, MediaElement, StreamingBackend};

    struct NoElements;
    impl MediaElementFactory for NoElements {
        fn create_element(&self) -> bridge_media::Result<Arc<dyn MediaElement>> {
            Err(BridgeError::NotAvailable("test factory".into()))
        }
    }

    struct EmptyPool;
    impl ElementPool for EmptyPool {
        fn acquire(&self) -> bridge_media::Result<Arc<dyn MediaElement>> {
            Err(BridgeError::Exhausted("test pool".into()))
        }
        fn release(&self, _element: Arc<dyn MediaElement>) {}
    }

    struct NoBackends;
    impl StreamingBackendFactory for NoBackends {
        fn create_backend(&self) -> bridge_media::Result<Box<dyn StreamingBackend>> {
            Err(BridgeError::NotAvailable("test backends".into()))
        }
    }

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preload_time, 4.0);
        assert_eq!(config.source_offset, 0.0);
        assert_eq!(config.quality_policy, QualityPolicy::PinLadderEnd);
        assert!(!config.loop_requested());
    }

    #[test]
    fn test_instant_start_config() {
        let config = SourceConfig::instant_start();
        assert!(config.validate().is_ok());
        assert!(config.preload_time.is_infinite());
    }

    #[test]
    fn test_looping_config() {
        let config = SourceConfig::looping();
        assert!(config.validate().is_ok());
        assert!(config.loop_requested());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SourceConfig::default();
        assert!(config.validate().is_ok());

        config.preload_time = f64::NAN;
        assert!(config.validate().is_err());
        config.preload_time = 4.0;

        config.source_offset = -1.0;
        assert!(config.validate().is_err());
        config.source_offset = 0.0;

        config.global_playback_rate = 0.0;
        assert!(config.validate().is_err());
        config.global_playback_rate = 1.0;

        config.volume = 1.5;
        assert!(config.validate().is_err());
        config.volume = 1.0;

        config.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SourceConfig = serde_json::from_str(r#"{"preload_time": 2.0}"#).unwrap();
        assert_eq!(config.preload_time, 2.0);
        assert_eq!(config.global_playback_rate, 1.0);
        assert_eq!(config.quality_policy, QualityPolicy::PinLadderEnd);
    }

    #[test]
    fn test_quality_policy_selection() {
        assert_eq!(QualityPolicy::PinLadderEnd.selection(3), Some(2));
        assert_eq!(QualityPolicy::PinLadderEnd.selection(0), None);

        assert_eq!(QualityPolicy::PinLadderStart.selection(3), Some(0));
        assert_eq!(QualityPolicy::PinLadderStart.selection(0), None);

        assert_eq!(QualityPolicy::Fixed { index: 1 }.selection(3), Some(1));
        assert_eq!(QualityPolicy::Fixed { index: 9 }.selection(3), Some(2));
        assert_eq!(QualityPolicy::Fixed { index: 0 }.selection(0), None);

        assert_eq!(QualityPolicy::Auto.selection(3), None);
        assert!(!QualityPolicy::Auto.pins_quality());
        assert!(QualityPolicy::PinLadderEnd.pins_quality());
    }

    #[test]
    fn test_quality_policy_serde() {
        let json = serde_json::to_string(&QualityPolicy::Fixed { index: 2 }).unwrap();
        assert!(json.contains("fixed"));
        let parsed: QualityPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, QualityPolicy::Fixed { index: 2 });

        let parsed: QualityPolicy =
            serde_json::from_str(r#"{"policy": "pin_ladder_end"}"#).unwrap();
        assert_eq!(parsed, QualityPolicy::PinLadderEnd);
    }

    #[test]
    fn test_bridges_require_backend_factory() {
        let result = SourceBridges::builder()
            .element_factory(Arc::new(NoElements))
            .build();
        assert!(matches!(
            result,
            Err(SourceError::CapabilityMissing { .. })
        ));
    }

    #[test]
    fn test_bridges_require_element_source() {
        let result = SourceBridges::builder()
            .backend_factory(Arc::new(NoBackends))
            .build();
        assert!(matches!(
            result,
            Err(SourceError::CapabilityMissing { .. })
        ));
    }

    #[test]
    fn test_bridges_accept_pool_or_factory() {
        let with_pool = SourceBridges::builder()
            .element_pool(Arc::new(EmptyPool))
            .backend_factory(Arc::new(NoBackends))
            .build()
            .unwrap();
        assert!(with_pool.element_pool().is_some());
        assert!(with_pool.element_factory().is_none());

        let with_factory = SourceBridges::builder()
            .element_factory(Arc::new(NoElements))
            .backend_factory(Arc::new(NoBackends))
            .build()
            .unwrap();
        assert!(with_factory.element_pool().is_none());
        assert!(with_factory.element_factory().is_some());
    }
}
