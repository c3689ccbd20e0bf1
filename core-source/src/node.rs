//! # Media Source Node
//!
//! A timeline-synchronized media source: binds an externally clocked timeline
//! to a playable media resource fed by an adaptive streaming backend, and
//! keeps the resource's own clock, buffering state, and readiness consistent
//! with the timeline every tick.
//!
//! ## Overview
//!
//! The parent graph owns the timeline and calls [`MediaSourceNode::update`]
//! once per tick with the current position. From that single call the node
//! decides everything else:
//!
//! - whether the backing element should start loading (the preload window),
//! - which scheduling state applies ([`SourceState`], derived from the
//!   position relative to the start/stop bounds),
//! - what playback control the element needs (play, pause, rate write),
//! - whether the node is [`ready`](MediaSourceNode::ready) to present a frame.
//!
//! Discontinuous jumps go through [`MediaSourceNode::seek`], which re-derives
//! the state and rebinds or releases the element as needed.
//!
//! ## Resource lifecycle
//!
//! Elements come from the [`SourceBridges`] wiring: a shared pool, or a
//! factory creating a fresh element per bind. Each bind episode pairs the
//! element with exactly one streaming backend binding; both are released
//! together. Acquisition or setup failure moves the node to the terminal
//! error state, where it reports itself ready forever so the graph can
//! composite an empty frame instead of stalling, and performs no further
//! element control.
//!
//! ## Events
//!
//! Lifecycle notifications ([`SourceEvent`]) are published on an internal
//! event bus; subscribe with [`MediaSourceNode::subscribe`]. Each event fires
//! at most once per bind episode.
//!
//! ## Example
//!
//! ```no_run
//! use core_source::{MediaSourceNode, SourceBridges, SourceConfig};
//!
//! # fn drive(bridges: SourceBridges) -> core_source::Result<()> {
//! let mut node = MediaSourceNode::new(
//!     "https://example.com/stream.mpd",
//!     bridges,
//!     SourceConfig::default(),
//!     0.0,
//! )?;
//!
//! node.start_at(10.0);
//! node.stop_at(70.0);
//!
//! // Parent graph tick loop: returns true while the node presents a frame.
//! let presenting = node.update(8.5);
//! # let _ = presenting;
//! # Ok(())
//! # }
//! ```

use bridge_media::{AttributeValue, BridgeError, MediaElement, StreamingBackend, TrackType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::clock::SourceClock;
use crate::config::{QualityPolicy, SourceBridges, SourceConfig};
use crate::error::{Result, SourceError};
use crate::events::{EventBus, Receiver, SourceEvent};
use crate::state::SourceState;

/// A media source node driven by an external timeline.
///
/// All methods are synchronous and expected to be called from the single
/// thread that owns the parent graph; the node holds no locks and spawns no
/// tasks. The only asynchrony is on the element side, whose readiness and
/// fault signals are polled during [`update`](Self::update).
pub struct MediaSourceNode {
    manifest_url: String,
    state: SourceState,
    clock: SourceClock,
    preload_time: f64,
    attributes: HashMap<String, AttributeValue>,
    loop_element: bool,
    quality_policy: QualityPolicy,
    volume: f32,
    stretch_paused: bool,
    ready: bool,

    // Per-bind-episode flags.
    element_playing: bool,
    teardown_armed: bool,
    loaded_emitted: bool,

    element: Option<Arc<dyn MediaElement>>,
    backend: Option<Box<dyn StreamingBackend>>,
    bridges: SourceBridges,
    events: EventBus,
}

impl MediaSourceNode {
    /// Create an unscheduled node for the given manifest.
    ///
    /// `current_time` is the timeline position at creation, so a node created
    /// mid-timeline starts with a consistent clock. The node owns no element
    /// yet; acquisition happens lazily once the preload window opens.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn new(
        manifest_url: impl Into<String>,
        bridges: SourceBridges,
        config: SourceConfig,
        current_time: f64,
    ) -> Result<Self> {
        config.validate().map_err(SourceError::InvalidConfig)?;

        let loop_element = config.loop_requested();
        let clock = SourceClock::new(
            current_time,
            config.source_offset,
            config.global_playback_rate,
        );

        Ok(Self {
            manifest_url: manifest_url.into(),
            state: SourceState::Waiting,
            clock,
            preload_time: config.preload_time,
            attributes: config.attributes,
            loop_element,
            quality_policy: config.quality_policy,
            volume: config.volume,
            stretch_paused: false,
            ready: false,
            element_playing: false,
            teardown_armed: false,
            loaded_emitted: false,
            element: None,
            backend: None,
            bridges,
            events: EventBus::new(config.event_capacity),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current scheduling state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Returns `true` when the node can present a frame this tick.
    ///
    /// A faulted node also reports `true`, so downstream compositing is never
    /// blocked on it.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// The manifest locator this node streams from.
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// The node-local playback rate (1.0 = natural speed).
    pub fn playback_rate(&self) -> f64 {
        self.clock.local_rate()
    }

    /// Whether an external timeline freeze is holding the element paused.
    pub fn stretch_paused(&self) -> bool {
        self.stretch_paused
    }

    /// The latched output volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Scheduled start bound, once one exists.
    pub fn start_time(&self) -> Option<f64> {
        let start = self.clock.start();
        start.is_finite().then_some(start)
    }

    /// Stop bound, once scheduled explicitly or resolved from the media
    /// duration.
    pub fn stop_time(&self) -> Option<f64> {
        let stop = self.clock.stop();
        stop.is_finite().then_some(stop)
    }

    /// Last timeline position observed from the parent graph.
    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    /// Length of the presentation window, once both bounds are known.
    pub fn duration(&self) -> Option<f64> {
        let (start, stop) = (self.clock.start(), self.clock.stop());
        (start.is_finite() && stop.is_finite()).then(|| stop - start)
    }

    /// Returns `true` when this node creates and destroys its own elements
    /// rather than borrowing them from a shared pool.
    pub fn owns_element_lifecycle(&self) -> bool {
        self.bridges.element_pool().is_none()
    }

    /// Subscribe to the node's lifecycle events.
    pub fn subscribe(&self) -> Receiver<SourceEvent> {
        self.events.subscribe()
    }

    /// The node's event bus, for building filtered streams.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Schedule the node to start presenting at an absolute timeline position.
    ///
    /// Returns `false` without effect when the node has already been
    /// sequenced; a node is scheduled at most once per timeline.
    pub fn start_at(&mut self, time: f64) -> bool {
        if self.state != SourceState::Waiting {
            debug!(state = %self.state, "Source already sequenced, ignoring start request");
            return false;
        }
        self.clock.schedule(time);
        self.state = SourceState::Sequenced;
        true
    }

    /// Schedule the node to stop presenting at an absolute timeline position.
    ///
    /// Returns `false` without effect when the node is not sequenced yet or
    /// the requested bound does not fall after the start bound. An explicit
    /// stop bound suppresses the duration-based resolution.
    pub fn stop_at(&mut self, time: f64) -> bool {
        if matches!(self.state, SourceState::Waiting | SourceState::Error) {
            debug!(state = %self.state, "Source not sequenced, ignoring stop request");
            return false;
        }
        if time <= self.clock.start() {
            debug!("Stop bound must fall after the start bound, ignoring");
            return false;
        }
        self.clock.set_stop(time);
        true
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Suspend presentation while staying inside the window.
    ///
    /// The element receives its pause call on the next tick. Returns `false`
    /// when the node is not playing.
    pub fn pause(&mut self) -> bool {
        if self.state != SourceState::Playing {
            return false;
        }
        self.state = SourceState::Paused;
        true
    }

    /// Resume a paused node. Returns `false` when the node is not paused.
    pub fn resume(&mut self) -> bool {
        if self.state != SourceState::Paused {
            return false;
        }
        self.state = SourceState::Playing;
        true
    }

    /// Advance the node to the graph's current timeline position.
    ///
    /// Called once per tick. Polls element signals, derives the scheduling
    /// state, triggers preload, and issues whatever element control the state
    /// requires. Returns `true` while the node is actively presenting
    /// (playing or paused inside its window).
    pub fn update(&mut self, current_time: f64) -> bool {
        self.clock.record(current_time);

        if self.state == SourceState::Waiting {
            return false;
        }

        self.poll_element_signals();
        self.advance_timeline_state();

        if self.state.can_preload() && self.clock.in_preload_window(self.preload_time) {
            self.load();
        }

        match self.state {
            SourceState::Playing => {
                let Some(element) = self.element.clone() else {
                    warn!("Playing with no bound media element");
                    return false;
                };
                if let Some(rate) = self.clock.take_rate_write() {
                    element.set_playback_rate(rate);
                }
                if !self.element_playing {
                    if let Err(err) = element.play() {
                        warn!(error = %err, "Play call failed");
                    }
                    if self.stretch_paused {
                        // Prime the element, then hold it frozen.
                        if let Err(err) = element.pause() {
                            warn!(error = %err, "Stretch pause failed");
                        }
                    }
                    self.element_playing = true;
                }
                true
            }
            SourceState::Paused => {
                if let Some(element) = &self.element {
                    if let Err(err) = element.pause() {
                        warn!(error = %err, "Pause call failed");
                    }
                }
                self.element_playing = false;
                true
            }
            SourceState::Ended => {
                if let Some(element) = self.element.clone() {
                    if let Err(err) = element.pause() {
                        warn!(error = %err, "Pause during teardown failed");
                    }
                    if self.element_playing {
                        if self.teardown_armed {
                            self.unload();
                        } else {
                            // Keep the last frame presentable for one more
                            // tick before releasing the element.
                            self.teardown_armed = true;
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Jump the node to a discontinuous timeline position.
    ///
    /// Re-derives the scheduling state from the new position, binding an
    /// element and applying the mapped media position when the jump lands
    /// inside the window, and releasing the element when it lands outside.
    /// Readiness drops until the element reconfirms it can play through.
    pub fn seek(&mut self, time: f64) {
        self.clock.record(time);

        if matches!(self.state, SourceState::Waiting | SourceState::Error) {
            return;
        }

        self.state = if self.clock.before_start() {
            SourceState::Sequenced
        } else if self.clock.past_stop() {
            SourceState::Ended
        } else if self.state == SourceState::Paused {
            SourceState::Paused
        } else {
            SourceState::Playing
        };

        match self.state {
            SourceState::Playing | SourceState::Paused => {
                self.teardown_armed = false;
                if self.element.is_none() {
                    self.load();
                }
                // Binding can fail into the error state, so re-check.
                if let Some(element) = self.element.clone() {
                    element.set_position(self.clock.seek_position());
                    self.ready = false;
                }
            }
            SourceState::Sequenced | SourceState::Ended => {
                if self.element.is_some() {
                    self.unload();
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Property setters
    // ========================================================================

    /// Set the node-local playback rate.
    ///
    /// The element receives the combined global and local rate on the next
    /// playing tick.
    pub fn set_playback_rate(&mut self, rate: f64) {
        self.clock.set_local_rate(rate);
    }

    /// Set the graph-wide playback rate multiplier.
    pub fn set_global_playback_rate(&mut self, rate: f64) {
        self.clock.set_global_rate(rate);
    }

    /// Impose or release an external timeline freeze.
    ///
    /// Distinct from [`pause`](Self::pause): the scheduling state keeps
    /// advancing, only the element is held. Takes effect immediately when an
    /// element is bound.
    pub fn set_stretch_paused(&mut self, stretch_paused: bool) {
        self.stretch_paused = stretch_paused;

        if self.state == SourceState::Error {
            return;
        }
        let Some(element) = self.element.clone() else {
            return;
        };

        if stretch_paused {
            if let Err(err) = element.pause() {
                warn!(error = %err, "Stretch pause failed");
            }
        } else if self.state == SourceState::Playing {
            if let Err(err) = element.play() {
                warn!(error = %err, "Stretch resume failed");
            }
        }
    }

    /// Set the output volume.
    ///
    /// Applied to the bound element immediately, and latched for the next
    /// bind otherwise.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(element) = &self.element {
            element.set_volume(volume);
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reset the node for a timeline rebuild.
    ///
    /// Pauses and releases the element regardless of state, forgets both
    /// window bounds, and returns to the unscheduled state. A faulted node
    /// stays faulted.
    pub fn clear_timeline_state(&mut self) {
        if let Some(element) = &self.element {
            if let Err(err) = element.pause() {
                warn!(error = %err, "Pause during timeline reset failed");
            }
        }
        self.unload();
        self.clock.clear_bounds();
        if self.state == SourceState::Error {
            // Unload drops the readiness latch, but errored nodes stay ready.
            self.ready = true;
        } else {
            self.state = SourceState::Waiting;
        }
    }

    /// Tear the node down, releasing the element and backend binding.
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn destroy(&mut self) {
        if let Some(element) = &self.element {
            if let Err(err) = element.pause() {
                warn!(error = %err, "Pause during destroy failed");
            }
        }
        self.unload();
        debug!(manifest = %self.manifest_url, "Source node destroyed");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Observe the element-side signals latched since the last tick.
    fn poll_element_signals(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        let Some(element) = self.element.clone() else {
            return;
        };

        if let Some(fault) = element.fault() {
            self.fail(SourceError::ElementFault(fault));
            return;
        }

        if !self.loop_element
            && element.ended()
            && self.state != SourceState::Ended
        {
            self.enter_ended();
        }
    }

    /// Derive the scheduling state from the timeline position.
    fn advance_timeline_state(&mut self) {
        if self.state == SourceState::Error {
            return;
        }

        if self.clock.before_start() {
            if self.state.is_active() {
                self.state = SourceState::Sequenced;
            }
        } else if self.state == SourceState::Sequenced {
            self.state = SourceState::Playing;
        }

        if self.clock.past_stop() && self.state != SourceState::Ended {
            self.enter_ended();
        }
    }

    fn enter_ended(&mut self) {
        self.state = SourceState::Ended;
        self.events.emit(SourceEvent::Ended).ok();
    }

    /// Load or refresh the backing resource. Idempotent; called from the
    /// preload trigger, in-window seeks, and every in-window tick.
    fn load(&mut self) {
        if self.state == SourceState::Error {
            return;
        }

        if self.element.is_some() {
            self.refresh_bound_element();
            return;
        }

        if let Err(err) = self.bind() {
            self.fail(err);
        }
    }

    /// Reapply configuration and re-evaluate readiness on a bound element.
    fn refresh_bound_element(&mut self) {
        let Some(element) = self.element.clone() else {
            return;
        };

        for (name, value) in &self.attributes {
            element.set_attribute(name, value);
        }

        if let Some(fault) = element.fault() {
            self.fail(SourceError::ElementFault(fault));
            return;
        }

        if element.ready_state().can_play_through() && !element.seeking() {
            if !self.loop_element {
                if self.clock.try_resolve_stop(element.duration()) {
                    let duration = self.clock.stop() - self.clock.start();
                    self.events
                        .emit(SourceEvent::DurationChange { duration })
                        .ok();
                }
            }
            if !self.ready {
                // Rate writes race the element becoming controllable, so
                // repeat the write on every readiness edge.
                self.clock.mark_rate_dirty();
                if !self.loaded_emitted {
                    self.events.emit(SourceEvent::Loaded).ok();
                    self.loaded_emitted = true;
                }
            }
            self.ready = true;
        } else if self.state != SourceState::Error {
            self.ready = false;
        }
    }

    /// Acquire an element and wire a streaming backend to it.
    fn bind(&mut self) -> Result<()> {
        let element = self.acquire_element()?;
        self.clock.mark_rate_dirty();

        let backend = match self.bind_backend(element.clone()) {
            Ok(backend) => backend,
            Err(err) => {
                self.release_element(element);
                return Err(err);
            }
        };

        for (name, value) in &self.attributes {
            element.set_attribute(name, value);
        }

        element.set_position(self.clock.initial_position());

        debug!(manifest = %self.manifest_url, "Bound streaming media resource");
        self.element = Some(element);
        self.backend = Some(backend);
        Ok(())
    }

    /// Take an element from the pool, or create a fresh one.
    ///
    /// A configured pool is authoritative: when it is exhausted the node
    /// fails rather than falling back to the factory, since pooled hosts size
    /// the pool deliberately.
    fn acquire_element(&self) -> Result<Arc<dyn MediaElement>> {
        if let Some(pool) = self.bridges.element_pool() {
            return Ok(pool.acquire()?);
        }

        if let Some(factory) = self.bridges.element_factory() {
            let element = factory.create_element()?;
            element.set_attribute("crossorigin", &AttributeValue::from("anonymous"));
            element.set_attribute("webkit-playsinline", &AttributeValue::from(""));
            element.set_attribute("playsinline", &AttributeValue::from(""));
            return Ok(element);
        }

        Err(SourceError::ElementUnavailable(
            "no element pool or factory configured".to_string(),
        ))
    }

    /// Create the streaming backend binding for one bind episode.
    fn bind_backend(&self, element: Arc<dyn MediaElement>) -> Result<Box<dyn StreamingBackend>> {
        let setup = |err: BridgeError| SourceError::BackendSetup(err.to_string());

        let backend = self
            .bridges
            .backend_factory()
            .create_backend()
            .map_err(setup)?;
        backend
            .initialize(element, &self.manifest_url, false)
            .map_err(setup)?;

        if self.quality_policy.pins_quality() {
            backend
                .set_auto_switch_quality(TrackType::Video, false)
                .map_err(setup)?;

            let policy = self.quality_policy;
            backend.on_metadata_loaded(Box::new(move |backend| {
                let ladder = backend.bitrate_ladder(TrackType::Video);
                if let Some(index) = policy.selection(ladder.len()) {
                    if let Err(err) = backend.set_quality(TrackType::Video, index) {
                        warn!(error = %err, "Failed to pin streaming quality");
                    }
                }
            }));
        }

        backend.set_volume(self.volume).map_err(setup)?;

        Ok(backend)
    }

    /// Return a half-bound element without ever having owned it.
    fn release_element(&self, element: Arc<dyn MediaElement>) {
        element.clear_source();
        if let Some(pool) = self.bridges.element_pool() {
            pool.release(element);
        }
    }

    /// Move to the terminal error state, once.
    fn fail(&mut self, err: SourceError) {
        if self.state == SourceState::Error {
            return;
        }

        error!(error = %err, manifest = %self.manifest_url, "Source entered error state");
        self.state = SourceState::Error;
        // A faulted node reports ready so the graph composites an empty
        // frame instead of stalling on it.
        self.ready = true;
        self.events.emit(SourceEvent::Error).ok();
    }

    /// Release the element and backend binding. Idempotent.
    fn unload(&mut self) {
        // The backend binding is tied to the element it was initialized
        // with; it goes first.
        self.backend = None;

        if let Some(element) = self.element.take() {
            element.clear_source();
            for name in self.attributes.keys() {
                element.remove_attribute(name);
            }
            if let Some(pool) = self.bridges.element_pool() {
                pool.release(element);
            }
            debug!("Released streaming media resource");
        }

        self.ready = false;
        self.element_playing = false;
        self.teardown_armed = false;
        self.loaded_emitted = false;
    }
}

impl fmt::Debug for MediaSourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSourceNode")
            .field("manifest_url", &self.manifest_url)
            .field("state", &self.state)
            .field("ready", &self.ready)
            .field("element_bound", &self.element.is_some())
            .finish()
    }
}

impl Drop for MediaSourceNode {
    fn drop(&mut self) {
        self.destroy();
    }
}
