//! # Source Clock
//!
//! Timeline bookkeeping for a media source node: the presentation window
//! bounds, the mapping from timeline time to media time, and the combined
//! playback rate with its write-back flag.
//!
//! Unscheduled bounds are represented as `f64::INFINITY`, so the window
//! predicates come out false until the node is scheduled.

/// Timeline state of one source node.
///
/// The node records the graph's timeline position here on every update and
/// seek, and reads window predicates and media positions back out.
#[derive(Debug, Clone)]
pub struct SourceClock {
    current_time: f64,
    start: f64,
    stop: f64,
    source_offset: f64,
    local_rate: f64,
    global_rate: f64,
    rate_dirty: bool,
}

impl SourceClock {
    /// Create a clock with no presentation window scheduled.
    ///
    /// The rate flag starts dirty so the first playing tick writes the
    /// combined rate to the element even when nobody changed it.
    pub fn new(current_time: f64, source_offset: f64, global_rate: f64) -> Self {
        Self {
            current_time,
            start: f64::INFINITY,
            stop: f64::INFINITY,
            source_offset,
            local_rate: 1.0,
            global_rate,
            rate_dirty: true,
        }
    }

    // ------------------------------------------------------------------
    // Timeline position and bounds
    // ------------------------------------------------------------------

    /// Record the graph's current timeline position.
    pub fn record(&mut self, current_time: f64) {
        self.current_time = current_time;
    }

    /// Schedule the start bound.
    pub fn schedule(&mut self, start: f64) {
        self.start = start;
    }

    /// Set the stop bound explicitly.
    pub fn set_stop(&mut self, stop: f64) {
        self.stop = stop;
    }

    /// Forget both bounds, returning the window to the unscheduled state.
    pub fn clear_bounds(&mut self) {
        self.start = f64::INFINITY;
        self.stop = f64::INFINITY;
    }

    /// Returns `true` once a finite stop bound exists.
    pub fn stop_resolved(&self) -> bool {
        self.stop.is_finite()
    }

    /// Derive the stop bound from the media duration, once.
    ///
    /// Does nothing when a stop bound already exists, when the node is not
    /// scheduled, or when the duration is not a usable number. Returns `true`
    /// only when the bound was written.
    pub fn try_resolve_stop(&mut self, duration: f64) -> bool {
        if self.stop.is_finite() || !self.start.is_finite() || !duration.is_finite() {
            return false;
        }
        self.stop = self.start + duration;
        true
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn source_offset(&self) -> f64 {
        self.source_offset
    }

    // ------------------------------------------------------------------
    // Window predicates
    // ------------------------------------------------------------------

    /// Returns `true` strictly inside the preload window before the start
    /// bound (and anywhere past it).
    ///
    /// The comparison is strict: at exactly `preload` seconds out the window
    /// has not opened yet. An unscheduled clock is never in the window.
    pub fn in_preload_window(&self, preload: f64) -> bool {
        self.start - self.current_time < preload
    }

    /// Returns `true` while the timeline has not reached the start bound.
    pub fn before_start(&self) -> bool {
        self.current_time < self.start
    }

    /// Returns `true` once the timeline reached or passed the stop bound.
    pub fn past_stop(&self) -> bool {
        self.current_time >= self.stop
    }

    // ------------------------------------------------------------------
    // Media positions
    // ------------------------------------------------------------------

    /// Media position to apply when a resource is first bound.
    ///
    /// Binding before the window opens lands on the source offset; binding
    /// late (for example when loading was delayed) skips ahead by however far
    /// the timeline already is into the window.
    pub fn initial_position(&self) -> f64 {
        self.source_offset + (self.current_time - self.start).max(0.0)
    }

    /// Media position for an explicit seek to the recorded timeline position.
    pub fn seek_position(&self) -> f64 {
        self.current_time - self.start + self.source_offset
    }

    // ------------------------------------------------------------------
    // Playback rate
    // ------------------------------------------------------------------

    /// The rate actually applied to the resource.
    pub fn effective_rate(&self) -> f64 {
        self.global_rate * self.local_rate
    }

    pub fn local_rate(&self) -> f64 {
        self.local_rate
    }

    pub fn global_rate(&self) -> f64 {
        self.global_rate
    }

    /// Change the node's own rate and flag the element write-back.
    pub fn set_local_rate(&mut self, rate: f64) {
        self.local_rate = rate;
        self.rate_dirty = true;
    }

    /// Change the graph-wide rate multiplier and flag the element write-back.
    pub fn set_global_rate(&mut self, rate: f64) {
        self.global_rate = rate;
        self.rate_dirty = true;
    }

    /// Force the next playing tick to push the rate to the element again,
    /// used after (re)binding a resource.
    pub fn mark_rate_dirty(&mut self) {
        self.rate_dirty = true;
    }

    /// Consume the pending rate write, if any.
    pub fn take_rate_write(&mut self) -> Option<f64> {
        if self.rate_dirty {
            self.rate_dirty = false;
            Some(self.effective_rate())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscheduled_clock_is_outside_every_window() {
        let clock = SourceClock::new(0.0, 0.0, 1.0);
        assert!(!clock.in_preload_window(4.0));
        assert!(!clock.in_preload_window(f64::INFINITY));
        assert!(clock.before_start());
        assert!(!clock.past_stop());
        assert!(!clock.stop_resolved());
    }

    #[test]
    fn preload_window_boundary_is_strict() {
        let mut clock = SourceClock::new(0.0, 0.0, 1.0);
        clock.schedule(10.0);

        clock.record(6.0); // exactly preload seconds out
        assert!(!clock.in_preload_window(4.0));

        clock.record(6.001);
        assert!(clock.in_preload_window(4.0));

        clock.record(12.0); // already inside the window
        assert!(clock.in_preload_window(4.0));
    }

    #[test]
    fn stop_resolves_once() {
        let mut clock = SourceClock::new(0.0, 0.0, 1.0);
        clock.schedule(10.0);

        assert!(clock.try_resolve_stop(60.0));
        assert_eq!(clock.stop(), 70.0);

        // Second resolution attempt leaves the bound alone.
        assert!(!clock.try_resolve_stop(120.0));
        assert_eq!(clock.stop(), 70.0);
    }

    #[test]
    fn stop_resolution_requires_schedule_and_finite_duration() {
        let mut clock = SourceClock::new(0.0, 0.0, 1.0);
        assert!(!clock.try_resolve_stop(60.0)); // not scheduled

        clock.schedule(10.0);
        assert!(!clock.try_resolve_stop(f64::NAN));
        assert!(!clock.try_resolve_stop(f64::INFINITY));
        assert!(!clock.stop_resolved());
    }

    #[test]
    fn explicit_stop_blocks_resolution() {
        let mut clock = SourceClock::new(0.0, 0.0, 1.0);
        clock.schedule(10.0);
        clock.set_stop(30.0);
        assert!(!clock.try_resolve_stop(60.0));
        assert_eq!(clock.stop(), 30.0);
    }

    #[test]
    fn initial_position_skips_ahead_when_binding_late() {
        let mut clock = SourceClock::new(0.0, 2.5, 1.0);
        clock.schedule(10.0);

        clock.record(7.0); // before the window
        assert_eq!(clock.initial_position(), 2.5);

        clock.record(13.0); // three seconds in
        assert_eq!(clock.initial_position(), 5.5);
    }

    #[test]
    fn seek_position_maps_timeline_to_media_time() {
        let mut clock = SourceClock::new(0.0, 2.0, 1.0);
        clock.schedule(10.0);

        clock.record(14.0);
        assert_eq!(clock.seek_position(), 6.0);

        // Out-of-window seeks still produce the raw mapping; callers decide
        // what to do with it.
        clock.record(9.0);
        assert_eq!(clock.seek_position(), 1.0);
    }

    #[test]
    fn rate_write_is_pending_at_construction() {
        let mut clock = SourceClock::new(0.0, 0.0, 2.0);
        assert_eq!(clock.take_rate_write(), Some(2.0));
        assert_eq!(clock.take_rate_write(), None);
    }

    #[test]
    fn rate_changes_flag_a_write_of_the_product() {
        let mut clock = SourceClock::new(0.0, 0.0, 2.0);
        clock.take_rate_write();

        clock.set_local_rate(1.5);
        assert_eq!(clock.take_rate_write(), Some(3.0));

        clock.set_global_rate(0.5);
        assert_eq!(clock.take_rate_write(), Some(0.75));
        assert_eq!(clock.take_rate_write(), None);

        clock.mark_rate_dirty();
        assert_eq!(clock.take_rate_write(), Some(0.75));
    }

    #[test]
    fn clearing_bounds_returns_to_unscheduled() {
        let mut clock = SourceClock::new(0.0, 0.0, 1.0);
        clock.schedule(5.0);
        clock.set_stop(15.0);
        clock.record(20.0);
        assert!(clock.past_stop());

        clock.clear_bounds();
        assert!(!clock.past_stop());
        assert!(clock.before_start());
        assert!(!clock.stop_resolved());
    }
}
