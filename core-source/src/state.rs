//! # Source Node States
//!
//! The scheduling state machine vocabulary for a timeline-synchronized media
//! source.

use serde::{Deserialize, Serialize};

/// Scheduling state of a media source node.
///
/// The node derives the scheduling states (`Waiting` through `Ended`) from the
/// timeline position the parent graph feeds it; `Error` is raised internally
/// when the backing resource fails and is terminal until the node is
/// reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    /// Constructed but not yet scheduled onto the timeline.
    Waiting,
    /// Scheduled, timeline position still before the start bound.
    Sequenced,
    /// Timeline position inside the window; the resource should be playing.
    Playing,
    /// Inside the window with playback suspended by the parent graph.
    Paused,
    /// Timeline position reached the stop bound, or the resource reported its
    /// natural end.
    Ended,
    /// The backing resource failed to bind or faulted at runtime.
    Error,
}

impl SourceState {
    /// Returns `true` while the node is actively presenting a frame
    /// (the value `update` reports to the parent graph).
    pub fn is_active(&self) -> bool {
        matches!(self, SourceState::Playing | SourceState::Paused)
    }

    /// Returns `true` if no transition can leave this state short of
    /// reconstructing the node.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceState::Error)
    }

    /// Returns `true` for states that must have a resource bound.
    pub fn requires_element(&self) -> bool {
        matches!(self, SourceState::Playing | SourceState::Paused)
    }

    /// Returns `true` for states in which the preload trigger may fire.
    ///
    /// Unscheduled and ended nodes never preload; a faulted node performs no
    /// further load activity at all.
    pub fn can_preload(&self) -> bool {
        !matches!(
            self,
            SourceState::Waiting | SourceState::Ended | SourceState::Error
        )
    }
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceState::Waiting => "waiting",
            SourceState::Sequenced => "sequenced",
            SourceState::Playing => "playing",
            SourceState::Paused => "paused",
            SourceState::Ended => "ended",
            SourceState::Error => "error",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(SourceState::Playing.is_active());
        assert!(SourceState::Paused.is_active());
        assert!(!SourceState::Sequenced.is_active());
        assert!(!SourceState::Ended.is_active());
        assert!(!SourceState::Error.is_active());
    }

    #[test]
    fn terminal_states() {
        assert!(SourceState::Error.is_terminal());
        // Ended is not terminal: a seek back into the window resumes playback.
        assert!(!SourceState::Ended.is_terminal());
    }

    #[test]
    fn preload_eligibility() {
        assert!(SourceState::Sequenced.can_preload());
        assert!(SourceState::Playing.can_preload());
        assert!(SourceState::Paused.can_preload());
        assert!(!SourceState::Waiting.can_preload());
        assert!(!SourceState::Ended.can_preload());
        assert!(!SourceState::Error.can_preload());
    }

    #[test]
    fn display_names_are_lowercase() {
        assert_eq!(SourceState::Waiting.to_string(), "waiting");
        assert_eq!(SourceState::Error.to_string(), "error");
    }
}
