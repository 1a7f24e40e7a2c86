//! Animation lifecycle state

use serde::{Deserialize, Serialize};

/// Current state of an animation's lifecycle
///
/// ```text
/// Reset --launch--> Restart --first pass--> Play --ttl / end condition--> end state
///   |                                        ^ |  ^
///   +------------------ play ----------------+ |  | resume
///                                        pause v  |
///                                            Pause
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimationState {
    /// Created, waiting for a launch
    #[default]
    Reset,
    /// Launch requested; the next first pass applies the launch parameters
    Restart,
    /// Advanced every frame
    Play,
    /// Frozen; skipped by every pass
    Pause,
    /// Finished; removed with its entity at the next cleanup
    Done,
}

impl AnimationState {
    /// True for states the passes advance
    pub fn is_running(&self) -> bool {
        matches!(self, AnimationState::Play)
    }

    /// True once the animation will never run again
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnimationState::Done)
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: AnimationState) -> bool {
        use AnimationState::*;
        match (self, next) {
            (Done, _) => false,
            (_, Done) | (_, Reset) | (_, Restart) => true,
            (Reset, Play) | (Restart, Play) | (Pause, Play) | (Play, Pause) => true,
            (state, next) => *state == next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use AnimationState::*;
        assert!(Reset.can_transition_to(Restart));
        assert!(Restart.can_transition_to(Play));
        assert!(Play.can_transition_to(Pause));
        assert!(Pause.can_transition_to(Play));
        assert!(Play.can_transition_to(Done));
        assert!(Reset.can_transition_to(Play));
        assert!(!Reset.can_transition_to(Pause));
        assert!(!Done.can_transition_to(Restart));
        assert!(Play.is_running() && !Pause.is_running());
        assert!(Done.is_terminal());
    }
}
