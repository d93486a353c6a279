//! Manual turning state machine: states and the transition table.

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManualTurningState {
    #[default]
    Idle,
    SpindleOnReadyToFeed,
    PreFeedDelay,
    Feeding,
    Jogging,
    CannotFeedWithSpindleOff,
    JoystickResetRequired,
}

impl ManualTurningState {
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::SpindleOnReadyToFeed,
        Self::PreFeedDelay,
        Self::Feeding,
        Self::Jogging,
        Self::CannotFeedWithSpindleOff,
        Self::JoystickResetRequired,
    ];

    /// Next state for `event`, or `None` when the pair is a no-op.
    ///
    /// `Some(Jogging)` from `Jogging` is a self-transition: the jog may need
    /// re-issuing for a new direction but no entry/exit actions run.
    pub fn next(self, event: Event) -> Option<Self> {
        use Event as E;
        use ManualTurningState as S;

        let next = match (self, event) {
            (S::Idle, E::JoystickToNeutralSpOn) => S::SpindleOnReadyToFeed,
            (S::Idle, E::JoystickToFeedSpOff) => S::CannotFeedWithSpindleOff,
            (S::Idle, E::JoystickToJogSpOff) => S::Jogging,

            (S::SpindleOnReadyToFeed, E::JoystickToNeutralSpOff) => S::Idle,
            (S::SpindleOnReadyToFeed, E::JoystickToFeedSpOn) => S::PreFeedDelay,
            (S::SpindleOnReadyToFeed, E::JoystickToJogSpOn) => S::Jogging,

            (S::PreFeedDelay, E::FeedDelayExpired) => S::Feeding,
            (S::PreFeedDelay, E::JoystickToJogSpOn) => S::Jogging,
            (S::PreFeedDelay, E::JoystickToNeutralSpOn) => S::SpindleOnReadyToFeed,
            (S::PreFeedDelay, E::JoystickToFeedSpOff) => S::JoystickResetRequired,
            (S::PreFeedDelay, E::JoystickToNeutralSpOff) => S::Idle,

            (S::Feeding, E::JoystickToNeutralSpOn) => S::SpindleOnReadyToFeed,
            (S::Feeding, E::JoystickToFeedSpOff) => S::JoystickResetRequired,
            (S::Feeding, E::JoystickToJogSpOn) => S::Jogging,

            (S::CannotFeedWithSpindleOff, E::JoystickToFeedSpOn) => S::JoystickResetRequired,
            (
                S::CannotFeedWithSpindleOff,
                E::JoystickToJogSpOn | E::JoystickToJogSpOff,
            ) => S::Jogging,
            (S::CannotFeedWithSpindleOff, E::JoystickToNeutralSpOff) => S::Idle,

            (S::JoystickResetRequired, E::JoystickToNeutralSpOn) => S::SpindleOnReadyToFeed,
            (S::JoystickResetRequired, E::JoystickToNeutralSpOff) => S::Idle,

            (S::Jogging, E::JoystickToFeedSpOn | E::JoystickToFeedSpOff) => {
                S::JoystickResetRequired
            }
            (S::Jogging, E::JoystickToJogSpOn | E::JoystickToJogSpOff) => S::Jogging,
            (S::Jogging, E::JoystickToNeutralSpOn) => S::SpindleOnReadyToFeed,
            (S::Jogging, E::JoystickToNeutralSpOff) => S::Idle,

            _ => return None,
        };
        Some(next)
    }

    /// Advisory shown while in this state, if any.
    pub fn advisory(self) -> Option<crate::messages::UserMessage> {
        use crate::messages::UserMessage;
        match self {
            Self::CannotFeedWithSpindleOff => Some(UserMessage::CannotFeedWithSpindleOff),
            Self::JoystickResetRequired => Some(UserMessage::JoystickResetRequired),
            _ => None,
        }
    }
}

impl std::fmt::Display for ManualTurningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SpindleOnReadyToFeed => "spindle-on-ready-to-feed",
            Self::PreFeedDelay => "pre-feed-delay",
            Self::Feeding => "feeding",
            Self::Jogging => "jogging",
            Self::CannotFeedWithSpindleOff => "cannot-feed-with-spindle-off",
            Self::JoystickResetRequired => "joystick-reset-required",
        };
        f.write_str(s)
    }
}
