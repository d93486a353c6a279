//! Events fed to the turning state machine.

use crate::types::JoystickDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    JoystickToFeedSpOn,
    JoystickToJogSpOn,
    JoystickToNeutralSpOn,
    JoystickToFeedSpOff,
    JoystickToJogSpOff,
    JoystickToNeutralSpOff,
    /// The pre-feed grace window elapsed without interruption.
    FeedDelayExpired,
}

impl Event {
    pub const SIGNAL_EVENTS: [Self; 6] = [
        Self::JoystickToFeedSpOn,
        Self::JoystickToJogSpOn,
        Self::JoystickToNeutralSpOn,
        Self::JoystickToFeedSpOff,
        Self::JoystickToJogSpOff,
        Self::JoystickToNeutralSpOff,
    ];
}

/// Map the spindle, joystick and rapid flags to an event.
///
/// Rapid wins over both feed and neutral: holding rapid always means jog.
pub fn derive_event(spindle_on: bool, direction: JoystickDirection, rapid: bool) -> Event {
    match (spindle_on, direction.is_centered(), rapid) {
        (true, _, true) => Event::JoystickToJogSpOn,
        (true, false, false) => Event::JoystickToFeedSpOn,
        (true, true, false) => Event::JoystickToNeutralSpOn,
        (false, _, true) => Event::JoystickToJogSpOff,
        (false, false, false) => Event::JoystickToFeedSpOff,
        (false, true, false) => Event::JoystickToNeutralSpOff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JoystickDirection as J;

    #[test]
    fn derivation_table() {
        let cases = [
            (true, J::XPlus, false, Event::JoystickToFeedSpOn),
            (true, J::ZMinus, true, Event::JoystickToJogSpOn),
            (true, J::None, false, Event::JoystickToNeutralSpOn),
            (true, J::None, true, Event::JoystickToJogSpOn),
            (false, J::XMinus, false, Event::JoystickToFeedSpOff),
            (false, J::ZPlus, true, Event::JoystickToJogSpOff),
            (false, J::None, false, Event::JoystickToNeutralSpOff),
            (false, J::None, true, Event::JoystickToJogSpOff),
        ];
        for (spindle, dir, rapid, want) in cases {
            assert_eq!(derive_event(spindle, dir, rapid), want, "{spindle} {dir:?} {rapid}");
        }
    }

    #[test]
    fn every_direction_feeds_with_spindle_on() {
        for dir in J::DEFLECTED {
            assert_eq!(derive_event(true, dir, false), Event::JoystickToFeedSpOn);
        }
    }
}
