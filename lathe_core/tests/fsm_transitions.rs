use lathe_core::{Event, ManualTurningState as S};
use proptest::prelude::*;
use rstest::rstest;

use Event as E;

#[rstest]
#[case(S::Idle, E::JoystickToNeutralSpOn, Some(S::SpindleOnReadyToFeed))]
#[case(S::Idle, E::JoystickToFeedSpOff, Some(S::CannotFeedWithSpindleOff))]
#[case(S::Idle, E::JoystickToJogSpOff, Some(S::Jogging))]
#[case(S::Idle, E::JoystickToFeedSpOn, None)]
#[case(S::Idle, E::FeedDelayExpired, None)]
#[case(S::SpindleOnReadyToFeed, E::JoystickToNeutralSpOff, Some(S::Idle))]
#[case(S::SpindleOnReadyToFeed, E::JoystickToFeedSpOn, Some(S::PreFeedDelay))]
#[case(S::SpindleOnReadyToFeed, E::JoystickToJogSpOn, Some(S::Jogging))]
#[case(S::SpindleOnReadyToFeed, E::FeedDelayExpired, None)]
#[case(S::PreFeedDelay, E::FeedDelayExpired, Some(S::Feeding))]
#[case(S::PreFeedDelay, E::JoystickToJogSpOn, Some(S::Jogging))]
#[case(S::PreFeedDelay, E::JoystickToNeutralSpOn, Some(S::SpindleOnReadyToFeed))]
#[case(S::PreFeedDelay, E::JoystickToFeedSpOff, Some(S::JoystickResetRequired))]
#[case(S::PreFeedDelay, E::JoystickToNeutralSpOff, Some(S::Idle))]
#[case(S::Feeding, E::JoystickToNeutralSpOn, Some(S::SpindleOnReadyToFeed))]
#[case(S::Feeding, E::JoystickToFeedSpOff, Some(S::JoystickResetRequired))]
#[case(S::Feeding, E::JoystickToJogSpOn, Some(S::Jogging))]
#[case(S::Feeding, E::FeedDelayExpired, None)]
#[case(S::CannotFeedWithSpindleOff, E::JoystickToFeedSpOn, Some(S::JoystickResetRequired))]
#[case(S::CannotFeedWithSpindleOff, E::JoystickToJogSpOn, Some(S::Jogging))]
#[case(S::CannotFeedWithSpindleOff, E::JoystickToJogSpOff, Some(S::Jogging))]
#[case(S::CannotFeedWithSpindleOff, E::JoystickToNeutralSpOff, Some(S::Idle))]
#[case(S::JoystickResetRequired, E::JoystickToNeutralSpOn, Some(S::SpindleOnReadyToFeed))]
#[case(S::JoystickResetRequired, E::JoystickToNeutralSpOff, Some(S::Idle))]
#[case(S::JoystickResetRequired, E::JoystickToFeedSpOn, None)]
#[case(S::JoystickResetRequired, E::JoystickToFeedSpOff, None)]
#[case(S::JoystickResetRequired, E::JoystickToJogSpOn, None)]
#[case(S::Jogging, E::JoystickToFeedSpOn, Some(S::JoystickResetRequired))]
#[case(S::Jogging, E::JoystickToFeedSpOff, Some(S::JoystickResetRequired))]
#[case(S::Jogging, E::JoystickToJogSpOff, Some(S::Jogging))]
#[case(S::Jogging, E::JoystickToJogSpOn, Some(S::Jogging))]
#[case(S::Jogging, E::JoystickToNeutralSpOn, Some(S::SpindleOnReadyToFeed))]
#[case(S::Jogging, E::JoystickToNeutralSpOff, Some(S::Idle))]
fn transition_table(
    #[case] from: S,
    #[case] event: Event,
    #[case] expected: Option<S>,
) {
    assert_eq!(from.next(event), expected);
}

#[test]
fn initial_state_is_idle() {
    assert_eq!(S::default(), S::Idle);
}

#[test]
fn feed_delay_expiry_only_matters_in_pre_feed_delay() {
    for state in S::ALL {
        let next = state.next(E::FeedDelayExpired);
        if state == S::PreFeedDelay {
            assert_eq!(next, Some(S::Feeding));
        } else {
            assert_eq!(next, None, "{state}");
        }
    }
}

fn any_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(E::JoystickToFeedSpOn),
        Just(E::JoystickToJogSpOn),
        Just(E::JoystickToNeutralSpOn),
        Just(E::JoystickToFeedSpOff),
        Just(E::JoystickToJogSpOff),
        Just(E::JoystickToNeutralSpOff),
        Just(E::FeedDelayExpired),
    ]
}

proptest! {
    // Feeding is only reachable through an uninterrupted delay window, and the
    // delay window only opens from spindle-on-ready with a feed deflection.
    #[test]
    fn feeding_requires_ready_then_delay(events in proptest::collection::vec(any_event(), 0..200)) {
        let mut state = S::Idle;
        for ev in events {
            if let Some(next) = state.next(ev) {
                if next == S::Feeding {
                    prop_assert_eq!(state, S::PreFeedDelay);
                    prop_assert_eq!(ev, E::FeedDelayExpired);
                }
                if next == S::PreFeedDelay {
                    prop_assert_eq!(state, S::SpindleOnReadyToFeed);
                    prop_assert_eq!(ev, E::JoystickToFeedSpOn);
                }
                state = next;
            }
        }
    }

    // Reset-required holds through any run of feed deflections.
    #[test]
    fn reset_required_holds_until_neutral(
        feeds in proptest::collection::vec(prop_oneof![Just(E::JoystickToFeedSpOn), Just(E::JoystickToFeedSpOff)], 1..50)
    ) {
        let mut state = S::JoystickResetRequired;
        for ev in feeds {
            if let Some(next) = state.next(ev) {
                state = next;
            }
            prop_assert_eq!(state, S::JoystickResetRequired);
        }
        prop_assert_eq!(state.next(E::JoystickToNeutralSpOn), Some(S::SpindleOnReadyToFeed));
    }
}
