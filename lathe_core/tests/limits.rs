use std::cell::RefCell;
use std::rc::Rc;

use lathe_core::{LimitInputs, LimitsError, SoftLimits, SoftLimitsHandler, limits::compose};
use lathe_traits::LimitPin;
use proptest::prelude::*;

const DEFAULTS: SoftLimits = SoftLimits::new(0.0, 140.0, 0.0, 500.0);

#[test]
fn chuck_and_tailstock_example() {
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    h.set_chuck_limit(20.0).unwrap();
    h.set_chuck_active(true).unwrap();
    let l = h.set_tailstock_limit(30.0).unwrap();
    assert_eq!(l.z_min, 20.0);
    assert_eq!(l.z_max, 470.0);
    assert_eq!(h.limits(), l);
}

#[test]
fn publishes_once_per_change_including_identical_results() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    let sink = Rc::clone(&seen);
    h.subscribe(move |l| sink.borrow_mut().push(*l));

    h.set_chuck_limit(20.0).unwrap(); // inactive: same envelope, still published
    h.set_chuck_active(true).unwrap();
    h.set_custom_limit(LimitPin::XMax, Some(60.0)).unwrap();
    h.set_custom_limit_active(LimitPin::XMax, true).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], DEFAULTS);
    assert_eq!(seen[1].z_min, 20.0);
    assert_eq!(seen[3].x_max, 60.0);
}

#[test]
fn inverted_composition_is_rejected_and_rolled_back() {
    let count = Rc::new(RefCell::new(0usize));
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    let c = Rc::clone(&count);
    h.subscribe(move |_| *c.borrow_mut() += 1);

    h.set_chuck_active(true).unwrap();
    h.set_chuck_limit(300.0).unwrap();
    let before = h.limits();
    let err = h.set_tailstock_limit(250.0).unwrap_err();
    assert!(matches!(err, LimitsError::Inverted { .. }));
    assert_eq!(h.limits(), before);
    assert_eq!(h.inputs().tailstock_limit, 0.0);
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn custom_min_above_custom_max_is_rejected() {
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    h.set_custom_limit(LimitPin::XMin, Some(100.0)).unwrap();
    h.set_custom_limit(LimitPin::XMax, Some(50.0)).unwrap();
    // both inactive so far
    assert_eq!(h.limits(), DEFAULTS);
    h.set_custom_limit_active(LimitPin::XMin, true).unwrap();
    let err = h.set_custom_limit_active(LimitPin::XMax, true).unwrap_err();
    assert!(matches!(
        err,
        LimitsError::Inverted {
            axis: lathe_traits::Axis::X,
            ..
        }
    ));
    assert!(!h.inputs().x_max_active);
}

#[test]
fn shared_toggle_activates_all_custom_bounds() {
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    h.set_custom_limit(LimitPin::XMin, Some(5.0)).unwrap();
    h.set_custom_limit(LimitPin::ZMax, Some(400.0)).unwrap();
    let l = h.set_custom_limits_active(true).unwrap();
    assert_eq!(l, SoftLimits::new(5.0, 140.0, 0.0, 400.0));
    let l = h.set_custom_limits_active(false).unwrap();
    assert_eq!(l, DEFAULTS);
}

#[test]
fn non_finite_input_is_refused() {
    let mut h = SoftLimitsHandler::new(DEFAULTS).unwrap();
    assert!(matches!(
        h.set_chuck_limit(f64::NAN),
        Err(LimitsError::NonFinite(_))
    ));
    assert!(SoftLimitsHandler::new(SoftLimits::new(10.0, 0.0, 0.0, 1.0)).is_err());
}

fn any_inputs() -> impl Strategy<Value = LimitInputs> {
    let bound = proptest::option::of(-1000.0f64..1000.0);
    (
        (-50.0f64..600.0, any::<bool>(), -50.0f64..600.0),
        (bound.clone(), bound.clone(), bound.clone(), bound),
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
    )
        .prop_map(|((chuck, chuck_on, tail), (xn, xx, zn, zx), (a, b, c, d))| LimitInputs {
            chuck_limit: chuck,
            chuck_active: chuck_on,
            tailstock_limit: tail,
            custom_x_min: xn,
            custom_x_max: xx,
            custom_z_min: zn,
            custom_z_max: zx,
            x_min_active: a,
            x_max_active: b,
            z_min_active: c,
            z_max_active: d,
        })
}

proptest! {
    #[test]
    fn composition_never_loosens_the_default_envelope(inputs in any_inputs()) {
        match compose(&DEFAULTS, &inputs) {
            Ok(l) => {
                prop_assert!(l.is_within(&DEFAULTS), "{l:?}");
                prop_assert!(l.x_min <= l.x_max && l.z_min <= l.z_max);
            }
            Err(e) => prop_assert!(matches!(e, LimitsError::Inverted { .. }), "{e:?}"),
        }
    }
}
