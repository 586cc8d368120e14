use super::*;

const PRESETS: [Ease; 11] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::InSine,
    Ease::OutSine,
    Ease::InOutSine,
    Ease::CubicBezier(0.25, 0.1, 0.25, 1.0),
];

#[test]
fn endpoints_are_stable() {
    for ease in PRESETS {
        assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?}");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in PRESETS {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn linear_bezier_is_identity() {
    let ease = Ease::CubicBezier(0.0, 0.0, 1.0, 1.0);
    for t in [0.1, 0.33, 0.5, 0.9] {
        assert!((ease.apply(t) - t).abs() < 1e-5);
    }
}

#[test]
fn parse_presets_and_bezier() {
    assert_eq!(Ease::parse("In-Out Cubic").unwrap(), Ease::InOutCubic);
    assert_eq!(Ease::parse("linear").unwrap(), Ease::Linear);
    assert_eq!(
        Ease::parse("cubic-bezier(0.42, 0, 0.58, 1)").unwrap(),
        Ease::CubicBezier(0.42, 0.0, 0.58, 1.0)
    );
    assert!(Ease::parse("cubic-bezier(2, 0, 0.5, 1)").is_err());
    assert!(Ease::parse("cubic-bezier(0.1, 0.2)").is_err());
    assert_eq!(
        Ease::parse("ease-in-out").unwrap(),
        Ease::parse("cubic-bezier(0.42, 0, 0.58, 1)").unwrap()
    );
    assert!(Ease::parse("bounce").is_err());
}

#[test]
fn easing_clamps_input_and_guards_custom_output() {
    let easing = Easing::default();
    assert_eq!(easing.apply(-1.0), 0.0);
    assert_eq!(easing.apply(2.0), 1.0);

    let broken = Easing::custom(|_| f64::NAN);
    assert_eq!(broken.apply(0.3), 0.3);

    let squared = Easing::custom(|t| t * t);
    assert_eq!(squared.apply(0.5), 0.25);
    assert!(format!("{squared:?}").starts_with("Custom"));
}
