use super::*;

const RED: Rgba = [0.8, 0.2, 0.4, 1.0];

#[test]
fn additive_halves_sum_back_to_source() {
    let mode = BlendMode::Additive;
    let acc = mode.apply([0.0; 4], RED, 0.5);
    let acc = mode.apply(acc, RED, 0.5);
    for c in 0..3 {
        assert!((acc[c] - RED[c]).abs() < 1e-6, "channel {c}: {}", acc[c]);
    }
    // Alpha is a max, not a sum.
    assert_eq!(acc[3], 0.5);
}

#[test]
fn additive_clamps_overflow() {
    let out = BlendMode::Additive.apply([0.9, 0.9, 0.9, 1.0], [0.5, 0.5, 0.5, 1.0], 1.0);
    assert_eq!(out, [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn alpha_takes_the_max() {
    let out = BlendMode::Additive.apply([0.0, 0.0, 0.0, 0.8], [0.0, 0.0, 0.0, 1.0], 0.5);
    assert_eq!(out[3], 0.8);
    let out = BlendMode::Screen.apply([0.0, 0.0, 0.0, 0.2], [0.0, 0.0, 0.0, 1.0], 0.5);
    assert_eq!(out[3], 0.5);
}

#[test]
fn multiply_ignores_transparent_source() {
    let acc = [0.6, 0.4, 0.2, 1.0];
    assert_eq!(BlendMode::Multiply.apply(acc, [0.0; 4], 1.0), acc);
    let out = BlendMode::Multiply.apply(acc, [0.5, 0.5, 0.5, 1.0], 1.0);
    assert!((out[0] - 0.3).abs() < 1e-6);
}

#[test]
fn screen_brightens() {
    let out = BlendMode::Screen.apply([0.5, 0.5, 0.5, 1.0], [0.5, 0.5, 0.5, 1.0], 1.0);
    assert!((out[0] - 0.75).abs() < 1e-6);
}

#[test]
fn custom_results_are_sanitized() {
    let mode = BlendMode::custom(|_, _, _| [f32::NAN, 2.0, -1.0, 0.5]);
    assert_eq!(mode.apply([0.0; 4], [0.0; 4], 1.0), [0.0, 1.0, 0.0, 0.5]);
    assert!(format!("{mode:?}").starts_with("Custom"));
}

#[test]
fn parse_names() {
    assert!(matches!(BlendMode::parse(" Add "), Ok(BlendMode::Additive)));
    assert!(matches!(BlendMode::parse("screen"), Ok(BlendMode::Screen)));
    assert!(BlendMode::parse("overlay").is_err());
    assert!(BlendMode::parse("").is_err());
}

#[test]
fn buffer_blend_checks_sizes_and_is_pure() {
    let acc = PixelBuffer::new(2, 2);
    let src = PixelBuffer::filled(2, 2, RED);
    let out = blend_pixels(&acc, &src, 1.0, &BlendMode::Additive).unwrap();
    assert_eq!(acc.get(0, 0), Some([0.0; 4]));
    assert_eq!(out.get(1, 1), Some(RED));

    let mut wrong = PixelBuffer::new(3, 2);
    assert!(blend_in_place(&mut wrong, &src, 1.0, &BlendMode::Additive).is_err());
}
