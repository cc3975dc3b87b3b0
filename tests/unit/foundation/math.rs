use super::*;

#[test]
fn wrap_stays_in_range_for_negative_inputs() {
    assert!((wrap(-1.0, 10.0) - 9.0).abs() < 1e-12);
    assert!((wrap(25.0, 10.0) - 5.0).abs() < 1e-12);
    assert_eq!(wrap(-1e-18, 10.0), 0.0);
    assert_eq!(wrap(3.0, 0.0), 0.0);
}

#[test]
fn integer_ratio_helpers_round_as_documented() {
    assert_eq!(mul_div_ceil(240_000, 24, 48_000), 120);
    assert_eq!(mul_div_ceil(240_001, 24, 48_000), 121);
    assert_eq!(mul_div_round(5, 1_000_000, 24), 208_333);
    assert_eq!(mul_div_ceil(1, 1, 0), 0);
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(1.0, 1.08, 0.0), 1.0);
    assert!((lerp(1.0, 1.08, 1.0) - 1.08).abs() < 1e-12);
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
}
