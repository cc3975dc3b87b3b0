pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Euclidean remainder for wrap-around positions (always in `[0, m)` for `m > 0`).
pub(crate) fn wrap(v: f64, m: f64) -> f64 {
    if m <= 0.0 {
        return 0.0;
    }
    let r = v.rem_euclid(m);
    // `rem_euclid` can round up to exactly `m` for tiny negative inputs.
    if r >= m { 0.0 } else { r }
}

/// `ceil(a * b / c)` in exact integer arithmetic.
pub(crate) fn mul_div_ceil(a: u64, b: u64, c: u64) -> u64 {
    if c == 0 {
        return 0;
    }
    let num = u128::from(a) * u128::from(b);
    let den = u128::from(c);
    num.div_ceil(den) as u64
}

/// `round(a * b / c)` in exact integer arithmetic.
pub(crate) fn mul_div_round(a: u64, b: u64, c: u64) -> u64 {
    if c == 0 {
        return 0;
    }
    let num = u128::from(a) * u128::from(b);
    let den = u128::from(c);
    ((num + den / 2) / den) as u64
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
