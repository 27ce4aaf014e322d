// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

/// Round to the nearest integer, ties to even.
#[inline]
pub fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

/// Round to `decimals` places, ties to even.
#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    rint(x * scale) / scale
}

/// 1.0 if the condition holds, 0.0 otherwise.
#[inline]
pub fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(2.0, rint(2.5));
        assert_eq!(4.0, rint(3.5));
        assert_eq!(-2.0, rint(-1.7));
        assert_eq!(1.23, round_to(1.2345, 2));
        assert_eq!(50.1, round_to(50.1004, 1));
        assert_eq!(1.0, indicator(true));
    }
}
