//! Escape-time evaluation and the iteration count to palette index rule.

use crate::pixel::Complex;

/// Squared escape radius: an orbit has escaped once `|z|² > 4`.
pub const ESCAPE_RADIUS_SQ: f32 = 4.0;

/// Largest iteration budget a run accepts. Interior points always run to the
/// budget, so anything beyond this stalls a frame for minutes.
pub const MAX_ITERATIONS: u32 = 1 << 20;

/// Palette index of points that never escape.
pub const INTERIOR: u8 = 0;

/// Iterate `z ← z² + c` from `z = 0`.
///
/// Returns the number of iterations after which `|z|²` first exceeded the
/// escape radius, or `None` if the orbit stayed bounded for
/// `max_iterations` steps.
#[inline]
pub fn escape_time(c: Complex, max_iterations: u32) -> Option<u32> {
    let mut z = Complex::ZERO;
    for n in 1..=max_iterations {
        z = z * z + c;
        if z.norm_sqr() > ESCAPE_RADIUS_SQ {
            return Some(n);
        }
    }
    None
}

/// Palette index for an orbit that escaped after `n >= 1` iterations.
///
/// Escaped points cycle through `1..=255`; 0 is reserved for the interior.
/// The device kernel carries the same expression.
#[inline]
pub fn palette_index(n: u32) -> u8 {
    1 + (n % 255) as u8
}

#[inline]
pub fn evaluate(c: Complex, max_iterations: u32) -> u8 {
    match escape_time(c, max_iterations) {
        Some(n) => palette_index(n),
        None => INTERIOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        for max_iterations in [1, 2, 10, 255, 256, 1000, 10_000] {
            assert_eq!(escape_time(Complex::ZERO, max_iterations), None);
            assert_eq!(evaluate(Complex::ZERO, max_iterations), INTERIOR);
        }
    }

    #[test]
    fn far_point_escapes_immediately() {
        let c = Complex::new(2.0, 2.0);
        assert_eq!(escape_time(c, 1), Some(1));
        assert_eq!(escape_time(c, 500), Some(1));
        assert_ne!(evaluate(c, 500), INTERIOR);
    }

    #[test]
    fn minus_two_stays_on_the_boundary() {
        // z: -2, 2, 2, ... never strictly exceeds radius 2
        assert_eq!(escape_time(Complex::new(-2.0, 0.0), 100), None);
    }

    #[test]
    fn escape_count_for_known_point() {
        // c = 1: z = 1, 2, 5
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 100), Some(3));
        assert_eq!(evaluate(Complex::new(1.0, 0.0), 100), 4);
    }

    #[test]
    fn palette_index_never_collides_with_interior() {
        for n in 1..2000 {
            assert_ne!(palette_index(n), INTERIOR);
        }
        assert_eq!(palette_index(254), 255);
        assert_eq!(palette_index(255), 1);
        assert_eq!(palette_index(u32::MAX), 1 + (u32::MAX % 255) as u8);
    }

    #[test]
    fn iteration_budget_is_respected() {
        // c = 1 needs three iterations to escape
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 2), None);
    }
}
