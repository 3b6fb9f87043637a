//! Snap raw cell dimensions to a usable export ratio.
//!
//! Cells cut from real sheets are rarely an exact ratio (a 1000×563 cell is
//! "16:9" to any human). [`resolve_ratio`] first tries the canonical table,
//! **first match wins in table order**, then falls back to the smallest
//! denominator (up to 19) that reproduces the raw value closely.

use super::params::AspectRatio;

/// Canonical ratios, in precedence order.
pub const CANONICAL_RATIOS: [(u32, u32); 8] = [
    (16, 9),
    (9, 16),
    (1, 1),
    (4, 3),
    (3, 4),
    (3, 2),
    (2, 3),
    (21, 9),
];

/// Maximum absolute distance for a canonical table hit.
pub const CANONICAL_TOLERANCE: f64 = 0.05;

/// Precision of the rational fallback.
const RATIONAL_PRECISION: f64 = 1e-3;

/// Largest denominator tried by the rational fallback.
const MAX_DENOMINATOR: u32 = 19;

/// Map a raw `width × height` to an integer aspect ratio.
///
/// # Examples
/// ```
/// # use gridcut::imaging::{AspectRatio, resolve_ratio};
/// assert_eq!(resolve_ratio(1000.0, 563.0), AspectRatio::new(16, 9));
/// assert_eq!(resolve_ratio(5.0, 4.0), AspectRatio::new(5, 4));
/// ```
pub fn resolve_ratio(width: f64, height: f64) -> AspectRatio {
    let raw = width / height;

    if let Some(&(w, h)) = CANONICAL_RATIOS
        .iter()
        .find(|&&(w, h)| (raw - w as f64 / h as f64).abs() < CANONICAL_TOLERANCE)
    {
        return AspectRatio::new(w, h);
    }

    let (n, d) = simplify(raw);
    AspectRatio::new(n, d)
}

/// First `(round(value × d), d)` for `d = 1..=19` within precision, or the
/// `d = 19` approximation when none is.
fn simplify(value: f64) -> (u32, u32) {
    let mut approx = (value.round() as u32, 1);
    for d in 1..=MAX_DENOMINATOR {
        let n = (value * d as f64).round();
        approx = (n as u32, d);
        if (n / d as f64 - value).abs() < RATIONAL_PRECISION {
            break;
        }
    }
    approx
}
