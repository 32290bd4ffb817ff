// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small geometry helpers over kurbo value types.

use kurbo::{Affine, Rect};

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box, equivalent to taking the min/max over all four
/// transformed corners.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}

/// Invert an affine, with a defined fallback for singular matrices: the
/// inverse of a non-invertible transform is the zero-scale matrix retaining
/// the negated translation, so downstream queries collapse to a point
/// instead of producing non-finite coordinates.
pub(crate) fn invert_affine(affine: Affine) -> Affine {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let det = a * d - b * c;
    if det == 0.0 || !det.is_finite() {
        return Affine::new([0.0, 0.0, 0.0, 0.0, -e, -f]);
    }
    let inv = det.recip();
    Affine::new([
        d * inv,
        -b * inv,
        -c * inv,
        a * inv,
        (c * f - d * e) * inv,
        (b * e - a * f) * inv,
    ])
}

/// Whether two rectangles overlap with open-interval semantics: rectangles
/// that merely touch along an edge or corner do not overlap.
pub(crate) fn rects_overlap_open(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Normalize an angle in degrees into `(-180, 180]`. NaN passes through.
pub(crate) fn normalize_degrees(degrees: f64) -> f64 {
    let mut r = degrees % 360.0;
    if r <= -180.0 {
        r += 360.0;
    } else if r > 180.0 {
        r -= 360.0;
    }
    // Canonicalize -0.0 so the guarded bit-compare treats it as 0.
    if r == 0.0 { 0.0 } else { r }
}

/// Sine and cosine of an angle given in degrees, with exact values at the
/// cardinal angles so axis-aligned content stays axis-aligned bit-for-bit.
///
/// The input is expected to already be normalized into `(-180, 180]`.
pub(crate) fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    if degrees == 0.0 {
        (0.0, 1.0)
    } else if degrees == 90.0 {
        (1.0, 0.0)
    } else if degrees == 180.0 {
        (0.0, -1.0)
    } else if degrees == -90.0 {
        (-1.0, 0.0)
    } else {
        sin_cos(degrees.to_radians())
    }
}

#[cfg(feature = "std")]
fn sin_cos(radians: f64) -> (f64, f64) {
    radians.sin_cos()
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
fn sin_cos(radians: f64) -> (f64, f64) {
    (libm::sin(radians), libm::cos(radians))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn bbox_of_rotated_rect_covers_all_corners() {
        let tf = Affine::rotate(45_f64.to_radians());
        let bbox = transform_rect_bbox(tf, Rect::new(-10.0, -10.0, 10.0, 10.0));
        let half_diag = 10.0 * core::f64::consts::SQRT_2;
        assert!((bbox.x0 + half_diag).abs() < 1e-9);
        assert!((bbox.x1 - half_diag).abs() < 1e-9);
        assert!((bbox.y0 + half_diag).abs() < 1e-9);
        assert!((bbox.y1 - half_diag).abs() < 1e-9);
    }

    #[test]
    fn invert_round_trips_regular_transforms() {
        let tf = Affine::new([2.0, 0.5, -0.25, 3.0, 7.0, -4.0]);
        let p = Point::new(12.0, -3.5);
        let back = invert_affine(tf) * (tf * p);
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn invert_singular_collapses_but_keeps_negated_translation() {
        let tf = Affine::new([0.0, 0.0, 0.0, 0.0, 5.0, 9.0]);
        let inv = invert_affine(tf);
        assert_eq!(inv.as_coeffs(), [0.0, 0.0, 0.0, 0.0, -5.0, -9.0]);
        // Every point maps to the collapsed translation; nothing non-finite.
        let p = inv * Point::new(123.0, -456.0);
        assert_eq!((p.x, p.y), (-5.0, -9.0));
    }

    #[test]
    fn open_overlap_rejects_shared_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap_open(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!rects_overlap_open(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!rects_overlap_open(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn degree_normalization() {
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-270.0), 90.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert_eq!(normalize_degrees(360.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(normalize_degrees(-360.0).to_bits(), 0.0_f64.to_bits());
    }

    #[test]
    fn cardinal_angles_are_exact() {
        assert_eq!(sin_cos_degrees(0.0), (0.0, 1.0));
        assert_eq!(sin_cos_degrees(90.0), (1.0, 0.0));
        assert_eq!(sin_cos_degrees(180.0), (0.0, -1.0));
        assert_eq!(sin_cos_degrees(-90.0), (-1.0, 0.0));
        let (s, c) = sin_cos_degrees(45.0);
        assert!((s - core::f64::consts::FRAC_1_SQRT_2).abs() < 1e-15);
        assert!((c - core::f64::consts::FRAC_1_SQRT_2).abs() < 1e-15);
    }
}
