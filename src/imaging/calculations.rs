//! Pure calculation functions for trim and aspect-ratio geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::{CropRect, TrimSpec};

/// Relative tolerance under which two aspect ratios are treated as equal.
const RATIO_TOLERANCE: f64 = 1e-5;

/// Width-to-height ratio. Returns `0.0` when `height` is zero.
///
/// Zero is a sentinel for "undefined": callers check for exactly `0.0`
/// before doing further math with the result.
pub fn ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    width as f64 / height as f64
}

/// Landscape means strictly wider than tall. Squares count as portrait.
pub fn is_landscape(dims: Dimensions) -> bool {
    dims.width > dims.height
}

/// `true` if `a` and `b` differ by less than [`RATIO_TOLERANCE`] relative
/// to the larger magnitude.
pub fn nearly_equal(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return true;
    }
    (a - b).abs() <= scale * RATIO_TOLERANCE
}

/// Aspect ratio requested on the command line, reconciled with the
/// orientation of one particular image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestedAspect {
    /// `width / height`, or `0.0` when the request is unusable.
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
}

/// Parse a `"W:H"` request and orient it to match `original`.
///
/// The longer-to-shorter relationship is kept rather than the literal axes:
/// `"3:2"` stays 3:2 on a landscape image and becomes 2:3 on a portrait one.
/// A missing or empty token (or a token that is not a number) yields a
/// zero ratio.
///
/// # Examples
/// ```
/// # use trimimage::imaging::{Dimensions, resolve_requested_ratio};
/// let portrait = Dimensions { width: 3000, height: 4000 };
/// let aspect = resolve_requested_ratio(portrait, "3:2");
/// assert_eq!((aspect.width, aspect.height), (2, 3));
/// ```
pub fn resolve_requested_ratio(original: Dimensions, requested: &str) -> RequestedAspect {
    let unusable = RequestedAspect {
        ratio: 0.0,
        width: 0,
        height: 0,
    };

    let mut tokens = requested.split(':').map(str::trim);
    let (Some(w), Some(h)) = (tokens.next(), tokens.next()) else {
        return unusable;
    };
    if w.is_empty() || h.is_empty() {
        return unusable;
    }

    let w: u32 = w.parse().unwrap_or(0);
    let h: u32 = h.parse().unwrap_or(0);

    let (width, height) = if is_landscape(original) {
        (w.max(h), w.min(h))
    } else {
        (w.min(h), w.max(h))
    };

    RequestedAspect {
        ratio: ratio(width, height),
        width,
        height,
    }
}

/// Compute the rectangle to extract from an image of size `original`.
///
/// Explicit edges give the baseline. When an aspect ratio is requested (and
/// is usable and differs from the image's own ratio), one axis is recomputed
/// from the other and its delta split evenly between the two edges of that
/// axis, replacing any explicit trims on it. An odd delta drops its leftover
/// pixel.
///
/// The result is never clamped: a non-positive width or height means the
/// request cannot be satisfied for this image.
pub fn plan_crop(original: Dimensions, spec: &TrimSpec) -> CropRect {
    let orig_w = original.width as i64;
    let orig_h = original.height as i64;

    let mut rect = CropRect {
        top: spec.top as i64,
        left: spec.left as i64,
        width: orig_w - spec.left as i64 - spec.right as i64,
        height: orig_h - spec.top as i64 - spec.bottom as i64,
    };

    let Some(aspect) = spec.requested_aspect() else {
        return rect;
    };

    let requested = resolve_requested_ratio(original, aspect).ratio;
    let current = ratio(original.width, original.height);

    if requested == 0.0 || nearly_equal(requested, current) {
        return rect;
    }

    if requested > current {
        // Target is wider: keep the width, shorten the height. h = w / r
        rect.height = (orig_w as f64 / requested).round() as i64;
        rect.top = (orig_h - rect.height) / 2;
    } else {
        // Target is taller: keep the height, narrow the width. w = h * r
        rect.width = (orig_h as f64 * requested).round() as i64;
        rect.left = (orig_w - rect.width) / 2;
    }

    rect
}
