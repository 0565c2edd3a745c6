/// Surface distance on the WGS-84 spheroid and the `<->` operator surface.
pub mod distance;
pub use distance::{estimate_point_bbox_distance, spheroid_distance, Distance};

/// Overlap predicates (the `&&` operator surface), including
/// point-in-cluster ray casting.
pub mod overlaps;
pub use overlaps::Overlaps;

/// East/west wrap frame anchored at a reference longitude: `-1` when the
/// anchor lies in the western hemisphere, `+1` in the eastern, `0` on the
/// prime meridian, together with the anchor's antipodal longitude.
pub(crate) fn wrap_frame(lon: f64) -> (i8, f64) {
    if lon < 0.0 {
        (-1, lon + 180.0)
    } else if lon > 0.0 {
        (1, lon - 180.0)
    } else {
        (0, 0.0)
    }
}

/// Re-express a longitude in the given wrap frame so that all values of one
/// entry lie on a contiguous span.
pub(crate) fn wrap_adjust(lon_dir: i8, lon_break: f64, lon: f64) -> f64 {
    if lon_dir < 0 && lon > lon_break {
        lon - 360.0
    } else if lon_dir > 0 && lon < lon_break {
        lon + 360.0
    } else {
        lon
    }
}
