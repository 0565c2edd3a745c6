use std::f64::consts::PI;

use crate::algorithm::overlaps::point_in_cluster;
use crate::algorithm::{wrap_adjust, wrap_frame};
use crate::{Bbox, Circle, Cluster, Point, DIAMETER, EPS2, FADE_LIMIT, MAXDIST, SCALE, SUBEPS2};

/// Calculate the surface distance in meters between two positions on the
/// WGS-84 spheroid, given as latitude/longitude pairs in degrees.
///
/// The result is the tunnel distance through a scaled ellipsoid converted
/// to a surface arc. Beyond one sixth of the circumference the same
/// calculation is repeated towards the antipode of the second position, and
/// in the far band between the two limits both results are crossfaded.
/// This keeps the function cheap, monotone along great-circle displacement,
/// and exactly symmetric in its two arguments, at the price of an error in
/// the order of the spheroid flattening.
///
/// The result is always within `[0, MAXDIST]`.
pub fn spheroid_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // normalize the longitudes (lon2 >= 0, lon1 = 0)
    let lon2 = (lon2 - lon1).abs();
    // convert to radians (first divide, then multiply)
    let mut lat1 = (lat1 / 180.0) * PI;
    let mut lat2 = (lat2 / 180.0) * PI;
    let lon2 = (lon2 / 180.0) * PI;
    // make lat2 >= lat1 to ensure reversal symmetry despite floating point
    // operations (lon2 >= lon1 is already ensured above)
    if lat2 < lat1 {
        std::mem::swap(&mut lat1, &mut lat2);
    }
    // place both points in 3-space on a scaled ellipsoid with an average
    // diameter of 1.0
    let (lat1sin, lat1cos) = lat1.sin_cos();
    let (lat2sin, lat2cos) = lat2.sin_cos();
    let (lon2sin, lon2cos) = lon2.sin_cos();
    let nphi1 = SCALE / (1.0 - EPS2 * lat1sin * lat1sin).sqrt();
    let nphi2 = SCALE / (1.0 - EPS2 * lat2sin * lat2sin).sqrt();
    let x1 = nphi1 * lat1cos;
    let z1 = nphi1 * SUBEPS2 * lat1sin;
    let x2 = nphi2 * lat2cos * lon2cos;
    let y2 = nphi2 * lat2cos * lon2sin;
    let z2 = nphi2 * SUBEPS2 * lat2sin;
    // tunnel distance through the scaled ellipsoid, converted to an
    // approximated surface distance on the original spheroid
    let mut g = ((x2 - x1) * (x2 - x1) + y2 * y2 + (z2 - z1) * (z2 - z1)).sqrt();
    if g > 1.0 {
        g = 1.0;
    }
    let s = DIAMETER * g.asin();
    // trust the result only while small enough to be precise
    if s <= FADE_LIMIT {
        return s;
    }
    // repeat the calculation towards the antipode of the second point
    let lat2 = -lat2;
    let lon2 = lon2 - PI;
    let (lat2sin, lat2cos) = lat2.sin_cos();
    let (lon2sin, lon2cos) = lon2.sin_cos();
    let nphi2 = SCALE / (1.0 - EPS2 * lat2sin * lat2sin).sqrt();
    let x2 = nphi2 * lat2cos * lon2cos;
    let y2 = nphi2 * lat2cos * lon2sin;
    let z2 = nphi2 * SUBEPS2 * lat2sin;
    let mut g = ((x2 - x1) * (x2 - x1) + y2 * y2 + (z2 - z1) * (z2 - z1)).sqrt();
    if g > 1.0 {
        g = 1.0;
    }
    let t = DIAMETER * g.asin();
    if t <= FADE_LIMIT {
        return MAXDIST - t;
    }
    // crossfade the direct and the antipodal result to stay monotone
    (s * (t - FADE_LIMIT) + (MAXDIST - t) * (s - FADE_LIMIT)) / (s + t - 2.0 * FADE_LIMIT)
}

/// Calculate the minimum surface distance between two geographic values.
///
/// This is the `<->` operator at the query level. Distances to circles and
/// clusters are measured to their filled extent, so any overlap yields
/// zero.
///
/// # Units
///
/// - return value: meters
///
/// # Examples
///
/// ```
/// use geodex::prelude::*;
/// use geodex::Point;
///
/// let hamburg = Point::new(53.55, 10.0)?;
/// let dublin = Point::new(53.35, -6.26)?;
///
/// let distance = hamburg.distance(&dublin);
/// assert!((1_070_000.0..1_090_000.0).contains(&distance));
/// # Ok::<(), geodex::Error>(())
/// ```
pub trait Distance<Rhs = Self> {
    /// Calculate the minimum surface distance between two geographic
    /// values, in meters.
    fn distance(&self, rhs: &Rhs) -> f64;
}

impl Distance for Point {
    fn distance(&self, rhs: &Point) -> f64 {
        spheroid_distance(self.lat(), self.lon(), rhs.lat(), rhs.lon())
    }
}

impl Distance<Circle> for Point {
    fn distance(&self, rhs: &Circle) -> f64 {
        let distance = self.distance(&rhs.center()) - rhs.radius();
        if distance <= 0.0 {
            0.0
        } else {
            distance
        }
    }
}

impl Distance<Cluster> for Point {
    fn distance(&self, rhs: &Cluster) -> f64 {
        point_cluster_distance(self, rhs)
    }
}

impl Distance for Circle {
    fn distance(&self, rhs: &Circle) -> f64 {
        let distance = self.center().distance(&rhs.center()) - (self.radius() + rhs.radius());
        if distance <= 0.0 {
            0.0
        } else {
            distance
        }
    }
}

impl Distance<Cluster> for Circle {
    fn distance(&self, rhs: &Cluster) -> f64 {
        let distance = point_cluster_distance(&self.center(), rhs) - self.radius();
        if distance <= 0.0 {
            0.0
        } else {
            distance
        }
    }
}

macro_rules! symmetric_distance_impl {
    ($t:ty, $rhs:ty) => {
        impl Distance<$rhs> for $t {
            fn distance(&self, rhs: &$rhs) -> f64 {
                rhs.distance(self)
            }
        }
    };
}

symmetric_distance_impl!(Circle, Point);
symmetric_distance_impl!(Cluster, Point);
symmetric_distance_impl!(Cluster, Circle);

/// Calculate the approximate distance between a point and a cluster: zero
/// when the point belongs to the cluster, otherwise the minimum over all
/// vertices and edge projections.
pub(crate) fn point_cluster_distance(point: &Point, cluster: &Cluster) -> f64 {
    if point_in_cluster(point, cluster) {
        return 0.0;
    }
    let lat0 = point.lat();
    let mut min_dist = f64::INFINITY;
    for entry in cluster.entries() {
        let pts = entry.points();
        // covered longitude range of the entry, in the wrap frame of its
        // first vertex
        let (mut lon_dir, mut lon_break) = wrap_frame(pts[0].lon());
        let mut lon_min = 0.0;
        let mut lon_max = 0.0;
        for (j, vertex) in pts.iter().enumerate() {
            let lon = wrap_adjust(lon_dir, lon_break, vertex.lon());
            if j == 0 || lon < lon_min {
                lon_min = lon;
            }
            if j == 0 || lon > lon_max {
                lon_max = lon;
            }
        }
        // re-anchor the wrap frame at the middle of the covered range,
        // which is sharper than the first vertex for the projections below
        lon_break = (lon_max + lon_min) / 2.0;
        if lon_break < 0.0 {
            lon_dir = -1;
            lon_break += 180.0;
        } else if lon_break > 0.0 {
            lon_dir = 1;
            lon_break -= 180.0;
        }
        let lon0 = wrap_adjust(lon_dir, lon_break, point.lon());
        for j in 0..pts.len() {
            let lat1 = pts[j].lat();
            let lon1 = wrap_adjust(lon_dir, lon_break, pts[j].lon());
            let dist = spheroid_distance(lat0, lon0, lat1, lon1);
            if dist < min_dist {
                min_dist = dist;
            }
            let k = (j + 1) % pts.len();
            // the last edge only exists for closed entries
            if k == 0 && !entry.is_closed() {
                continue;
            }
            let lat2 = pts[k].lat();
            let lon2 = wrap_adjust(lon_dir, lon_break, pts[k].lon());
            if lat1 == lat2 && lon1 == lon2 {
                continue; // degenerated edge
            }
            // perpendicular projection of the point onto the edge
            let s = ((lat0 - lat1) * (lat2 - lat1) + (lon0 - lon1) * (lon2 - lon1))
                / ((lat2 - lat1) * (lat2 - lat1) + (lon2 - lon1) * (lon2 - lon1));
            if !(s > 0.0 && s < 1.0) {
                continue;
            }
            let dist = spheroid_distance(
                lat0,
                lon0,
                lat1 + s * (lat2 - lat1),
                lon1 + s * (lon2 - lon1),
            );
            if dist < min_dist {
                min_dist = dist;
            }
        }
    }
    min_dist
}

/// Estimate the distance between a point and a box.
///
/// The estimate is a lower bound: it is never larger than the distance to
/// any point inside the box, which is what the index traversal needs. It
/// may be considerably smaller; boxes spanning more than 180 longitude
/// degrees fall back to zero.
pub fn estimate_point_bbox_distance(point: &Point, bbox: &Bbox) -> f64 {
    if bbox.is_empty() {
        return f64::INFINITY;
    }
    if bbox.contains(point) {
        return 0.0;
    }
    let mut dlon = bbox.lon_max() - bbox.lon_min();
    if dlon < 0.0 {
        dlon += 360.0; // 180th meridian crossed
    }
    if dlon > 180.0 {
        return 0.0; // safe fall-back
    }
    // half of the distance along the meridian, and the full distance
    // between the southern corners; the larger of the two bounds the error
    // of measuring to a corner instead of the nearest box point
    let h = spheroid_distance(bbox.lat_min(), 0.0, bbox.lat_max(), 0.0) / 2.0;
    let mut d = spheroid_distance(bbox.lat_min(), 0.0, bbox.lat_min(), dlon);
    if h > d {
        d = h;
    }
    let mut min_dist =
        spheroid_distance(point.lat(), point.lon(), bbox.lat_min(), bbox.lon_min()) - d;
    if min_dist <= 0.0 {
        return 0.0;
    }
    let cur_dist = spheroid_distance(point.lat(), point.lon(), bbox.lat_min(), bbox.lon_max()) - d;
    if cur_dist <= 0.0 {
        return 0.0;
    }
    if cur_dist < min_dist {
        min_dist = cur_dist;
    }
    // the same with the northern corners
    let mut d = spheroid_distance(bbox.lat_max(), 0.0, bbox.lat_max(), dlon);
    if h > d {
        d = h;
    }
    let cur_dist = spheroid_distance(point.lat(), point.lon(), bbox.lat_max(), bbox.lon_max()) - d;
    if cur_dist <= 0.0 {
        return 0.0;
    }
    if cur_dist < min_dist {
        min_dist = cur_dist;
    }
    let cur_dist = spheroid_distance(point.lat(), point.lon(), bbox.lat_max(), bbox.lon_min()) - d;
    if cur_dist <= 0.0 {
        return 0.0;
    }
    if cur_dist < min_dist {
        min_dist = cur_dist;
    }
    min_dist
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::EntryKind;

    fn pt(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn reversal_symmetry_is_exact() {
        let pairs = [
            ((53.55, 10.0), (53.35, -6.26)),
            ((0.0, 0.0), (0.0, 180.0)),
            ((12.3, 45.6), (-12.9, -134.0)),
            ((89.9, 17.0), (-89.9, -163.0)),
            ((10.0, 20.0), (-10.0, -160.0)),
            ((47.1, -122.3), (47.2, -122.4)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            assert_eq!(
                spheroid_distance(lat1, lon1, lat2, lon2),
                spheroid_distance(lat2, lon2, lat1, lon1),
            );
        }
    }

    #[test]
    fn result_stays_within_bounds() {
        for lat1 in [-90.0, -45.0, 0.0, 30.0, 90.0] {
            for lon1 in [-180.0, -90.0, 0.0, 90.0, 180.0] {
                for lat2 in [-90.0, -60.0, 0.0, 60.0, 90.0] {
                    for lon2 in [-180.0, -120.0, 0.0, 120.0, 180.0] {
                        let d = spheroid_distance(lat1, lon1, lat2, lon2);
                        assert!((0.0..=MAXDIST).contains(&d));
                    }
                }
            }
        }
    }

    #[test]
    fn antipodal_distance_is_maximal() {
        let d = spheroid_distance(0.0, 0.0, 0.0, 180.0);
        assert_eq!(d, MAXDIST);
        assert_eq!(d, spheroid_distance(0.0, 180.0, 0.0, 0.0));
    }

    #[test]
    fn one_degree_along_equator() {
        let d = spheroid_distance(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(d, 111_319.0, max_relative = 1e-3);
    }

    #[test]
    fn pole_to_pole() {
        let d = spheroid_distance(90.0, 0.0, -90.0, 0.0);
        assert_relative_eq!(d, MAXDIST, max_relative = 1e-3);
    }

    #[test]
    fn tiny_displacement_changes_result_smoothly() {
        let base = spheroid_distance(10.0, 20.0, 30.0, 40.0);
        let moved = spheroid_distance(10.0, 20.0 + 1e-9, 30.0, 40.0);
        assert!((base - moved).abs() < 1e-3);
    }

    #[test]
    fn crossfade_band_is_monotone() {
        // walk along the equator through both fade limits up to the antipode
        let mut previous = 0.0;
        for step in 0..=1800 {
            let lon = f64::from(step) * 0.1;
            let d = spheroid_distance(0.0, 0.0, 0.0, lon);
            assert!(d >= previous, "distance shrank at lon {lon}");
            previous = d;
        }
    }

    #[test]
    fn point_to_circle_clamps_at_zero() {
        let circle = Circle::new(0.0, 0.0, 200_000.0).unwrap();
        assert_eq!(pt(0.0, 1.0).distance(&circle), 0.0);
        let far = pt(0.0, 10.0);
        let expected = far.distance(&pt(0.0, 0.0)) - 200_000.0;
        assert_eq!(far.distance(&circle), expected);
        assert_eq!(circle.distance(&far), expected);
    }

    #[test]
    fn distance_to_empty_circle_is_infinite() {
        let empty = Circle::new(0.0, 0.0, -1.0).unwrap();
        assert_eq!(pt(0.0, 0.0).distance(&empty), f64::INFINITY);
    }

    #[test]
    fn whole_earth_circle_is_everywhere() {
        let all = Circle::new(0.0, 0.0, f64::INFINITY).unwrap();
        assert_eq!(pt(-45.0, 100.0).distance(&all), 0.0);
    }

    #[test]
    fn point_to_cluster_uses_edge_projection() {
        let square = Cluster::new(vec![(
            EntryKind::Polygon,
            vec![pt(0.0, 0.0), pt(0.0, 10.0), pt(10.0, 10.0), pt(10.0, 0.0)],
        )])
        .unwrap();
        // due east of the square: the projection onto the eastern edge is
        // closer than any vertex
        let query = pt(5.0, 20.0);
        assert_eq!(
            query.distance(&square),
            spheroid_distance(5.0, 20.0, 5.0, 10.0)
        );
        assert_eq!(square.distance(&query), query.distance(&square));
    }

    #[test]
    fn point_inside_cluster_has_distance_zero() {
        let square = Cluster::new(vec![(
            EntryKind::Polygon,
            vec![pt(0.0, 0.0), pt(0.0, 10.0), pt(10.0, 10.0), pt(10.0, 0.0)],
        )])
        .unwrap();
        assert_eq!(pt(5.0, 5.0).distance(&square), 0.0);
    }

    #[test]
    fn path_does_not_close_its_last_edge() {
        // an L-shaped path; the closing edge would pass right through the
        // query point
        let path = Cluster::new(vec![(
            EntryKind::Path,
            vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)],
        )])
        .unwrap();
        let outline = Cluster::new(vec![(
            EntryKind::Outline,
            vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)],
        )])
        .unwrap();
        let query = pt(5.0, 5.0);
        assert!(path.distance(&query) > 0.0);
        assert_eq!(outline.distance(&query), 0.0);
    }

    #[test]
    fn distance_across_the_dateline_is_short() {
        let strip = Cluster::new(vec![(
            EntryKind::Polygon,
            vec![
                pt(-5.0, 175.0),
                pt(-5.0, -175.0),
                pt(5.0, -175.0),
                pt(5.0, 175.0),
            ],
        )])
        .unwrap();
        let query = pt(0.0, -170.0);
        let d = query.distance(&strip);
        assert!(d > 0.0);
        assert!(d < 600_000.0, "wrap-around was not applied: {d}");
    }

    #[test]
    fn bbox_estimate_is_a_lower_bound_on_corner_distances() {
        let bbox = Bbox::new(10.0, 20.0, 30.0, 50.0).unwrap();
        let query = pt(-40.0, -60.0);
        let estimate = estimate_point_bbox_distance(&query, &bbox);
        for (lat, lon) in [(10.0, 30.0), (10.0, 50.0), (20.0, 30.0), (20.0, 50.0)] {
            assert!(estimate <= spheroid_distance(query.lat(), query.lon(), lat, lon));
        }
    }

    #[test]
    fn bbox_estimate_special_cases() {
        assert_eq!(
            estimate_point_bbox_distance(&pt(0.0, 0.0), &Bbox::empty()),
            f64::INFINITY
        );
        let inside = Bbox::new(-10.0, 10.0, -10.0, 10.0).unwrap();
        assert_eq!(estimate_point_bbox_distance(&pt(0.0, 0.0), &inside), 0.0);
        let wide = Bbox::new(-10.0, 10.0, -170.0, 20.0).unwrap();
        assert_eq!(estimate_point_bbox_distance(&pt(80.0, 0.0), &wide), 0.0);
    }

    #[test]
    fn radial_search_reaches_high_latitudes() {
        // a 10,000 km radius around the equator covers latitude 89 but the
        // answer is decided by the geodesic, not by flat math
        let d = spheroid_distance(0.0, 0.0, 89.0, 0.5);
        assert!(d < 10_000_000.0);
        let d = spheroid_distance(0.0, 0.0, 89.999, 0.5);
        assert!(d > 9_900_000.0);
    }
}
