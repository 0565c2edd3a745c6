use crate::algorithm::distance::{point_cluster_distance, spheroid_distance};
use crate::algorithm::wrap_frame;
use crate::geometry::round_coord;
use crate::{Bbox, Circle, Cluster, EntryKind, Point};

/// Checks whether two geographic values share at least one location.
///
/// This is the `&&` operator at the query level. All pairings treat their
/// boundaries as part of the value, so touching values overlap. Longitude
/// wrap-around at the 180th meridian is handled throughout.
///
/// # Examples
///
/// ```
/// use geodex::prelude::*;
/// use geodex::{Circle, Point};
///
/// let search = Circle::new(53.55, 10.0, 150_000.0)?;
/// assert!(search.overlaps(&Point::new(53.87, 8.7)?));
/// assert!(!search.overlaps(&Point::new(52.52, 13.4)?));
/// # Ok::<(), geodex::Error>(())
/// ```
pub trait Overlaps<Rhs = Self> {
    /// Checks whether two geographic values share at least one location.
    fn overlaps(&self, rhs: &Rhs) -> bool;
}

impl Overlaps<Bbox> for Point {
    fn overlaps(&self, rhs: &Bbox) -> bool {
        rhs.contains(self)
    }
}

impl Overlaps for Bbox {
    fn overlaps(&self, other: &Bbox) -> bool {
        other.lat_max() >= other.lat_min() // other box is not empty
            && (other.lat_min() >= self.lat_min() || other.lat_max() >= self.lat_min())
            && (other.lat_min() <= self.lat_max() || other.lat_max() <= self.lat_max())
            && match (self.crosses_dateline(), other.crosses_dateline()) {
                // both boxes contain the 180th meridian
                (true, true) => true,
                (true, false) => lon_overlap_one_crossing(self, other),
                (false, true) => lon_overlap_one_crossing(other, self),
                (false, false) => {
                    ((other.lon_min() >= self.lon_min() || other.lon_max() >= self.lon_min())
                        && (other.lon_min() <= self.lon_max()
                            || other.lon_max() <= self.lon_max()))
                        // W180 and E180 denote the same meridian
                        || (self.lon_min() == -180.0 && other.lon_max() == 180.0)
                        || (other.lon_min() == -180.0 && self.lon_max() == 180.0)
                }
            }
    }
}

// Longitude overlap when exactly `crossing` straddles the 180th meridian:
// the plain box must begin before the eastern end or end after the western
// start of the crossing one.
fn lon_overlap_one_crossing(crossing: &Bbox, plain: &Bbox) -> bool {
    plain.lon_min() >= crossing.lon_min()
        || plain.lon_max() >= crossing.lon_min()
        || plain.lon_min() <= crossing.lon_max()
        || plain.lon_max() <= crossing.lon_max()
}

impl Overlaps<Circle> for Point {
    fn overlaps(&self, rhs: &Circle) -> bool {
        spheroid_distance(self.lat(), self.lon(), rhs.center().lat(), rhs.center().lon())
            <= rhs.radius()
    }
}

impl Overlaps for Circle {
    fn overlaps(&self, other: &Circle) -> bool {
        spheroid_distance(
            self.center().lat(),
            self.center().lon(),
            other.center().lat(),
            other.center().lon(),
        ) <= self.radius() + other.radius()
    }
}

impl Overlaps<Cluster> for Point {
    fn overlaps(&self, rhs: &Cluster) -> bool {
        point_in_cluster(self, rhs)
    }
}

impl Overlaps<Cluster> for Circle {
    fn overlaps(&self, rhs: &Cluster) -> bool {
        point_cluster_distance(&self.center(), rhs) <= self.radius()
    }
}

macro_rules! symmetric_overlaps_impl {
    ($t:ty, $rhs:ty) => {
        impl Overlaps<$rhs> for $t {
            fn overlaps(&self, rhs: &$rhs) -> bool {
                rhs.overlaps(self)
            }
        }
    };
}

symmetric_overlaps_impl!(Bbox, Point);
symmetric_overlaps_impl!(Circle, Point);
symmetric_overlaps_impl!(Cluster, Point);
symmetric_overlaps_impl!(Cluster, Circle);

/// Ray-casting membership test: casts a ray eastward along the point's
/// parallel and counts polygon edge crossings.
///
/// Vertices and edges of every entry kind belong to the cluster; interior
/// membership exists only for polygons and follows the even-odd rule. Each
/// entry is evaluated in the wrap frame of its first vertex, so entries may
/// straddle the 180th meridian.
pub(crate) fn point_in_cluster(point: &Point, cluster: &Cluster) -> bool {
    // points outside the bounding circle are never members; keeping this
    // reject exact is necessary for consistent table and index scans
    let bounding = cluster.bounding();
    if spheroid_distance(
        point.lat(),
        point.lon(),
        bounding.center().lat(),
        bounding.center().lon(),
    ) > bounding.radius()
    {
        return false;
    }
    let lat0 = point.lat();
    let mut counter = 0u32;
    for entry in cluster.entries() {
        let pts = entry.points();
        let (lon_dir, lon_break) = wrap_frame(pts[0].lon());
        // longitude of the point in the wrap frame of this entry
        let mut lon0 = point.lon();
        if lon_dir < 0 && lon0 > lon_break {
            lon0 = round_coord(lon0 - 360.0);
        } else if lon_dir > 0 && lon0 < lon_break {
            lon0 = round_coord(lon0 + 360.0);
        }
        for j in 0..pts.len() {
            // on a vertex
            if *point == pts[j] {
                return true;
            }
            let k = (j + 1) % pts.len();
            // the last edge only exists for closed entries
            if k == 0 && !entry.is_closed() {
                continue;
            }
            let (lat1, lat2) = (pts[j].lat(), pts[k].lat());
            let mut lon1 = pts[j].lon();
            let mut lon2 = pts[k].lon();
            if lon_dir < 0 && lon1 > lon_break {
                lon1 = round_coord(lon1 - 360.0);
            } else if lon_dir > 0 && lon1 < lon_break {
                lon1 = round_coord(lon1 + 360.0);
            }
            if lon_dir < 0 && lon2 > lon_break {
                lon2 = round_coord(lon2 - 360.0);
            } else if lon_dir > 0 && lon2 < lon_break {
                lon2 = round_coord(lon2 + 360.0);
            }
            // on a west-east horizontal edge
            if lat0 == lat1
                && lat0 == lat2
                && ((lon0 >= lon1 && lon0 <= lon2) || (lon0 >= lon2 && lon0 <= lon1))
            {
                return true;
            }
            // the edge crosses the parallel of the point (half-open
            // latitude interval, so shared vertices count once)
            if (lat1 < lat0 && lat2 >= lat0) || (lat2 < lat0 && lat1 >= lat0) {
                let lon = (lon1 * (lat2 - lat0) + lon2 * (lat0 - lat1)) / (lat2 - lat1);
                if round_coord(lon) == lon0 {
                    return true;
                }
                if entry.kind() == EntryKind::Polygon && lon > lon0 {
                    counter += 1;
                }
            }
        }
    }
    counter % 2 == 1
}
