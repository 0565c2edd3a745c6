use std::f64::consts::SQRT_2;

use crate::algorithm::estimate_point_bbox_distance;
use crate::{Bbox, Circle, Point, DIAMETER};

/// Reference radius for the logarithmic object size of an [`AreaKey`]:
/// one third of the spheroid's mean diameter. Each object-size step divides
/// the represented radius by the square root of two.
pub const REF_OBJSIZE: f64 = DIAMETER / 3.0;

// Safety margin against floating point errors in the distance estimation,
// slightly greater than 1.
const FPE_SAFETY: f64 = 1.0 + 1e-14;

// Bytes holding interleaved latitude/longitude bits in both key layouts.
const LATLON_BYTES: usize = 7;

// High bit of the depth byte distinguishes area keys from point keys.
const TYPE_MASK: u8 = 0x80;

// Object size sentinels: a key matching only empty objects, and a key
// matching everything including empty objects.
const OBJSIZE_EMPTY: u8 = 126;
const OBJSIZE_UNIVERSAL: u8 = 127;

/// Index key for points (objects with zero extent) on the spheroid.
///
/// Byte layout: bits 0..55 hold interleaved latitude and longitude bits
/// (latitude at even stream positions), the final byte holds the node
/// depth, 0 to 56. A key of depth `d` addresses the subdivision cell whose
/// first `d` interleaved bits match; bits beyond the depth are zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PointKey([u8; LATLON_BYTES + 1]);

/// Index key for objects with positive extent on the spheroid.
///
/// Byte layout: bits 0..55 hold interleaved latitude/longitude bits of the
/// object's **center**, byte 7 holds the type bit (always set) and the node
/// depth, 0 to 113, byte 8 the logarithmic object size, 0 to 57, or one of
/// the two sentinels ([`AreaKey::empty`], [`AreaKey::universal`]).
///
/// The depth counts positions of a virtual interleaved stream `S L S L …`
/// where even positions are object-size bits (the bit at size position `j`
/// is set iff `objsize <= j`) and odd positions are the latitude/longitude
/// bits. Each level therefore halves either the spatial extent or the
/// maximum represented radius.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AreaKey([u8; LATLON_BYTES + 2]);

fn latlon_bit(buf: &[u8], n: usize) -> bool {
    buf[n / 8] & (0x80 >> (n % 8)) != 0
}

fn set_latlon_bit(buf: &mut [u8], n: usize) {
    buf[n / 8] |= 0x80 >> (n % 8);
}

// Walk the latitude/longitude bits of a key and return the enclosing
// rectangle of the addressed cell. Coordinates are exact binary fractions
// of the initial 90/180 degree spans and are deliberately not rounded.
fn latlon_box(buf: &[u8], nbits: usize) -> Bbox {
    let mut lat = 0.0;
    let mut lon = 0.0;
    let mut dlat = 90.0;
    let mut dlon = 180.0;
    for i in 0..nbits {
        if i % 2 == 0 {
            dlat /= 2.0;
            if latlon_bit(buf, i) {
                lat += dlat;
            } else {
                lat -= dlat;
            }
        } else {
            dlon /= 2.0;
            if latlon_bit(buf, i) {
                lon += dlon;
            } else {
                lon -= dlon;
            }
        }
    }
    Bbox::raw(lat - dlat, lat + dlat, lon - dlon, lon + dlon)
}

fn estimate_from_bounds(bbox: &Bbox, max_radius: f64, point: &Point) -> f64 {
    // the estimator below is itself a lower bound; the safety factor
    // absorbs floating point error in both directions
    let distance =
        estimate_point_bbox_distance(point, bbox) / FPE_SAFETY - max_radius * FPE_SAFETY;
    if distance <= 0.0 {
        0.0
    } else {
        distance
    }
}

impl PointKey {
    /// Maximum node depth of a point key.
    pub const MAX_DEPTH: u8 = (LATLON_BYTES * 8) as u8;

    /// Returns the node depth: the number of significant interleaved bits.
    #[inline]
    pub fn depth(&self) -> u8 {
        self.0[LATLON_BYTES] & (TYPE_MASK - 1)
    }

    /// Checks if one key addresses a subtree of the other (or vice versa).
    pub fn overlaps(&self, other: &Self) -> bool {
        let depth = self.depth().min(other.depth()) as usize;
        for i in 0..depth {
            if latlon_bit(&self.0, i) != latlon_bit(&other.0, i) {
                return false;
            }
        }
        true
    }

    /// Combines two keys into the longest-common-prefix key covering both.
    pub fn unite(&self, other: &Self) -> Self {
        let depth = self.depth().min(other.depth()) as usize;
        let mut buf = [0u8; LATLON_BYTES + 1];
        let mut i = 0;
        while i < depth {
            match (latlon_bit(&self.0, i), latlon_bit(&other.0, i)) {
                (true, true) => set_latlon_bit(&mut buf, i),
                (false, false) => {}
                _ => break,
            }
            i += 1;
        }
        buf[LATLON_BYTES] = i as u8;
        PointKey(buf)
    }

    /// Returns the enclosing rectangle of the addressed cell and the
    /// maximum radius of objects under this key, which is always zero for
    /// point keys.
    pub fn bounds(&self) -> (Bbox, f64) {
        (latlon_box(&self.0, self.depth() as usize), 0.0)
    }

    /// Estimates the distance between the point and any point that can
    /// hash to this key. Never larger than the true minimum.
    pub fn estimate_distance(&self, point: &Point) -> f64 {
        let (bbox, max_radius) = self.bounds();
        estimate_from_bounds(&bbox, max_radius, point)
    }

    // The pivot for splitting this key's subtree: the same prefix one bit
    // deeper (with that bit zero).
    pub(crate) fn split_pivot(&self) -> Self {
        let mut buf = self.0;
        buf[LATLON_BYTES] += 1;
        PointKey(buf)
    }
}

impl From<Point> for PointKey {
    /// Encodes a point as a maximum-depth key by iteratively bisecting the
    /// latitude/longitude rectangle.
    fn from(point: Point) -> Self {
        let mut buf = [0u8; LATLON_BYTES + 1];
        let mut lat = point.lat();
        let mut lon = point.lon();
        for i in 0..(Self::MAX_DEPTH as usize / 2) {
            if lat >= 0.0 {
                buf[i / 4] |= 0x80 >> (2 * (i % 4));
                lat = lat * 2.0 - 90.0;
            } else {
                lat = lat * 2.0 + 90.0;
            }
            if lon >= 0.0 {
                buf[i / 4] |= 0x80 >> (2 * (i % 4) + 1);
                lon = lon * 2.0 - 180.0;
            } else {
                lon = lon * 2.0 + 180.0;
            }
        }
        buf[LATLON_BYTES] = Self::MAX_DEPTH;
        PointKey(buf)
    }
}

impl AreaKey {
    /// Maximum node depth of an area key.
    pub const MAX_DEPTH: u8 = 2 * PointKey::MAX_DEPTH + 1;

    /// Maximum logarithmic object size.
    pub const MAX_OBJSIZE: u8 = PointKey::MAX_DEPTH + 1;

    /// The key matching empty objects only.
    ///
    /// Its node depth is the maximum, which the split routine relies on.
    pub fn empty() -> Self {
        let mut buf = [0u8; LATLON_BYTES + 2];
        buf[LATLON_BYTES] = TYPE_MASK | Self::MAX_DEPTH;
        buf[LATLON_BYTES + 1] = OBJSIZE_EMPTY;
        AreaKey(buf)
    }

    /// The key matching any object, including empty ones.
    pub fn universal() -> Self {
        let mut buf = [0u8; LATLON_BYTES + 2];
        buf[LATLON_BYTES] = TYPE_MASK;
        buf[LATLON_BYTES + 1] = OBJSIZE_UNIVERSAL;
        AreaKey(buf)
    }

    /// Returns `true` for the sentinel key matching empty objects only.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[LATLON_BYTES + 1] == OBJSIZE_EMPTY
    }

    /// Returns `true` for the sentinel key matching every object.
    #[inline]
    pub fn is_universal(&self) -> bool {
        self.0[LATLON_BYTES + 1] == OBJSIZE_UNIVERSAL
    }

    /// Returns the node depth: the number of significant positions of the
    /// interleaved size/latitude/longitude stream.
    #[inline]
    pub fn depth(&self) -> u8 {
        self.0[LATLON_BYTES] & (TYPE_MASK - 1)
    }

    /// Returns the logarithmic object size field.
    #[inline]
    pub fn objsize(&self) -> u8 {
        self.0[LATLON_BYTES + 1]
    }

    /// Checks if one key addresses a subtree of the other (or vice versa).
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_universal() || other.is_universal() {
            return true;
        }
        if self.is_empty() || other.is_empty() {
            return self.objsize() == other.objsize();
        }
        let depth = self.depth().min(other.depth()) as usize;
        let objsize1 = self.objsize() as usize;
        let objsize2 = other.objsize() as usize;
        let mut j = 0; // position in the object size bit stream
        let mut k = 0; // position in the latitude/longitude bit stream
        for i in 0..depth {
            if i % 2 == 0 {
                // the size bit at position j is set iff objsize <= j
                if (objsize1 <= j) != (objsize2 <= j) {
                    return false;
                }
                j += 1;
            } else {
                if latlon_bit(&self.0, k) != latlon_bit(&other.0, k) {
                    return false;
                }
                k += 1;
            }
        }
        true
    }

    /// Combines two keys into the longest-common-prefix key covering both.
    ///
    /// Uniting an empty with a non-empty key yields the universal key; two
    /// empty keys stay empty.
    pub fn unite(&self, other: &Self) -> Self {
        let objsize1 = self.objsize();
        let objsize2 = other.objsize();
        if objsize1 > Self::MAX_OBJSIZE || objsize2 > Self::MAX_OBJSIZE {
            return if objsize1 == OBJSIZE_EMPTY && objsize2 == OBJSIZE_EMPTY {
                Self::empty()
            } else {
                Self::universal()
            };
        }
        let depth = self.depth().min(other.depth()) as usize;
        let (objsize1, objsize2) = (objsize1 as usize, objsize2 as usize);
        let mut buf = [0u8; LATLON_BYTES + 2];
        let mut j = 0;
        let mut k = 0;
        let mut i = 0;
        while i < depth {
            if i % 2 == 0 {
                j += 1;
                if objsize1 >= j && objsize2 >= j {
                    // size bit unset in both keys so far: the minimum index
                    // with a set bit is at least j
                    buf[LATLON_BYTES + 1] = j as u8;
                } else if objsize1 >= j || objsize2 >= j {
                    break; // size bit set in one key only
                }
            } else {
                match (latlon_bit(&self.0, k), latlon_bit(&other.0, k)) {
                    (true, true) => set_latlon_bit(&mut buf, k),
                    (false, false) => {}
                    _ => break,
                }
                k += 1;
            }
            i += 1;
        }
        buf[LATLON_BYTES] = TYPE_MASK | i as u8;
        AreaKey(buf)
    }

    /// Returns the enclosing rectangle of the addressed **center** cell and
    /// the maximum radius of objects under this key (infinite when the
    /// object size field is zero).
    pub fn bounds(&self) -> (Bbox, f64) {
        match self.objsize() {
            OBJSIZE_EMPTY => (Bbox::empty(), 0.0),
            OBJSIZE_UNIVERSAL => (Bbox::raw(-90.0, 90.0, -180.0, 180.0), 0.0),
            0 => (latlon_box(&self.0, self.depth() as usize / 2), f64::INFINITY),
            objsize => {
                let mut radius = REF_OBJSIZE;
                for _ in 1..objsize {
                    radius /= SQRT_2;
                }
                (latlon_box(&self.0, self.depth() as usize / 2), radius)
            }
        }
    }

    /// Estimates the distance between the point and any object that can
    /// hash to this key. Never larger than the true minimum.
    pub fn estimate_distance(&self, point: &Point) -> f64 {
        let (bbox, max_radius) = self.bounds();
        estimate_from_bounds(&bbox, max_radius, point)
    }

    // The pivot for splitting this key's subtree: one stream position
    // deeper, except that the universal key splits into empty versus
    // non-empty objects.
    pub(crate) fn split_pivot(&self) -> Self {
        if self.is_universal() {
            return Self::empty();
        }
        let mut buf = self.0;
        buf[LATLON_BYTES] += 1; // type bit conserved, depth below maximum
        AreaKey(buf)
    }
}

impl From<Circle> for AreaKey {
    /// Encodes a circle: center bits as for a point key, the radius mapped
    /// to the logarithmic object size. Empty circles produce the
    /// [`AreaKey::empty`] sentinel.
    fn from(circle: Circle) -> Self {
        if circle.radius() < 0.0 {
            return Self::empty();
        }
        let center = PointKey::from(circle.center());
        let mut buf = [0u8; LATLON_BYTES + 2];
        buf[..LATLON_BYTES].copy_from_slice(&center.0[..LATLON_BYTES]);
        buf[LATLON_BYTES] = TYPE_MASK | Self::MAX_DEPTH;
        // treat equal values as greater for numerical safety
        buf[LATLON_BYTES + 1] = if circle.radius() >= REF_OBJSIZE {
            0
        } else {
            let mut reference = REF_OBJSIZE / SQRT_2;
            let mut objsize = 1;
            while objsize < Self::MAX_OBJSIZE {
                if circle.radius() >= reference {
                    break;
                }
                reference /= SQRT_2;
                objsize += 1;
            }
            objsize
        };
        AreaKey(buf)
    }
}

/// Either kind of index key. One index column stores keys of one kind only;
/// mixing kinds is a host contract violation and panics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexKey {
    Point(PointKey),
    Area(AreaKey),
}

impl IndexKey {
    /// Returns the node depth of the key.
    pub fn depth(&self) -> u8 {
        match self {
            IndexKey::Point(key) => key.depth(),
            IndexKey::Area(key) => key.depth(),
        }
    }

    /// Returns the maximum node depth for this key kind.
    pub fn max_depth(&self) -> u8 {
        match self {
            IndexKey::Point(_) => PointKey::MAX_DEPTH,
            IndexKey::Area(_) => AreaKey::MAX_DEPTH,
        }
    }

    /// Checks if one key addresses a subtree of the other (or vice versa).
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (IndexKey::Point(a), IndexKey::Point(b)) => a.overlaps(b),
            (IndexKey::Area(a), IndexKey::Area(b)) => a.overlaps(b),
            _ => panic!("point key and area key in one index"),
        }
    }

    /// Combines two keys into the longest-common-prefix key covering both.
    pub fn unite(&self, other: &Self) -> Self {
        match (self, other) {
            (IndexKey::Point(a), IndexKey::Point(b)) => IndexKey::Point(a.unite(b)),
            (IndexKey::Area(a), IndexKey::Area(b)) => IndexKey::Area(a.unite(b)),
            _ => panic!("point key and area key in one index"),
        }
    }

    /// Returns the enclosing rectangle of the addressed cell and the
    /// maximum radius of objects under this key.
    pub fn bounds(&self) -> (Bbox, f64) {
        match self {
            IndexKey::Point(key) => key.bounds(),
            IndexKey::Area(key) => key.bounds(),
        }
    }

    /// Estimates the distance between the point and any object that can
    /// hash to this key. Never larger than the true minimum.
    pub fn estimate_distance(&self, point: &Point) -> f64 {
        match self {
            IndexKey::Point(key) => key.estimate_distance(point),
            IndexKey::Area(key) => key.estimate_distance(point),
        }
    }

    pub(crate) fn split_pivot(&self) -> Self {
        match self {
            IndexKey::Point(key) => IndexKey::Point(key.split_pivot()),
            IndexKey::Area(key) => IndexKey::Area(key.split_pivot()),
        }
    }

    pub(crate) fn is_empty_area(&self) -> bool {
        matches!(self, IndexKey::Area(key) if key.is_empty())
    }

    pub(crate) fn is_universal_area(&self) -> bool {
        matches!(self, IndexKey::Area(key) if key.is_universal())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::spheroid_distance;

    fn pt(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn point_key_cell_contains_its_point() {
        for point in [
            pt(0.0, 0.0),
            pt(45.0, 90.0),
            pt(-33.9, 151.2),
            pt(89.999, -179.999),
            pt(-90.0, 180.0),
        ] {
            let key = PointKey::from(point);
            assert_eq!(key.depth(), PointKey::MAX_DEPTH);
            let (bbox, max_radius) = key.bounds();
            assert!(bbox.contains(&point), "cell of {point} misses it");
            assert_eq!(max_radius, 0.0);
        }
    }

    #[test]
    fn point_key_prefixes_nest() {
        let a = PointKey::from(pt(10.0, 10.0));
        let b = PointKey::from(pt(10.000001, 10.000001));
        let union = a.unite(&b);
        assert!(union.depth() < PointKey::MAX_DEPTH);
        assert!(union.depth() > 0);
        assert!(union.overlaps(&a));
        assert!(union.overlaps(&b));
        let (bbox, _) = union.bounds();
        assert!(bbox.contains(&pt(10.0, 10.0)));
        assert!(bbox.contains(&pt(10.000001, 10.000001)));
    }

    #[test]
    fn point_keys_in_different_hemispheres_are_disjoint() {
        let north = PointKey::from(pt(45.0, 10.0));
        let south = PointKey::from(pt(-45.0, 10.0));
        assert!(!north.overlaps(&south));
        let union = north.unite(&south);
        assert_eq!(union.depth(), 0);
        let (bbox, _) = union.bounds();
        assert_eq!((bbox.lat_min(), bbox.lat_max()), (-90.0, 90.0));
        assert_eq!((bbox.lon_min(), bbox.lon_max()), (-180.0, 180.0));
    }

    #[test]
    fn unite_is_idempotent_and_commutative() {
        let a = PointKey::from(pt(12.3, -45.6));
        let b = PointKey::from(pt(-7.0, 100.0));
        assert_eq!(a.unite(&a), a);
        assert_eq!(a.unite(&b), b.unite(&a));
        let c = AreaKey::from(Circle::new(12.3, -45.6, 1000.0).unwrap());
        let d = AreaKey::from(Circle::new(12.3, -45.6, 2_000_000.0).unwrap());
        assert_eq!(c.unite(&c), c);
        assert_eq!(c.unite(&d), d.unite(&c));
        assert!(c.unite(&d).overlaps(&c));
        assert!(c.unite(&d).overlaps(&d));
    }

    #[test]
    fn half_reference_radius_has_objsize_two() {
        let key = AreaKey::from(Circle::new(0.0, 0.0, REF_OBJSIZE / 2.0).unwrap());
        assert_eq!(key.objsize(), 2);
        assert!(AreaKey::universal().overlaps(&key));
        assert!(key.overlaps(&AreaKey::universal()));
        assert!(!AreaKey::empty().overlaps(&key));
        assert!(!key.overlaps(&AreaKey::empty()));
    }

    #[test]
    fn objsize_thresholds() {
        let at = |radius: f64| AreaKey::from(Circle::new(0.0, 0.0, radius).unwrap()).objsize();
        assert_eq!(at(REF_OBJSIZE), 0);
        assert_eq!(at(REF_OBJSIZE * 2.0), 0);
        assert_eq!(at(f64::INFINITY), 0);
        assert_eq!(at(REF_OBJSIZE / SQRT_2), 1);
        assert_eq!(at(0.0), AreaKey::MAX_OBJSIZE);
        assert_eq!(at(1e-12), AreaKey::MAX_OBJSIZE);
    }

    #[test]
    fn sentinel_keys_behave() {
        let empty = AreaKey::empty();
        let universal = AreaKey::universal();
        assert!(empty.overlaps(&empty));
        assert!(universal.overlaps(&empty));
        assert!(empty.overlaps(&universal));
        assert_eq!(empty.depth(), AreaKey::MAX_DEPTH);
        assert_eq!(universal.depth(), 0);
        let circle_key = AreaKey::from(Circle::new(0.0, 0.0, -1.0).unwrap());
        assert!(circle_key.is_empty());
    }

    #[test]
    fn sentinel_unions() {
        let empty = AreaKey::empty();
        let normal = AreaKey::from(Circle::new(10.0, 10.0, 500.0).unwrap());
        assert_eq!(empty.unite(&empty), AreaKey::empty());
        assert!(empty.unite(&normal).is_universal());
        assert!(normal.unite(&empty).is_universal());
        assert!(AreaKey::universal().unite(&normal).is_universal());
    }

    #[test]
    fn area_key_bounds_track_objsize() {
        let key = AreaKey::from(Circle::new(0.0, 0.0, REF_OBJSIZE).unwrap());
        let (_, radius) = key.bounds();
        assert_eq!(radius, f64::INFINITY);
        let key = AreaKey::from(Circle::new(0.0, 0.0, REF_OBJSIZE / 2.0).unwrap());
        let (bbox, radius) = key.bounds();
        assert_relative_eq!(radius, REF_OBJSIZE / SQRT_2);
        assert!(bbox.contains(&pt(0.0, 0.0)));
    }

    #[test]
    fn estimates_of_sentinels() {
        let query = pt(30.0, 40.0);
        assert_eq!(AreaKey::universal().estimate_distance(&query), 0.0);
        assert_eq!(AreaKey::empty().estimate_distance(&query), f64::INFINITY);
    }

    #[test]
    fn estimate_never_exceeds_true_distance() {
        let queries = [pt(0.0, 0.0), pt(50.0, -120.0), pt(-80.0, 20.0)];
        let stored = [
            pt(10.0, 10.0),
            pt(-45.0, 170.0),
            pt(89.0, 0.0),
            pt(0.1, -0.1),
        ];
        for q in &queries {
            for s in &stored {
                let key = PointKey::from(*s);
                let truth = spheroid_distance(q.lat(), q.lon(), s.lat(), s.lon());
                assert!(
                    key.estimate_distance(q) <= truth,
                    "estimate exceeds distance for {q} to {s}"
                );
                // the same must hold for every ancestor key
                let mut shallow = key;
                shallow.0[LATLON_BYTES] = 20;
                assert!(shallow.estimate_distance(q) <= truth);
            }
        }
    }

    #[test]
    fn estimate_at_own_point_is_zero() {
        let point = pt(33.0, -110.0);
        let key = PointKey::from(point);
        assert_eq!(key.estimate_distance(&point), 0.0);
    }

    #[test]
    fn circle_estimate_accounts_for_radius() {
        let circle = Circle::new(0.0, 0.0, 500_000.0).unwrap();
        let key = AreaKey::from(circle);
        let query = pt(0.0, 30.0);
        let truth = spheroid_distance(0.0, 30.0, 0.0, 0.0) - 500_000.0;
        assert!(key.estimate_distance(&query) <= truth);
        assert!(key.estimate_distance(&query) > 0.0);
    }

    #[test]
    fn split_pivot_descends_one_level() {
        let key = PointKey::from(pt(10.0, 10.0));
        let union = key.unite(&PointKey::from(pt(10.1, 10.1)));
        let pivot = union.split_pivot();
        assert_eq!(pivot.depth(), union.depth() + 1);
        assert!(AreaKey::universal().split_pivot().is_empty());
    }
}
