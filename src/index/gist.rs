//! Support functions for a generalized search tree over index keys.
//!
//! The host search tree owns pages, latches, and recovery; this module owns
//! the key algebra it calls through its support-function API. Each function
//! is a pure function of its arguments.
//!
//! Every scan answer here is **lossy**: [`consistent`] may return false
//! positives and [`distance`] may underestimate, so the host must recheck
//! candidate rows with the exact operators
//! ([`Overlaps`](crate::algorithm::Overlaps),
//! [`Distance`](crate::algorithm::Distance)). False negatives do not occur.
//!
//! The query-language strategy numbers map onto [`Predicate`] and
//! [`DistanceQuery`] as follows:
//!
//! | Strategy | Meaning                    | Variant                         |
//! |----------|----------------------------|---------------------------------|
//! | 11       | point equals point         | `Predicate::PointEquals`        |
//! | 13       | circle equals circle       | `Predicate::CircleEquals`       |
//! | 21       | overlaps point             | `Predicate::OverlapsPoint`      |
//! | 22       | overlaps box               | `Predicate::OverlapsBbox`       |
//! | 23       | overlaps circle            | `Predicate::OverlapsCircle`     |
//! | 24       | overlaps cluster           | `Predicate::OverlapsCluster`    |
//! | 31       | distance to point          | `DistanceQuery::Point`          |
//! | 33       | distance to circle         | `DistanceQuery::Circle`         |
//! | 34       | distance to cluster        | `DistanceQuery::Cluster`        |

use crate::algorithm::Overlaps;
use crate::index::key::{AreaKey, IndexKey, PointKey};
use crate::{Bbox, Circle, Cluster, Point, ULTRA_DISTANCE};

/// An indexable search predicate together with its query datum.
#[derive(Clone, Copy, Debug)]
pub enum Predicate<'a> {
    /// Strategy 11: the indexed point equals the query point.
    PointEquals(&'a Point),
    /// Strategy 13: the indexed circle equals the query circle.
    CircleEquals(&'a Circle),
    /// Strategy 21: the indexed value overlaps the query point.
    OverlapsPoint(&'a Point),
    /// Strategy 22: the indexed value overlaps the query box.
    OverlapsBbox(&'a Bbox),
    /// Strategy 23: the indexed value overlaps the query circle.
    OverlapsCircle(&'a Circle),
    /// Strategy 24: the indexed value overlaps the query cluster.
    OverlapsCluster(&'a Cluster),
}

impl Predicate<'_> {
    /// The host-level strategy number of this predicate.
    pub fn strategy(&self) -> u16 {
        match self {
            Predicate::PointEquals(_) => 11,
            Predicate::CircleEquals(_) => 13,
            Predicate::OverlapsPoint(_) => 21,
            Predicate::OverlapsBbox(_) => 22,
            Predicate::OverlapsCircle(_) => 23,
            Predicate::OverlapsCluster(_) => 24,
        }
    }
}

/// An ordered-scan target together with its query datum.
#[derive(Clone, Copy, Debug)]
pub enum DistanceQuery<'a> {
    /// Strategy 31: order by distance to the query point.
    Point(&'a Point),
    /// Strategy 33: order by distance to the query circle.
    Circle(&'a Circle),
    /// Strategy 34: order by distance to the query cluster.
    Cluster(&'a Cluster),
}

impl DistanceQuery<'_> {
    /// The host-level strategy number of this scan order.
    pub fn strategy(&self) -> u16 {
        match self {
            DistanceQuery::Point(_) => 31,
            DistanceQuery::Circle(_) => 33,
            DistanceQuery::Cluster(_) => 34,
        }
    }
}

/// Decides whether the subtree under `key` may contain a match for the
/// predicate. False positives are allowed and rechecked by the host; false
/// negatives are not.
pub fn consistent(key: &IndexKey, predicate: &Predicate<'_>) -> bool {
    match predicate {
        Predicate::PointEquals(query) => {
            let IndexKey::Point(key) = *key else {
                panic!("point equality scan over area keys");
            };
            key.overlaps(&PointKey::from(**query))
        }
        Predicate::CircleEquals(query) => {
            let IndexKey::Area(key) = *key else {
                panic!("circle equality scan over point keys");
            };
            key.overlaps(&AreaKey::from(**query))
        }
        // For the remaining strategies keys on empty objects never match;
        // the check is necessary because the query radius may be infinite.
        Predicate::OverlapsPoint(query) => {
            !key.is_empty_area() && key.estimate_distance(query) == 0.0
        }
        Predicate::OverlapsBbox(query) => {
            !key.is_empty_area() && {
                let (bbox, _) = key.bounds();
                query.overlaps(&bbox)
            }
        }
        Predicate::OverlapsCircle(query) => {
            !key.is_empty_area() && key.estimate_distance(&query.center()) <= query.radius()
        }
        Predicate::OverlapsCluster(query) => {
            !key.is_empty_area()
                && key.estimate_distance(&query.bounding().center()) <= query.bounding().radius()
        }
    }
}

/// Folds a page of keys into one key covering all of them.
pub fn union(keys: &[IndexKey]) -> IndexKey {
    let (first, rest) = keys.split_first().expect("union of an empty key page");
    rest.iter().fold(*first, |acc, key| acc.unite(key))
}

/// Leaf compression of a point column value.
pub fn compress_point(point: &Point) -> IndexKey {
    IndexKey::Point(PointKey::from(*point))
}

/// Leaf compression of a circle column value.
pub fn compress_circle(circle: &Circle) -> IndexKey {
    IndexKey::Area(AreaKey::from(*circle))
}

/// Leaf compression of a cluster column value: the bounding circle drives
/// the key.
pub fn compress_cluster(cluster: &Cluster) -> IndexKey {
    IndexKey::Area(AreaKey::from(cluster.bounding()))
}

/// Decompression is the identity; keys are stored as-is.
pub fn decompress(key: IndexKey) -> IndexKey {
    key
}

/// The cost of inserting `new` under `original`: the decrease in common
/// prefix depth. Zero means containment; lower is better.
pub fn penalty(original: &IndexKey, new: &IndexKey) -> f32 {
    f32::from(original.depth() - original.unite(new).depth())
}

/// The outcome of [`picksplit`]: index lists for both sides together with
/// their running unions.
#[derive(Clone, Debug)]
pub struct PickSplit {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_union: IndexKey,
    pub right_union: IndexKey,
}

/// Distributes an overflowing page of keys into two halves.
///
/// The union of all keys is refined by one stream position and every key is
/// routed by whether it overlaps the refined pivot, which cuts the covered
/// cell in half. A union covering both empty and non-empty objects splits
/// into exactly those two classes. When no splitting bit is left (all keys
/// share the maximal depth), or when routing would leave one side empty,
/// the page is split into arbitrary halves instead.
pub fn picksplit(keys: &[IndexKey]) -> PickSplit {
    assert!(keys.len() >= 2, "picksplit needs at least two keys");
    let union_all = union(keys);
    if union_all.depth() == union_all.max_depth() {
        return split_in_halves(keys);
    }
    let pivot = if union_all.is_universal_area() {
        // split into empty and non-empty objects
        IndexKey::Area(AreaKey::empty())
    } else {
        union_all.split_pivot()
    };
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut left_union: Option<IndexKey> = None;
    let mut right_union: Option<IndexKey> = None;
    for (i, key) in keys.iter().enumerate() {
        if pivot.overlaps(key) {
            left_union = Some(match left_union {
                Some(union) => union.unite(key),
                None => *key,
            });
            left.push(i);
        } else {
            right_union = Some(match right_union {
                Some(union) => union.unite(key),
                None => *key,
            });
            right.push(i);
        }
    }
    match (left_union, right_union) {
        (Some(left_union), Some(right_union)) => PickSplit {
            left,
            right,
            left_union,
            right_union,
        },
        // a shorter key made the common prefix maximal without a
        // disagreeing bit; routing put everything on one side
        _ => split_in_halves(keys),
    }
}

fn split_in_halves(keys: &[IndexKey]) -> PickSplit {
    let mid = keys.len() / 2;
    PickSplit {
        left: (0..mid).collect(),
        right: (mid..keys.len()).collect(),
        left_union: union(&keys[..mid]),
        right_union: union(&keys[mid..]),
    }
}

/// Key equality: byte-equal after normalization.
pub fn same(a: &IndexKey, b: &IndexKey) -> bool {
    a == b
}

/// Estimated distance between the subtree under `key` and the query, for
/// ordered nearest-neighbor scans. Never larger than the true minimum
/// distance; infinity is replaced with [`ULTRA_DISTANCE`] because the
/// host's queue reserves it.
pub fn distance(key: &IndexKey, query: &DistanceQuery<'_>) -> f64 {
    match query {
        DistanceQuery::Point(point) => {
            let distance = key.estimate_distance(point);
            if distance.is_finite() {
                distance
            } else {
                ULTRA_DISTANCE
            }
        }
        DistanceQuery::Circle(circle) => {
            let distance = key.estimate_distance(&circle.center()) - circle.radius();
            clamp_estimate(distance)
        }
        DistanceQuery::Cluster(cluster) => {
            let bounding = cluster.bounding();
            let distance = key.estimate_distance(&bounding.center()) - bounding.radius();
            clamp_estimate(distance)
        }
    }
}

fn clamp_estimate(distance: f64) -> f64 {
    if distance <= 0.0 {
        0.0
    } else if distance.is_finite() {
        distance
    } else {
        ULTRA_DISTANCE
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::distance::Distance;
    use crate::{EntryKind, MAXDIST};

    fn pt(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn equality_scan_follows_matching_subtrees() {
        let stored = compress_point(&pt(10.0, 20.0));
        assert!(consistent(&stored, &Predicate::PointEquals(&pt(10.0, 20.0))));
        assert!(!consistent(&stored, &Predicate::PointEquals(&pt(10.0, 20.1))));
        // an inner node covering the stored point stays consistent
        let inner = stored.unite(&compress_point(&pt(10.2, 20.2)));
        assert!(consistent(&inner, &Predicate::PointEquals(&pt(10.0, 20.0))));
    }

    #[test]
    fn circle_equality_scan() {
        let circle = Circle::new(10.0, 20.0, 5_000.0).unwrap();
        let stored = compress_circle(&circle);
        assert!(consistent(&stored, &Predicate::CircleEquals(&circle)));
        let other = Circle::new(10.0, 20.0, 5_000_000.0).unwrap();
        assert!(!consistent(&stored, &Predicate::CircleEquals(&other)));
        // empty circles hash to the empty key and find each other
        let nothing = Circle::new(0.0, 0.0, -1.0).unwrap();
        let stored = compress_circle(&nothing);
        assert!(consistent(&stored, &Predicate::CircleEquals(&nothing)));
    }

    #[test]
    fn overlap_scans_are_inclusive() {
        let stored = compress_point(&pt(5.0, 5.0));
        assert!(consistent(&stored, &Predicate::OverlapsPoint(&pt(5.0, 5.0))));
        let bbox = Bbox::new(0.0, 10.0, 0.0, 10.0).unwrap();
        assert!(consistent(&stored, &Predicate::OverlapsBbox(&bbox)));
        let miss = Bbox::new(40.0, 50.0, 40.0, 50.0).unwrap();
        assert!(!consistent(&stored, &Predicate::OverlapsBbox(&miss)));
        let circle = Circle::new(5.0, 6.0, 200_000.0).unwrap();
        assert!(consistent(&stored, &Predicate::OverlapsCircle(&circle)));
        let tiny = Circle::new(5.0, 6.0, 1_000.0).unwrap();
        assert!(!consistent(&stored, &Predicate::OverlapsCircle(&tiny)));
    }

    #[test]
    fn radial_scan_is_decided_by_the_geodesic() {
        // a 10,000 km circle around the equator reaches latitude 89.5
        let stored = compress_point(&pt(89.5, 0.5));
        let query = Circle::new(0.0, 0.0, 10_000_000.0).unwrap();
        assert!(consistent(&stored, &Predicate::OverlapsCircle(&query)));
        let query = Circle::new(0.0, 0.0, 9_000_000.0).unwrap();
        assert!(!consistent(&stored, &Predicate::OverlapsCircle(&query)));
    }

    #[test]
    fn cluster_scan_uses_the_bounding_circle() {
        let cluster: Cluster = Cluster::new(vec![(
            EntryKind::Polygon,
            vec![pt(0.0, 0.0), pt(0.0, 10.0), pt(10.0, 10.0), pt(10.0, 0.0)],
        )])
        .unwrap();
        let stored = compress_point(&pt(5.0, 5.0));
        assert!(consistent(&stored, &Predicate::OverlapsCluster(&cluster)));
        let far = compress_point(&pt(-60.0, -120.0));
        assert!(!consistent(&far, &Predicate::OverlapsCluster(&cluster)));
        // cluster leaves are keyed by their bounding circle
        let leaf = compress_cluster(&cluster);
        assert!(consistent(&leaf, &Predicate::OverlapsPoint(&pt(5.0, 5.0))));
    }

    #[test]
    fn empty_keys_match_no_overlap_scan() {
        let nothing = Circle::new(0.0, 0.0, -1.0).unwrap();
        let stored = compress_circle(&nothing);
        let everywhere = Circle::new(0.0, 0.0, f64::INFINITY).unwrap();
        assert!(!consistent(&stored, &Predicate::OverlapsCircle(&everywhere)));
        assert!(!consistent(&stored, &Predicate::OverlapsPoint(&pt(0.0, 0.0))));
        let full = Bbox::new(-90.0, 90.0, -180.0, 180.0).unwrap();
        assert!(!consistent(&stored, &Predicate::OverlapsBbox(&full)));
    }

    #[test]
    fn union_covers_every_member() {
        let keys: Vec<IndexKey> = [
            pt(10.0, 10.0),
            pt(10.1, 10.1),
            pt(-80.0, 170.0),
            pt(45.0, -45.0),
        ]
        .iter()
        .map(compress_point)
        .collect();
        let folded = union(&keys);
        for key in &keys {
            assert!(folded.overlaps(key));
        }
    }

    #[test]
    fn penalty_is_zero_on_containment() {
        let a = compress_point(&pt(10.0, 10.0));
        let b = compress_point(&pt(10.001, 10.001));
        let parent = a.unite(&b);
        assert_eq!(penalty(&parent, &a), 0.0);
        assert_eq!(penalty(&parent, &b), 0.0);
        // inserting something far away costs the whole prefix
        let far = compress_point(&pt(-10.0, 10.0));
        assert_eq!(penalty(&a, &far), f32::from(PointKey::MAX_DEPTH));
    }

    #[test]
    fn picksplit_partitions_by_the_refined_union() {
        let keys: Vec<IndexKey> = [
            pt(40.0, 10.0),
            pt(41.0, 11.0),
            pt(-40.0, 10.0),
            pt(-41.0, 11.0),
        ]
        .iter()
        .map(compress_point)
        .collect();
        let split = picksplit(&keys);
        // the first splitting bit is the hemisphere bit
        assert_eq!(split.left, vec![2, 3]);
        assert_eq!(split.right, vec![0, 1]);
        for &i in &split.left {
            assert!(split.left_union.overlaps(&keys[i]));
        }
        for &i in &split.right {
            assert!(split.right_union.overlaps(&keys[i]));
        }
        assert_eq!(split.left.len() + split.right.len(), keys.len());
    }

    #[test]
    fn picksplit_falls_back_when_keys_are_identical() {
        let key = compress_point(&pt(1.0, 2.0));
        let keys = vec![key, key, key, key];
        let split = picksplit(&keys);
        assert_eq!(split.left, vec![0, 1]);
        assert_eq!(split.right, vec![2, 3]);
        assert_eq!(split.left_union, key);
        assert_eq!(split.right_union, key);
    }

    #[test]
    fn picksplit_separates_empty_from_nonempty() {
        let nothing = Circle::new(0.0, 0.0, -1.0).unwrap();
        let somewhere = Circle::new(10.0, 10.0, 1_000.0).unwrap();
        let keys = vec![
            compress_circle(&nothing),
            compress_circle(&somewhere),
            compress_circle(&nothing),
        ];
        let split = picksplit(&keys);
        assert_eq!(split.left, vec![0, 2]);
        assert_eq!(split.right, vec![1]);
        assert!(split.left_union.is_empty_area());
    }

    #[test]
    fn picksplit_handles_a_page_of_nested_prefixes() {
        // A prefix key and the descendant that extends it with a zero bit
        // both overlap the refined pivot; the arbitrary fallback split must
        // still produce two non-empty sides.
        let d1 = PointKey::from(pt(10.0, 10.0));
        let d2 = PointKey::from(pt(10.000001, 10.000001));
        let prefix = d1.unite(&d2);
        let pivot = prefix.split_pivot();
        let low_child = if pivot.overlaps(&d1) { d1 } else { d2 };
        let keys = vec![IndexKey::Point(prefix), IndexKey::Point(low_child)];
        let split = picksplit(&keys);
        assert_eq!(split.left.len(), 1);
        assert_eq!(split.right.len(), 1);
    }

    #[test]
    fn same_is_byte_equality() {
        let a = compress_point(&pt(1.0, 2.0));
        let b = compress_point(&pt(1.0, 2.0));
        assert!(same(&a, &b));
        let shallower = a.unite(&compress_point(&pt(1.0, 2.1)));
        assert!(!same(&a, &shallower));
    }

    #[test]
    fn ordered_scan_distances() {
        let stored = compress_point(&pt(0.0, 10.0));
        let d = distance(&stored, &DistanceQuery::Point(&pt(0.0, 0.0)));
        assert!(d > 0.0);
        assert!(d <= MAXDIST);
        // never farther than the real distance
        assert!(d <= pt(0.0, 0.0).distance(&pt(0.0, 10.0)));
        // a circle query subtracts its radius
        let circle = Circle::new(0.0, 0.0, 500_000.0).unwrap();
        let dc = distance(&stored, &DistanceQuery::Circle(&circle));
        assert!(dc < d);
        // an enclosing circle clamps to zero
        let wide = Circle::new(0.0, 0.0, 2_000_000.0).unwrap();
        assert_eq!(distance(&stored, &DistanceQuery::Circle(&wide)), 0.0);
    }

    #[test]
    fn infinite_estimates_become_the_ultra_distance() {
        let nothing = Circle::new(0.0, 0.0, -1.0).unwrap();
        let stored = compress_circle(&nothing);
        assert_eq!(
            distance(&stored, &DistanceQuery::Point(&pt(0.0, 0.0))),
            ULTRA_DISTANCE
        );
        let target = Circle::new(0.0, 0.0, 1_000.0).unwrap();
        assert_eq!(
            distance(&stored, &DistanceQuery::Circle(&target)),
            ULTRA_DISTANCE
        );
        // an infinite query radius against an empty key stays unreachable
        let everything = Circle::new(0.0, 0.0, f64::INFINITY).unwrap();
        assert_eq!(
            distance(&stored, &DistanceQuery::Circle(&everything)),
            ULTRA_DISTANCE
        );
    }
}
