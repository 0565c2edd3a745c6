use crate::algorithm::spheroid_distance;
use crate::geometry::round_coord;
use crate::{Bbox, Circle, Error, Point, CLUSTER_MAXPOINTS};

/// The role of one entry inside a [`Cluster`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    /// A single point.
    Point,
    /// An open path from the first point to the last.
    Path,
    /// A closed vertex loop that is not filled.
    Outline,
    /// A filled polygon.
    Polygon,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct EntrySpan {
    kind: EntryKind,
    start: usize,
    end: usize,
}

/// A collection of points, paths, outlines, and polygons treated as one
/// geometric value.
///
/// If two polygons in a cluster overlap, the area covered by both does
/// *not* belong to the cluster; overlapping a polygon with itself punches a
/// hole. Every entry must cover a longitude arc of less than 180 degrees so
/// its east/west orientation stays unambiguous after wrap-around; larger
/// shapes have to be split into several entries.
///
/// A cluster is immutable after construction and carries a bounding circle
/// computed from all of its vertices. Point storage is one contiguous
/// buffer; entries borrow slices of it.
///
/// # Examples
///
/// ```
/// use geodex::{Cluster, EntryKind, Point};
///
/// let polygon = Cluster::new(vec![(
///     EntryKind::Polygon,
///     vec![
///         Point::new(10.0, 170.0)?,
///         Point::new(10.0, -170.0)?,
///         Point::new(20.0, -170.0)?,
///         Point::new(20.0, 170.0)?,
///     ],
/// )])?;
/// assert!(polygon.contains(&Point::new(15.0, 180.0)?));
/// # Ok::<(), geodex::Error>(())
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cluster {
    entries: Vec<EntrySpan>,
    points: Vec<Point>,
    bounding: Circle,
}

/// A borrowed view of one cluster entry: its kind and its points.
#[derive(Clone, Copy, Debug)]
pub struct Entry<'a> {
    kind: EntryKind,
    points: &'a [Point],
}

impl<'a> Entry<'a> {
    /// Returns the kind of the entry.
    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the points of the entry. Never empty.
    #[inline]
    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    // Whether the edge from the last point back to the first exists.
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.kind, EntryKind::Outline | EntryKind::Polygon)
    }
}

impl Cluster {
    /// Builds a cluster from a list of entries.
    ///
    /// Entries are normalized: a one-point entry of any kind becomes a
    /// [`EntryKind::Point`], a two-point outline or polygon becomes a
    /// [`EntryKind::Path`]. The bounding circle is computed here; if the
    /// cluster as a whole covers a longitude arc of 180 degrees or more, the
    /// bounding circle covers the entire earth.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyEntry`] for an entry without points
    /// - [`Error::PointEntryTooLong`] for a point entry with several points
    /// - [`Error::TooManyPoints`] when the total exceeds
    ///   [`CLUSTER_MAXPOINTS`](crate::CLUSTER_MAXPOINTS)
    /// - [`Error::AmbiguousClusterOrientation`] when a single entry covers
    ///   a longitude arc of 180 degrees or more
    pub fn new(parts: Vec<(EntryKind, Vec<Point>)>) -> Result<Self, Error> {
        let mut entries = Vec::with_capacity(parts.len());
        let mut points: Vec<Point> = Vec::new();
        for (kind, entry_points) in parts {
            if entry_points.is_empty() {
                return Err(Error::EmptyEntry);
            }
            if kind == EntryKind::Point && entry_points.len() > 1 {
                return Err(Error::PointEntryTooLong);
            }
            if points.len() + entry_points.len() > CLUSTER_MAXPOINTS {
                return Err(Error::TooManyPoints);
            }
            let kind = match entry_points.len() {
                1 => EntryKind::Point,
                2 => EntryKind::Path,
                _ => kind,
            };
            let start = points.len();
            points.extend(entry_points);
            entries.push(EntrySpan {
                kind,
                start,
                end: points.len(),
            });
        }
        let mut cluster = Cluster {
            entries,
            points,
            bounding: Circle::raw(Point::raw(0.0, 0.0), f64::NEG_INFINITY),
        };
        cluster.finalize()?;
        Ok(cluster)
    }

    /// Returns the bounding circle computed at construction.
    ///
    /// Empty clusters carry an empty bounding circle (radius `-inf`);
    /// clusters covering a longitude arc of 180 degrees or more carry a
    /// whole-earth bounding circle (radius `inf`).
    #[inline]
    pub fn bounding(&self) -> Circle {
        self.bounding
    }

    /// Returns the number of entries.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Returns the total number of points over all entries.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cluster has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries of the cluster.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = Entry<'_>> {
        self.entries.iter().map(|span| Entry {
            kind: span.kind,
            points: &self.points[span.start..span.end],
        })
    }

    /// Checks whether a point belongs to the cluster.
    ///
    /// Points on a vertex or an edge belong to the cluster. The interior of
    /// filled polygons is decided by the even-odd rule, so the overlap of
    /// two polygons in the same cluster is a hole. Paths and outlines
    /// contribute only their vertices and edges.
    pub fn contains(&self, point: &Point) -> bool {
        crate::algorithm::overlaps::point_in_cluster(point, self)
    }

    /// Checks east/west unambiguousness of every entry and computes the
    /// bounding circle.
    fn finalize(&mut self) -> Result<(), Error> {
        self.bounding = Circle::raw(Point::raw(0.0, 0.0), f64::NEG_INFINITY);
        if self.entries.is_empty() {
            return Ok(());
        }
        // Every entry on its own must cover less than 180 longitude
        // degrees, measured in the wrap frame of its first vertex.
        for span in &self.entries {
            let pts = &self.points[span.start..span.end];
            let first = pts[0].lon();
            let mut lon_min = first;
            let mut lon_max = first;
            let (lon_dir, lon_break) = if first < 0.0 {
                (-1, round_coord(first + 180.0))
            } else if first > 0.0 {
                (1, round_coord(first - 180.0))
            } else {
                (0, 0.0)
            };
            for point in &pts[1..] {
                let mut value = point.lon();
                if lon_dir < 0 && value > lon_break {
                    value = round_coord(value - 360.0);
                } else if lon_dir > 0 && value < lon_break {
                    value = round_coord(value + 360.0);
                }
                if value < lon_min {
                    lon_min = value;
                } else if value > lon_max {
                    lon_max = value;
                }
                if lon_max - lon_min >= 180.0 {
                    return Err(Error::AmbiguousClusterOrientation);
                }
            }
        }
        // Average all vertices for an arbitrary center point (best if the
        // center minimized the radius, but some error is allowed here),
        // re-expressing longitudes in the wrap frame of the very first
        // vertex. If the cluster as a whole reaches a 180 degree arc, the
        // bounding circle covers the entire earth.
        let mut lat_sum = 0.0;
        let mut lon_sum = 0.0;
        let mut total = 0usize;
        let mut lon_dir = 0;
        let mut lon_break = 0.0;
        let mut lon_min = 0.0;
        let mut lon_max = 0.0;
        for (i, span) in self.entries.iter().enumerate() {
            let pts = &self.points[span.start..span.end];
            if i == 0 {
                let value = pts[0].lon();
                lon_min = value;
                lon_max = value;
                if value < 0.0 {
                    lon_dir = -1;
                    lon_break = value + 180.0;
                } else if value > 0.0 {
                    lon_dir = 1;
                    lon_break = value - 180.0;
                }
            }
            for point in pts {
                let mut value = point.lon();
                if lon_dir < 0 && value > lon_break {
                    value -= 360.0;
                } else if lon_dir > 0 && value < lon_break {
                    value += 360.0;
                }
                if value < lon_min {
                    lon_min = value;
                } else if value > lon_max {
                    lon_max = value;
                }
                if lon_max - lon_min >= 180.0 {
                    self.bounding = Circle::raw(Point::raw(0.0, 0.0), f64::INFINITY);
                    return Ok(());
                }
                lat_sum += point.lat();
                lon_sum += value;
            }
            total += pts.len();
        }
        let center_lat = lat_sum / total as f64;
        let mut center_lon = lon_sum / total as f64;
        if center_lon < -180.0 {
            center_lon += 360.0;
        } else if center_lon > 180.0 {
            center_lon -= 360.0;
        }
        let center = Point::raw(round_coord(center_lat), round_coord(center_lon));
        let mut radius = f64::NEG_INFINITY;
        for point in &self.points {
            let dist = spheroid_distance(center.lat(), center.lon(), point.lat(), point.lon());
            if dist > radius {
                radius = dist;
            }
        }
        self.bounding = Circle::raw(center, radius);
        Ok(())
    }
}

impl From<Point> for Cluster {
    /// The cluster holding exactly one point.
    fn from(point: Point) -> Self {
        Cluster {
            entries: vec![EntrySpan {
                kind: EntryKind::Point,
                start: 0,
                end: 1,
            }],
            points: vec![point],
            bounding: Circle::raw(point, 0.0),
        }
    }
}

impl From<Bbox> for Cluster {
    /// Decomposes a box into up to three polygons, each covering a
    /// longitude arc of less than 180 degrees.
    fn from(b: Bbox) -> Self {
        if b.is_empty() {
            return Cluster {
                entries: Vec::new(),
                points: Vec::new(),
                bounding: Circle::raw(Point::raw(0.0, 0.0), f64::NEG_INFINITY),
            };
        }
        let strips: Vec<(f64, f64)> = if b.crosses_dateline() {
            if b.lon_min() <= 0.0 {
                let lon = round_coord((b.lon_min() + 180.0) / 2.0);
                vec![(b.lon_min(), lon), (lon, 180.0), (-180.0, b.lon_max())]
            } else if b.lon_max() >= 0.0 {
                let lon = round_coord((b.lon_max() - 180.0) / 2.0);
                vec![(b.lon_min(), 180.0), (-180.0, lon), (lon, b.lon_max())]
            } else {
                vec![(b.lon_min(), 180.0), (-180.0, b.lon_max())]
            }
        } else {
            let dlon = round_coord(b.lon_max() - b.lon_min());
            if dlon < 180.0 {
                vec![(b.lon_min(), b.lon_max())]
            } else {
                let lon = round_coord((b.lon_min() + b.lon_max()) / 2.0);
                if round_coord(lon - b.lon_min()) < 180.0 && round_coord(b.lon_max() - lon) < 180.0
                {
                    vec![(b.lon_min(), lon), (lon, b.lon_max())]
                } else {
                    // full longitude strip
                    vec![(b.lon_min(), -60.0), (-60.0, 60.0), (60.0, b.lon_max())]
                }
            }
        };
        let parts = strips
            .into_iter()
            .map(|(west, east)| {
                (
                    EntryKind::Polygon,
                    vec![
                        Point::raw(b.lat_min(), west),
                        Point::raw(b.lat_min(), east),
                        Point::raw(b.lat_max(), east),
                        Point::raw(b.lat_max(), west),
                    ],
                )
            })
            .collect();
        Cluster::new(parts).expect("box decomposition keeps every polygon under a 180 degree arc")
    }
}
