use std::cmp::Ordering;

use crate::geometry::{round_coord, wrap_lon};
use crate::{Error, Point};

/// A box on earth delimited by two parallels and two meridians, all in
/// degrees.
///
/// A box may be **empty** (containing no point), which is encoded by
/// `lat_min > lat_max`. A non-empty box with `lon_min > lon_max` **crosses
/// the 180th meridian**: it covers the longitudes east of `lon_min` plus
/// those west of `lon_max`. A box covering all longitudes is normalized to
/// the full strip `[-180, 180]`.
///
/// # Examples
///
/// ```
/// use geodex::{Bbox, Point};
///
/// // A box around the 180th meridian, 20 degrees wide.
/// let b = Bbox::new(-5.0, 5.0, 170.0, -170.0)?;
/// assert!(b.crosses_dateline());
/// assert!(b.contains(&Point::new(0.0, 180.0)?));
/// assert!(!b.contains(&Point::new(0.0, 0.0)?));
/// # Ok::<(), geodex::Error>(())
/// ```
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bbox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl Bbox {
    /// Creates a box from its southern, northern, western, and eastern
    /// boundaries in degrees.
    ///
    /// `lat_min > lat_max` yields the empty box. Latitudes beyond a pole
    /// are clamped with a warning; longitudes are wrapped into range with a
    /// notice. A longitude coverage of 360 degrees or more collapses to the
    /// full strip. If `lon_min > lon_max` after normalization, the box
    /// crosses the 180th meridian.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteCoordinates`] if any boundary of a
    /// non-empty box is NaN or infinite.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self, Error> {
        if lat_min > lat_max {
            return Ok(Bbox::empty());
        }
        if !lat_min.is_finite()
            || !lat_max.is_finite()
            || !lon_min.is_finite()
            || !lon_max.is_finite()
        {
            return Err(Error::NonFiniteCoordinates { ty: "box" });
        }
        let lat_max = match lat_max {
            l if l < -90.0 => {
                warn!("northern latitude exceeds south pole");
                -90.0
            }
            l if l > 90.0 => {
                warn!("northern latitude exceeds north pole");
                90.0
            }
            l => l,
        };
        let lat_min = match lat_min {
            l if l < -90.0 => {
                warn!("southern latitude exceeds south pole");
                -90.0
            }
            l if l > 90.0 => {
                warn!("southern latitude exceeds north pole");
                90.0
            }
            l => l,
        };
        let (lon_min, lon_max) = if lon_max - lon_min >= 360.0 {
            if lon_max - lon_min > 360.0 {
                warn!("longitude coverage greater than 360 degrees");
            }
            (-180.0, 180.0)
        } else {
            (normalize_lon(lon_min), normalize_lon(lon_max))
        };
        let boxed = Bbox {
            lat_min: round_coord(lat_min),
            lat_max: round_coord(lat_max),
            lon_min: round_coord(lon_min),
            lon_max: round_coord(lon_max),
        };
        // Rounding must not turn a dateline-crossing box into a degenerate
        // strip of zero width.
        if lon_min > lon_max && boxed.lon_min == boxed.lon_max {
            return Ok(Bbox {
                lon_min: -180.0,
                lon_max: 180.0,
                ..boxed
            });
        }
        Ok(boxed)
    }

    /// Creates the empty box.
    pub fn empty() -> Self {
        Bbox {
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
            lon_min: 0.0,
            lon_max: 0.0,
        }
    }

    /// Creates the smallest box covering two corner points.
    ///
    /// The corners leave the east-west orientation ambiguous when they are
    /// between 120 and 240 longitude degrees apart; spans of 240 degrees or
    /// more are assumed to cross the 180th meridian.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousBoxOrientation`] for spans in the
    /// ambiguous range.
    pub fn from_corners(corner1: &Point, corner2: &Point) -> Result<Self, Error> {
        let (lat_min, lat_max) = if corner2.lat() < corner1.lat() {
            (corner2.lat(), corner1.lat())
        } else {
            (corner1.lat(), corner2.lat())
        };
        let (mut lon_min, mut lon_max) = if corner2.lon() < corner1.lon() {
            (corner2.lon(), corner1.lon())
        } else {
            (corner1.lon(), corner2.lon())
        };
        let dlon = round_coord(lon_max - lon_min);
        if dlon >= 240.0 {
            // Assume the 180th meridian is crossed.
            std::mem::swap(&mut lon_min, &mut lon_max);
        } else if dlon > 120.0 {
            return Err(Error::AmbiguousBoxOrientation);
        }
        Bbox::new(lat_min, lat_max, lon_min, lon_max)
    }

    pub(crate) const fn raw(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Bbox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Returns the southern boundary in degrees.
    #[inline]
    pub fn lat_min(self) -> f64 {
        self.lat_min
    }

    /// Returns the northern boundary in degrees.
    #[inline]
    pub fn lat_max(self) -> f64 {
        self.lat_max
    }

    /// Returns the western boundary in degrees.
    #[inline]
    pub fn lon_min(self) -> f64 {
        self.lon_min
    }

    /// Returns the eastern boundary in degrees.
    #[inline]
    pub fn lon_max(self) -> f64 {
        self.lon_max
    }

    /// Returns `true` if the box contains no point.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.lat_min > self.lat_max
    }

    /// Returns `true` if the box crosses the 180th meridian.
    #[inline]
    pub fn crosses_dateline(self) -> bool {
        self.lon_min > self.lon_max
    }

    /// Checks whether a point lies inside the box, boundaries included.
    pub fn contains(&self, point: &Point) -> bool {
        point.lat() >= self.lat_min
            && point.lat() <= self.lat_max
            && if self.lon_min > self.lon_max {
                // box crosses 180th meridian
                point.lon() >= self.lon_min || point.lon() <= self.lon_max
            } else {
                point.lon() >= self.lon_min && point.lon() <= self.lon_max
            }
    }
}

// Wrap a longitude into [-180, 180] by whole turns, leaving in-range
// values (including +180) untouched.
fn normalize_lon(lon: f64) -> f64 {
    if lon < -180.0 || lon > 180.0 {
        wrap_lon(lon)
    } else {
        lon
    }
}

impl From<Point> for Bbox {
    /// The degenerate box covering exactly one point.
    fn from(point: Point) -> Self {
        Bbox {
            lat_min: point.lat(),
            lat_max: point.lat(),
            lon_min: point.lon(),
            lon_max: point.lon(),
        }
    }
}

impl PartialEq for Bbox {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Bbox {}

impl PartialOrd for Bbox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bbox {
    fn cmp(&self, other: &Self) -> Ordering {
        // Two empty boxes are equal; an empty box sorts before any
        // non-empty box.
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        for (a, b) in [
            (self.lat_min, other.lat_min),
            (self.lat_max, other.lat_max),
            (self.lon_min, other.lon_min),
            (self.lon_max, other.lon_max),
        ] {
            if a < b {
                return Ordering::Less;
            }
            if a > b {
                return Ordering::Greater;
            }
        }
        Ordering::Equal
    }
}
