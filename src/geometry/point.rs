use std::cmp::Ordering;

use crate::geometry::{round_coord, wrap_lon};
use crate::Error;

/// A location on earth given by latitude and longitude in degrees.
///
/// Latitude lies in `[-90, 90]` and longitude in `[-180, 180]`, both
/// rounded to 12 fractional digits so that values survive a text round-trip
/// bit for bit. Input outside those ranges is repaired where the intent is
/// unambiguous: longitudes are wrapped by whole turns (reported at `info`
/// level), latitudes beyond a pole are clamped to it (reported at `warn`
/// level). Non-finite input is an error.
///
/// # Equality and order
///
/// Two points are equal when they denote the same location on the sphere:
/// at the poles every longitude describes the same point, and `E180` and
/// `W180` describe the same meridian. The [`Ord`] implementation provides
/// an arbitrary but total order (latitude first, then normalized
/// longitude) suitable for sorted indexes.
///
/// # Examples
///
/// ```
/// use geodex::Point;
///
/// let p = Point::new(53.5, 190.0)?;
/// assert_eq!(p.lat(), 53.5);
/// assert_eq!(p.lon(), -170.0); // wrapped into range
/// # Ok::<(), geodex::Error>(())
/// ```
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    lat: f64,
    lon: f64,
}

impl Point {
    /// Creates a point from latitude and longitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteCoordinates`] if either coordinate is NaN
    /// or infinite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, Error> {
        let (lat, lon) = checked_latlon("point", lat, lon)?;
        Ok(Point { lat, lon })
    }

    /// Builds a point from coordinates already known to be normalized and
    /// rounded (wire decoding, index key reconstruction).
    pub(crate) const fn raw(lat: f64, lon: f64) -> Self {
        Point { lat, lon }
    }

    /// Returns the latitude in degrees.
    #[inline]
    pub fn lat(self) -> f64 {
        self.lat
    }

    /// Returns the longitude in degrees.
    #[inline]
    pub fn lon(self) -> f64 {
        self.lon
    }

    // Longitude with the pole and 180th-meridian collapses applied, so that
    // comparison treats coincident locations as equal.
    fn order_lon(self) -> f64 {
        if self.lat == -90.0 || self.lat == 90.0 {
            0.0
        } else if self.lon == 180.0 {
            -180.0
        } else {
            self.lon
        }
    }
}

/// Validate, normalize, and round a latitude/longitude pair.
///
/// Shared by the point and circle constructors. Boxes clamp and wrap per
/// boundary with their own diagnostics, but use the same longitude wrap
/// ([`wrap_lon`](crate::geometry::wrap_lon)).
pub(crate) fn checked_latlon(
    ty: &'static str,
    mut lat: f64,
    mut lon: f64,
) -> Result<(f64, f64), Error> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(Error::NonFiniteCoordinates { ty });
    }
    if lat < -90.0 {
        warn!("latitude exceeds south pole");
        lat = -90.0;
    } else if lat > 90.0 {
        warn!("latitude exceeds north pole");
        lat = 90.0;
    }
    if lon < -180.0 {
        info!("longitude west of 180th meridian normalized");
        lon = wrap_lon(lon);
    } else if lon > 180.0 {
        info!("longitude east of 180th meridian normalized");
        lon = wrap_lon(lon);
    }
    Ok((round_coord(lat), round_coord(lon)))
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        // Coordinates are finite by construction, so `<` and `>` decide
        // every pair.
        if self.lat < other.lat {
            return Ordering::Less;
        }
        if self.lat > other.lat {
            return Ordering::Greater;
        }
        let lon1 = self.order_lon();
        let lon2 = other.order_lon();
        if lon1 < lon2 {
            Ordering::Less
        } else if lon1 > lon2 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}
