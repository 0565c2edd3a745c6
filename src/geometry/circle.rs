use std::cmp::Ordering;

use crate::geometry::point::checked_latlon;
use crate::{Error, Point};

/// A circle on the earth surface: a center point and a radius in meters.
///
/// The radius encodes four regimes: `-inf` is the empty set, `+0` a single
/// point, a finite positive value a filled disk, and `+inf` the whole
/// earth. A negative finite radius is collapsed to `-inf` with a notice;
/// NaN is an error.
///
/// Circles back fixed-radius radial searches: `a.overlaps(&b)` holds when
/// the center distance does not exceed the radius sum.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle {
    center: Point,
    radius: f64,
}

impl Circle {
    /// Creates a circle from center latitude, center longitude, and radius.
    ///
    /// Coordinates are normalized exactly like [`Point::new`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteCoordinates`] for NaN or infinite
    /// coordinates and [`Error::InvalidRadius`] for a NaN radius.
    pub fn new(lat: f64, lon: f64, radius: f64) -> Result<Self, Error> {
        let (lat, lon) = checked_latlon("circle", lat, lon)?;
        Ok(Circle {
            center: Point::raw(lat, lon),
            radius: checked_radius(radius)?,
        })
    }

    /// Creates a circle around an existing point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRadius`] for a NaN radius.
    pub fn from_point_radius(center: &Point, radius: f64) -> Result<Self, Error> {
        Ok(Circle {
            center: *center,
            radius: checked_radius(radius)?,
        })
    }

    pub(crate) const fn raw(center: Point, radius: f64) -> Self {
        Circle { center, radius }
    }

    /// Returns the center point.
    #[inline]
    pub fn center(self) -> Point {
        self.center
    }

    /// Returns the radius in meters.
    #[inline]
    pub fn radius(self) -> f64 {
        self.radius
    }
}

fn checked_radius(radius: f64) -> Result<f64, Error> {
    if radius.is_nan() {
        return Err(Error::InvalidRadius);
    }
    if radius == 0.0 {
        // avoids -0
        Ok(0.0)
    } else if radius < 0.0 {
        if radius.is_finite() {
            info!("negative radius converted to minus infinity");
        }
        Ok(f64::NEG_INFINITY)
    } else {
        Ok(radius)
    }
}

impl From<Point> for Circle {
    /// The degenerate circle covering exactly one point.
    fn from(point: Point) -> Self {
        Circle {
            center: point,
            radius: 0.0,
        }
    }
}

impl PartialEq for Circle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Circle {}

impl PartialOrd for Circle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Circle {
    fn cmp(&self, other: &Self) -> Ordering {
        // Two circles with the same infinite radius are equal regardless of
        // their centers: both describe the empty set or the whole earth.
        if !self.radius.is_finite() && !other.radius.is_finite() && self.radius == other.radius {
            return Ordering::Equal;
        }
        if self.radius < other.radius {
            return Ordering::Less;
        }
        if self.radius > other.radius {
            return Ordering::Greater;
        }
        self.center.cmp(&other.center)
    }
}
