//! The `geodex` crate provides geographic primitive types and a fractal
//! spatial index for the WGS-84 spheroid.
//!
//! Unlike general-purpose GIS libraries, everything here is specific to one
//! surface: latitude/longitude coordinates in degrees on WGS-84, with
//! longitude wrap-around at the 180th meridian handled throughout. The crate
//! is a pure library; it keeps no global state, performs no I/O, and is
//! intended to back an external store that calls the index support functions
//! in [`index::gist`] for its search tree and the exact operators for
//! rechecks.
//!
//! # Types
//!
//! - **[`Point`]**: A location given by latitude and longitude in degrees,
//!   rounded to 12 fractional digits
//! - **[`Bbox`]**: A box delimited by two parallels and two meridians,
//!   possibly crossing the 180th meridian, possibly empty
//! - **[`Circle`]**: A center point with a radius in meters; the radius may
//!   be `-inf` (empty set), zero (a single point), or `inf` (whole earth)
//! - **[`Cluster`]**: An ordered collection of point, path, outline, and
//!   polygon entries treated as one geometric value, carrying a bounding
//!   circle computed at construction
//!
//! # Algorithms
//!
//! - **[`Distance`](algorithm::Distance)**: Surface distance in meters
//!   between two values, using a tunnel-distance approximation with an
//!   antipodal crossfade (see [`algorithm::spheroid_distance`])
//! - **[`Overlaps`](algorithm::Overlaps)**: Whether two values share at
//!   least one location, with longitude wrap-around handled per entry
//!
//! # Index support
//!
//! - **[`index::PointKey`] / [`index::AreaKey`]**: Bit-interleaved prefix
//!   keys addressing a fractal subdivision of the spheroid
//! - **[`index::gist`]**: The support-function surface a generalized search
//!   tree calls: `consistent`, `union`, `compress`, `decompress`, `penalty`,
//!   `picksplit`, `same`, and `distance`
//!
//! All index answers are lossy and must be rechecked with the exact
//! operators; see the [`index::gist`] module docs.
//!
//! # Text and wire formats
//!
//! All four value types implement [`std::fmt::Display`] and
//! [`std::str::FromStr`] with a canonical `N<deg> E<deg>` textual form that
//! round-trips exactly. [`Point`], [`Bbox`], and [`Circle`] additionally
//! offer a fixed-size big-endian binary encoding for transport.
//!
//! # Diagnostics
//!
//! Construction failures are returned as [`Error`]. Lossless normalizations
//! (longitude wrapped into range, negative radius collapsed to `-inf`) are
//! reported through the [`log`] facade at `info` level, clamps at `warn`
//! level; the host owns the logger.

#[cfg(test)]
#[macro_use]
extern crate approx;

#[macro_use]
extern crate log;

pub use crate::algorithm::*;

pub mod algorithm;
pub mod geometry;
pub use geometry::*;
pub mod index;

mod error;
pub use error::Error;
mod text;
mod wire;

use std::f64::consts::PI;

/// Semi-major axis of the WGS-84 spheroid in meters.
pub const SPHEROID_A: f64 = 6_378_137.0;

/// Flattening of the WGS-84 spheroid.
pub const SPHEROID_F: f64 = 1.0 / 298.257_223_563;

/// Semi-minor axis of the WGS-84 spheroid in meters.
pub const SPHEROID_B: f64 = SPHEROID_A * (1.0 - SPHEROID_F);

// First eccentricity squared and its complement.
pub(crate) const EPS2: f64 =
    (SPHEROID_A * SPHEROID_A - SPHEROID_B * SPHEROID_B) / (SPHEROID_A * SPHEROID_A);
pub(crate) const SUBEPS2: f64 = 1.0 - EPS2;

/// Estimated mean diameter of the spheroid, `2 * (2a + b) / 3`.
pub const DIAMETER: f64 = (4.0 * SPHEROID_A + 2.0 * SPHEROID_B) / 3.0;

// Semi-major axis of the scaled (mean diameter 1.0) ellipsoid.
pub(crate) const SCALE: f64 = SPHEROID_A / DIAMETER;

// One sixth of the circumference; beyond it the direct tunnel-distance
// approximation is no longer trusted on its own.
pub(crate) const FADE_LIMIT: f64 = DIAMETER * PI / 6.0;

/// Maximum surface distance between two points on earth, in meters.
pub const MAXDIST: f64 = DIAMETER * PI / 2.0;

/// Finite sentinel distance that can not be reached on earth.
///
/// Returned by the index distance estimators in place of infinity, which
/// nearest-neighbor queues reserve.
pub const ULTRA_DISTANCE: f64 = 3.0 * MAXDIST;

/// Maximum number of points in a [`Cluster`].
pub const CLUSTER_MAXPOINTS: usize = 16_777_216;

/// A prelude which re-exports the traits for manipulating objects in this
/// crate. Typically imported with `use geodex::prelude::*`.
pub mod prelude {
    pub use crate::algorithm::*;
}
