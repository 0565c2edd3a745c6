//! Fractal spatial index keys and the generalized-tree support surface.
//!
//! A key is a bit-interleaved prefix address into a recursive subdivision
//! of the spheroid. [`PointKey`]s interleave latitude and longitude bits;
//! [`AreaKey`]s additionally interleave a logarithmic object-size bit
//! stream, so that each tree level halves either the spatial extent or the
//! maximum represented radius. The [`gist`] module exposes the support
//! functions a host search tree invokes on stored keys.

pub mod gist;
pub mod key;

pub use key::{AreaKey, IndexKey, PointKey, REF_OBJSIZE};
