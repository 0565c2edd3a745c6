use crate::CLUSTER_MAXPOINTS;

/// Errors produced when constructing or parsing geographic values.
///
/// All variants are data-domain failures: the operation produces no value
/// and nothing is retried. Lossless normalizations (longitude wrapped into
/// range, latitude clamped to a pole, negative radius collapsed) are not
/// errors; they succeed and are reported through the [`log`] facade.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A coordinate was NaN or infinite.
    #[error("{ty} requires finite coordinates")]
    NonFiniteCoordinates { ty: &'static str },

    /// A circle radius was NaN.
    #[error("invalid radius for circle")]
    InvalidRadius,

    /// Two corner points span a longitude arc between 120 and 240 degrees,
    /// so neither east-west orientation of the box is unambiguous.
    #[error("can not determine east/west orientation for box")]
    AmbiguousBoxOrientation,

    /// A cluster entry covers a longitude arc of 180 degrees or more, so
    /// its east/west orientation can not be reconstructed after
    /// wrap-around. Split the entry into smaller pieces.
    #[error("can not determine east/west orientation for cluster")]
    AmbiguousClusterOrientation,

    /// The total number of points in a cluster exceeds
    /// [`CLUSTER_MAXPOINTS`](crate::CLUSTER_MAXPOINTS).
    #[error("too many points for cluster (maximum {CLUSTER_MAXPOINTS})")]
    TooManyPoints,

    /// A cluster entry has an empty point list.
    #[error("cluster entry contains no points")]
    EmptyEntry,

    /// A point-typed cluster entry was given more than one point.
    #[error("point entry with more than one point")]
    PointEntryTooLong,

    /// The input text is not a valid representation of the named type.
    #[error("invalid input syntax for type {ty}: \"{input}\"")]
    InvalidSyntax { ty: &'static str, input: String },
}

impl Error {
    pub(crate) fn syntax(ty: &'static str, input: &str) -> Self {
        Error::InvalidSyntax {
            ty,
            input: input.to_string(),
        }
    }
}
