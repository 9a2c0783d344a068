//! Soup validation and topology errors

/// All the possible failures soup construction and surgery might encounter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoupError {
    /// (RaggedSoup) The flat position buffer is not a whole number of triangles
    #[error("(RaggedSoup) position buffer length {0} is not a multiple of 9")]
    RaggedSoup(usize),

    /// (ColorLength) The per-vertex color buffer does not parallel the positions
    #[error("(ColorLength) color buffer length {got} does not match position length {want}")]
    ColorLength { got: usize, want: usize },

    /// (InvalidCoordinate) A coordinate scalar is NaN or infinite
    #[error("(InvalidCoordinate) scalar at flat index {0} is NaN or infinite")]
    InvalidCoordinate(usize),

    /// (NonManifold) Strict neighbor resolution left edges that cannot be paired
    #[error("(NonManifold) {open} directed edges could not be paired")]
    NonManifold { open: usize },

    /// (TopologyMissing) The operation needs neighbors, call `find_neighbors` first
    #[error("(TopologyMissing) neighbor topology has not been built")]
    TopologyMissing,
}

/// Convenience alias used by every fallible soup operation.
pub type SoupResult<T> = Result<T, SoupError>;
