/// A type alias for handling errors throughout meshlets
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input mesh violates a build precondition (index count not a
    /// multiple of 3, empty buffers, out-of-range index, or settings outside
    /// the supported limits).
    #[error("invalid input: {0}")]
    InvalidInput(std::borrow::Cow<'static, str>),

    /// The partitioner failed to produce usable clusters for a non-empty
    /// mesh, or returned a cluster exceeding the configured limits.
    #[error("partition error: {0}")]
    Partition(String),

    /// A caller-supplied destination buffer is smaller than the data to be
    /// copied out. Nothing is written in this case.
    #[error("destination buffer too small: need {needed} elements, got {capacity}")]
    Capacity { needed: usize, capacity: usize },
}

impl Error {
    #[inline]
    pub(crate) fn invalid_input(msg: &'static str) -> Self {
        Self::InvalidInput(std::borrow::Cow::Borrowed(msg))
    }

    #[inline]
    pub(crate) fn invalid_input_dynamic(msg: String) -> Self {
        Self::InvalidInput(std::borrow::Cow::Owned(msg))
    }
}
