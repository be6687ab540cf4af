use nomad_primitives::Address;

pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from an activity source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The address has no recorded activity.
    #[error("no recorded activity for {0}")]
    NotFound(Address),

    /// The indexer could not be reached or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The indexer returned a record that cannot be normalized.
    #[error("malformed upstream record: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
