use nomad_primitives::{Address, BreakdownViolation, InvalidAddress};
use nomad_source::SourceError;
use nomad_storage::StoreError;

pub type ReputationResult<T> = Result<T, ReputationError>;

/// Errors returned by [`ReputationService`](crate::ReputationService).
///
/// `Clone` so that one single-flight outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReputationError {
    /// Malformed address, rejected before any I/O.
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),

    /// The address has no on-chain activity, or no recorded score history.
    #[error("no reputation data for {0}")]
    NotFound(Address),

    /// The activity source failed or timed out.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The snapshot store failed.
    #[error("snapshot store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The calculator produced a breakdown that violates its invariants.
    #[error("internal compute error: {0}")]
    InternalCompute(#[from] BreakdownViolation),
}

impl From<SourceError> for ReputationError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(address) => Self::NotFound(address),
            SourceError::Transport(msg) => Self::UpstreamUnavailable(msg),
            SourceError::Malformed(msg) => Self::UpstreamUnavailable(format!("malformed: {msg}")),
        }
    }
}

impl ReputationError {
    /// Terminal errors are never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::NotFound(_))
    }
}
