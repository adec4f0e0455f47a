use thiserror::Error;

use crate::types::Investment;

/// Persistence seam used by the engine.
///
/// Implementations receive records that were already validated and must be
/// safe to call from many threads at once.
pub trait InvestmentRepository: Send + Sync {
    /// Stores the record under its id, replacing any record with the same id.
    fn create(&self, investment: Investment) -> Result<(), RepositoryError>;

    /// Returns a copy of the record with the given id.
    fn get_by_id(&self, id: &str) -> Result<Investment, RepositoryError>;

    /// Returns copies of every record owned by the customer. No match is an empty list.
    fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Investment>, RepositoryError>;
}

/// Errors surfaced by repository implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("investment with id {0} not found")]
    NotFound(String),
    #[error("investment storage unavailable: {0}")]
    Unavailable(String),
}
